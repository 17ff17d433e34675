//! Mapping from device snapshots to metric records.
//!
//! Booleans become integer 0/1 fields. Numeric sensor capabilities the
//! sensor does not report are written as 0, so downstream a missing reading
//! and a reported zero look the same. The device name is written both as the
//! identifying tag and as a plain field; the device type is a field only.

use huesight_common::{FieldValue, Measurement, MetricRecord};

use crate::source::{LightSnapshot, SensorSnapshot};

/// Map a light snapshot to a `light` record.
pub fn map_light(light: &LightSnapshot) -> MetricRecord {
    MetricRecord::new(Measurement::Light)
        .with_tag(Measurement::Light.device_tag(), light.name.as_str())
        .with_field("name", light.name.as_str())
        .with_field("on", FieldValue::flag(light.is_on))
        .with_field("reachable", FieldValue::flag(light.is_reachable))
        .with_field("type", light.device_type.as_str())
}

/// Map a sensor snapshot to a `sensor` record.
pub fn map_sensor(sensor: &SensorSnapshot) -> MetricRecord {
    MetricRecord::new(Measurement::Sensor)
        .with_tag(Measurement::Sensor.device_tag(), sensor.name.as_str())
        .with_field("name", sensor.name.as_str())
        .with_field("presence", FieldValue::flag(sensor.presence.unwrap_or(false)))
        .with_field("temperature", sensor.temperature.unwrap_or(0.0))
        .with_field("lightlevel", sensor.light_level.unwrap_or(0))
        .with_field("type", sensor.device_type.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hall_sensor() -> SensorSnapshot {
        SensorSnapshot {
            id: "7".to_string(),
            name: "Hall".to_string(),
            device_type: "sensor".to_string(),
            presence: Some(true),
            temperature: None,
            light_level: Some(42),
        }
    }

    fn kitchen_light(is_on: bool, is_reachable: bool) -> LightSnapshot {
        LightSnapshot {
            id: "1".to_string(),
            name: "Kitchen".to_string(),
            is_on,
            is_reachable,
            device_type: "Extended color light".to_string(),
        }
    }

    #[test]
    fn test_map_hall_sensor() {
        let record = map_sensor(&hall_sensor());

        assert_eq!(record.measurement, Measurement::Sensor);
        assert_eq!(record.tags.len(), 1);
        assert_eq!(record.tag("sensor"), Some("Hall"));

        assert_eq!(record.fields.len(), 5);
        assert_eq!(record.field("type"), Some(&FieldValue::Text("sensor".into())));
        assert_eq!(record.field("name"), Some(&FieldValue::Text("Hall".into())));
        assert_eq!(record.field("presence"), Some(&FieldValue::Integer(1)));
        assert_eq!(record.field("temperature"), Some(&FieldValue::Float(0.0)));
        assert_eq!(record.field("lightlevel"), Some(&FieldValue::Integer(42)));
    }

    #[test]
    fn test_absent_numeric_fields_default_to_zero() {
        let sensor = SensorSnapshot {
            presence: None,
            temperature: None,
            light_level: None,
            ..hall_sensor()
        };
        let record = map_sensor(&sensor);

        assert_eq!(record.field("temperature"), Some(&FieldValue::Float(0.0)));
        assert_eq!(record.field("lightlevel"), Some(&FieldValue::Integer(0)));
        assert_eq!(record.field("presence"), Some(&FieldValue::Integer(0)));
    }

    #[test]
    fn test_reported_values_are_carried_as_is() {
        let sensor = SensorSnapshot {
            presence: Some(false),
            temperature: Some(2150.0),
            light_level: Some(0),
            ..hall_sensor()
        };
        let record = map_sensor(&sensor);

        assert_eq!(record.field("temperature"), Some(&FieldValue::Float(2150.0)));
        assert_eq!(record.field("lightlevel"), Some(&FieldValue::Integer(0)));
        assert_eq!(record.field("presence"), Some(&FieldValue::Integer(0)));
    }

    #[test]
    fn test_light_flags_are_zero_or_one() {
        for (on, reachable) in [(true, true), (true, false), (false, true), (false, false)] {
            let record = map_light(&kitchen_light(on, reachable));

            assert_eq!(record.field("on"), Some(&FieldValue::Integer(on as i64)));
            assert_eq!(
                record.field("reachable"),
                Some(&FieldValue::Integer(reachable as i64))
            );
        }
    }

    #[test]
    fn test_map_light_shape() {
        let record = map_light(&kitchen_light(true, false));

        assert_eq!(record.measurement, Measurement::Light);
        assert_eq!(record.tag("light"), Some("Kitchen"));
        assert_eq!(record.field("name"), Some(&FieldValue::Text("Kitchen".into())));
        assert_eq!(
            record.field("type"),
            Some(&FieldValue::Text("Extended color light".into()))
        );
        assert!(!record.tags.contains_key("type"));
    }

    #[test]
    fn test_mapping_is_repeatable() {
        let sensor = hall_sensor();
        assert!(map_sensor(&sensor).same_observation(&map_sensor(&sensor)));

        let light = kitchen_light(true, true);
        assert!(map_light(&light).same_observation(&map_light(&light)));
    }
}
