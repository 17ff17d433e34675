//! Measurement schema declared once at sink setup.
//!
//! Every record is checked against its measurement's schema before it is
//! encoded, so a mapping change cannot silently create new series or change
//! a field's type in the database.

use huesight_common::{FieldValue, Measurement, MetricRecord, SinkError};

/// InfluxDB field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Float,
    String,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::String => "string",
        }
    }

    /// Whether a value can be stored in a field of this type.
    ///
    /// Integers are accepted by float fields.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (FieldType::Integer, FieldValue::Integer(_))
                | (FieldType::Float, FieldValue::Float(_))
                | (FieldType::Float, FieldValue::Integer(_))
                | (FieldType::String, FieldValue::Text(_))
        )
    }
}

/// Declared shape of one measurement.
#[derive(Debug, Clone, Copy)]
pub struct MeasurementSchema {
    pub measurement: Measurement,
    pub tags: &'static [&'static str],
    pub fields: &'static [(&'static str, FieldType)],
}

impl MeasurementSchema {
    /// Declared type of a field, if the field is part of the schema.
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, ty)| *ty)
    }

    /// Check a record against this schema.
    pub fn check(&self, record: &MetricRecord) -> Result<(), SinkError> {
        if record.measurement != self.measurement {
            return Err(SinkError::Schema(format!(
                "record for '{}' checked against '{}' schema",
                record.measurement, self.measurement
            )));
        }

        for tag in record.tags.keys() {
            if !self.tags.contains(&tag.as_str()) {
                return Err(SinkError::Schema(format!(
                    "unknown tag '{}' on measurement '{}'",
                    tag, self.measurement
                )));
            }
        }

        if record.fields.is_empty() {
            return Err(SinkError::Schema(format!(
                "record for '{}' has no fields",
                self.measurement
            )));
        }

        for (name, value) in &record.fields {
            let ty = self.field_type(name).ok_or_else(|| {
                SinkError::Schema(format!(
                    "unknown field '{}' on measurement '{}'",
                    name, self.measurement
                ))
            })?;

            if !ty.accepts(value) {
                return Err(SinkError::Schema(format!(
                    "field '{}' on '{}' expects {}, got {}",
                    name,
                    self.measurement,
                    ty.as_str(),
                    value.kind()
                )));
            }

            if let FieldValue::Float(v) = value
                && !v.is_finite()
            {
                return Err(SinkError::Schema(format!(
                    "field '{}' on '{}' is not a finite number",
                    name, self.measurement
                )));
            }
        }

        Ok(())
    }
}

/// Schemas for every measurement the poller writes.
pub const SCHEMAS: &[MeasurementSchema] = &[
    MeasurementSchema {
        measurement: Measurement::Light,
        tags: &["light"],
        fields: &[
            ("name", FieldType::String),
            ("on", FieldType::Integer),
            ("reachable", FieldType::Integer),
            ("type", FieldType::String),
        ],
    },
    MeasurementSchema {
        measurement: Measurement::Sensor,
        tags: &["sensor"],
        fields: &[
            ("lightlevel", FieldType::Integer),
            ("name", FieldType::String),
            ("presence", FieldType::Integer),
            ("temperature", FieldType::Float),
            ("type", FieldType::String),
        ],
    },
];

/// Look up the schema declared for a measurement.
pub fn schema_for(measurement: Measurement) -> Result<&'static MeasurementSchema, SinkError> {
    SCHEMAS
        .iter()
        .find(|schema| schema.measurement == measurement)
        .ok_or_else(|| SinkError::Schema(format!("no schema for measurement '{}'", measurement)))
}

/// Check a record against the schema declared for its measurement.
pub fn validate(record: &MetricRecord) -> Result<&'static MeasurementSchema, SinkError> {
    let schema = schema_for(record.measurement)?;
    schema.check(record)?;
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_record() -> MetricRecord {
        MetricRecord::new(Measurement::Light)
            .with_tag("light", "Kitchen")
            .with_field("name", "Kitchen")
            .with_field("on", FieldValue::flag(true))
            .with_field("reachable", FieldValue::flag(false))
            .with_field("type", "Extended color light")
    }

    #[test]
    fn test_every_measurement_has_a_schema() {
        assert!(schema_for(Measurement::Light).is_ok());
        assert!(schema_for(Measurement::Sensor).is_ok());
    }

    #[test]
    fn test_valid_light_record() {
        assert!(validate(&light_record()).is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let record = light_record().with_field("brightness", 254i64);
        let err = validate(&record).unwrap_err();
        assert!(err.to_string().contains("brightness"));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let record = light_record().with_tag("room", "Kitchen");
        assert!(matches!(validate(&record), Err(SinkError::Schema(_))));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let record = light_record().with_field("on", "yes");
        let err = validate(&record).unwrap_err();
        assert!(err.to_string().contains("expects integer"));
    }

    #[test]
    fn test_float_field_accepts_integer() {
        let record = MetricRecord::new(Measurement::Sensor)
            .with_tag("sensor", "Hall")
            .with_field("temperature", 2150i64);
        assert!(validate(&record).is_ok());
    }

    #[test]
    fn test_non_finite_float_rejected() {
        let record = MetricRecord::new(Measurement::Sensor)
            .with_tag("sensor", "Hall")
            .with_field("temperature", f64::NAN);
        assert!(validate(&record).is_err());
    }

    #[test]
    fn test_empty_fields_rejected() {
        let record = MetricRecord::new(Measurement::Light).with_tag("light", "Kitchen");
        assert!(validate(&record).is_err());
    }
}
