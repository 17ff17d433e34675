use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// A single normalized observation, ready for a time-series sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Unix epoch milliseconds when the record was produced.
    pub timestamp: i64,

    /// Measurement (series family) the record belongs to.
    pub measurement: Measurement,

    /// Indexed identifying tags (e.g. `light=Kitchen`).
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Field values.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl MetricRecord {
    /// Create an empty record stamped with the current time.
    pub fn new(measurement: Measurement) -> Self {
        Self {
            timestamp: current_timestamp_millis(),
            measurement,
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a tag to this record.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a field to this record.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up a field by name.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Look up a tag by name.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Whether two records carry the same measurement, tags and fields.
    ///
    /// The timestamp is ignored.
    pub fn same_observation(&self, other: &MetricRecord) -> bool {
        self.measurement == other.measurement
            && self.tags == other.tags
            && self.fields == other.fields
    }
}

/// Typed field value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    /// Signed integer (booleans are encoded as 0/1).
    Integer(i64),

    /// Floating point value.
    Float(f64),

    /// Text value.
    Text(String),
}

impl FieldValue {
    /// Encode a boolean as integer 1/0.
    pub fn flag(value: bool) -> Self {
        FieldValue::Integer(i64::from(value))
    }

    /// Short name of the value type.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Integer(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "string",
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Measurement names written by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measurement {
    Light,
    Sensor,
}

impl Measurement {
    /// Get the measurement name as stored in the sink.
    pub fn as_str(&self) -> &'static str {
        match self {
            Measurement::Light => "light",
            Measurement::Sensor => "sensor",
        }
    }

    /// Tag key that identifies a device within this measurement.
    pub fn device_tag(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Get the current timestamp in milliseconds since Unix epoch.
///
/// Returns 0 if system time is before Unix epoch (should never happen in practice).
pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
