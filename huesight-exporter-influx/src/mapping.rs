//! Mapping from HueSight MetricRecord to InfluxDB line protocol.

use huesight_common::{FieldValue, MetricRecord, SinkError};

use crate::schema::{self, FieldType};

/// Escape a measurement name (commas and spaces).
pub fn escape_measurement(name: &str) -> String {
    escape(name, &[',', ' '])
}

/// Escape a tag key, tag value or field key (commas, equals signs and spaces).
pub fn escape_key(name: &str) -> String {
    escape(name, &[',', '=', ' '])
}

/// Quote a string field value, escaping backslashes and double quotes.
pub fn quote_string(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    result.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            result.push('\\');
        }
        result.push(c);
    }
    result.push('"');
    result
}

fn escape(value: &str, special: &[char]) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            // Line protocol has no escape for line breaks.
            '\n' | '\r' => result.push(' '),
            c if special.contains(&c) || c == '\\' => {
                result.push('\\');
                result.push(c);
            }
            c => result.push(c),
        }
    }
    result
}

/// Format a field value as the declared type.
pub fn format_field_value(value: &FieldValue, ty: FieldType) -> String {
    match (value, ty) {
        (FieldValue::Integer(v), FieldType::Integer) => format!("{}i", v),
        (FieldValue::Integer(v), FieldType::Float) => format_float(*v as f64),
        (FieldValue::Float(v), _) => format_float(*v),
        (FieldValue::Text(v), _) => quote_string(v),
        (FieldValue::Integer(v), FieldType::String) => quote_string(&v.to_string()),
    }
}

fn format_float(v: f64) -> String {
    // Line protocol treats bare numbers as floats, so "0" is a valid float.
    format!("{}", v)
}

/// Encode one record as a line-protocol line (without trailing newline).
///
/// The record is validated against its declared schema first. Tags with an
/// empty value are omitted because line protocol cannot represent them.
pub fn encode_line(record: &MetricRecord) -> Result<String, SinkError> {
    let schema = schema::validate(record)?;

    let mut line = escape_measurement(record.measurement.as_str());

    for (key, value) in &record.tags {
        if value.is_empty() {
            continue;
        }
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    let fields = record
        .fields
        .iter()
        .map(|(key, value)| {
            let ty = schema.field_type(key).unwrap_or(FieldType::String);
            format!("{}={}", escape_key(key), format_field_value(value, ty))
        })
        .collect::<Vec<_>>()
        .join(",");

    line.push(' ');
    line.push_str(&fields);
    line.push(' ');
    line.push_str(&record.timestamp.to_string());

    Ok(line)
}

/// Encode a batch of records, one line each.
pub fn encode_batch(records: &[MetricRecord]) -> Result<String, SinkError> {
    let lines = records
        .iter()
        .map(encode_line)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}
