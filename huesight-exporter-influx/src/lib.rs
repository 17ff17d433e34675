//! InfluxDB metric sink for HueSight telemetry.
//!
//! This crate implements [`huesight_common::MetricSink`] on top of the
//! InfluxDB 1.x HTTP write API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  MetricRecord   │────>│ schema + mapping│────>│  POST /write    │
//! │   (per device)  │     │ (line protocol) │     │  (InfluxDB)     │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Configuration
//!
//! See [`config::InfluxConfig`] for configuration options.

pub mod config;
pub mod mapping;
pub mod schema;
pub mod writer;

pub use config::InfluxConfig;
pub use schema::{FieldType, MeasurementSchema, SCHEMAS};
pub use writer::InfluxWriter;
