//! Error types: schema-shape failures vs. encoding-validation failures.
//!
//! `SchemaError` covers everything that makes a schema unusable (bad domain
//! definition, 64-bit overflow, unreadable/unparseable schema file) and is
//! unrecoverable for that schema. `EncodeError` covers bad data handed to the
//! encoder; the caller can fix the data and retry.

use std::path::PathBuf;

/// Schema definition or layout planning failure.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Total bit width over 64. The breakdown lists `name=bits` per field.
    #[error("schema exceeds 64-bit limit: {total} bits total. Breakdown: {breakdown}")]
    TooLarge { total: u32, breakdown: String },
    /// A field's domain definition is invalid (min > max, empty enum, ...).
    #[error("field '{field}': {message}")]
    Field { field: String, message: String },
    /// Schema-level problem not tied to one field.
    #[error("{0}")]
    Invalid(String),
    #[error("failed to read schema file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in '{source_name}': {source}")]
    Json {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid YAML in '{source_name}': {source}")]
    Yaml {
        source_name: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("unsupported schema file format '{0}'. Use .json, .yaml, or .yml")]
    UnsupportedFormat(String),
}

/// Data validation failure reported before any bit is packed.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("required field '{0}' is missing")]
    MissingField(String),
    /// Several required fields missing at once; all are named.
    #[error("required fields missing: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    /// A present value violates its field's type or domain.
    #[error("field '{field}': {message}")]
    Value { field: String, message: String },
}

impl EncodeError {
    pub(crate) fn value(field: &str, message: impl Into<String>) -> Self {
        EncodeError::Value {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
