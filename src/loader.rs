//! Schema loading from JSON/YAML files and strings.
//!
//! Parsing and domain validation happen together: every loader returns a
//! [`Schema`] that already passed [`Schema::validate`], so layout planning
//! can assume well-formed field definitions.

use std::fs;
use std::path::Path;

use crate::errors::SchemaError;
use crate::schema::Schema;

/// Load and validate a schema from a `.json`, `.yaml`, or `.yml` file.
pub fn load_schema(path: impl AsRef<Path>) -> Result<Schema, SchemaError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source_name = path.display().to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "json" => schema_from_json(&content, &source_name),
        "yaml" | "yml" => schema_from_yaml(&content, &source_name),
        other => Err(SchemaError::UnsupportedFormat(format!(".{}", other))),
    }
}

/// Parse and validate a schema from a JSON string.
pub fn schema_from_json(content: &str, source_name: &str) -> Result<Schema, SchemaError> {
    let schema: Schema = serde_json::from_str(content).map_err(|source| SchemaError::Json {
        source_name: source_name.to_string(),
        source,
    })?;
    schema.validate()?;
    log::debug!(
        "loaded schema '{}' from {} ({} fields)",
        schema.name,
        source_name,
        schema.fields.len()
    );
    Ok(schema)
}

/// Parse and validate a schema from a YAML string.
pub fn schema_from_yaml(content: &str, source_name: &str) -> Result<Schema, SchemaError> {
    let schema: Schema = serde_yaml::from_str(content).map_err(|source| SchemaError::Yaml {
        source_name: source_name.to_string(),
        source,
    })?;
    schema.validate()?;
    log::debug!(
        "loaded schema '{}' from {} ({} fields)",
        schema.name,
        source_name,
        schema.fields.len()
    );
    Ok(schema)
}

/// Serialize a schema back to pretty-printed JSON.
pub fn schema_to_json(schema: &Schema) -> Result<String, SchemaError> {
    serde_json::to_string_pretty(schema).map_err(|source| SchemaError::Json {
        source_name: "<schema>".to_string(),
        source,
    })
}
