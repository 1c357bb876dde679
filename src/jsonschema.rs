//! JSON exports: JSON Schema Draft 2020-12 and the layout report.

use serde_json::{json, Map, Value as Json};

use crate::layout::FieldLayout;
use crate::schema::{FieldKind, Resolution, Schema};

/// Generate a JSON Schema Draft 2020-12 document for a schema.
///
/// Non-nullable fields land in `required`; nullable fields get a
/// `[type, "null"]` type array. Bit-level metadata rides along in
/// `x-bitschema-*` extension keywords.
pub fn generate_json_schema(schema: &Schema, layouts: &[FieldLayout]) -> Json {
    let total_bits: u32 = layouts.iter().map(|l| l.bits).sum();

    let mut properties = Map::new();
    let mut required = Vec::new();
    for (name, def) in &schema.fields {
        properties.insert(name.clone(), field_property(&def.kind, def.nullable));
        if !def.nullable {
            required.push(Json::String(name.clone()));
        }
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": format!("https://example.com/schemas/{}.schema.json", schema.name),
        "type": "object",
        "title": schema.name,
        "description": "bitschema-generated schema",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
        "x-bitschema-version": schema.version,
        "x-bitschema-total-bits": total_bits,
    })
}

fn field_property(kind: &FieldKind, nullable: bool) -> Json {
    let mut prop = match kind {
        FieldKind::Bool => json!({ "type": "boolean" }),
        FieldKind::Int { min, max } => json!({
            "type": "integer",
            "minimum": min,
            "maximum": max,
        }),
        FieldKind::Enum { values } => json!({
            "type": "string",
            "enum": values,
        }),
        FieldKind::Date { resolution, .. } => {
            let format = match resolution {
                Resolution::Day => "date",
                _ => "date-time",
            };
            json!({ "type": "string", "format": format })
        }
        FieldKind::Bitmask { flags } => {
            let mut props = Map::new();
            for name in flags.keys() {
                props.insert(name.clone(), json!({ "type": "boolean" }));
            }
            json!({
                "type": "object",
                "properties": props,
                "additionalProperties": false,
            })
        }
    };

    if nullable {
        if let Some(obj) = prop.as_object_mut() {
            if let Some(t) = obj.get("type").and_then(Json::as_str) {
                let t = t.to_string();
                obj.insert("type".to_string(), json!([t, "null"]));
            }
        }
    }
    prop
}

/// Layout report: JSON-serializable description of the planned bit layout
/// (`{version, total_bits, fields: [{name, type, offset, bits, constraints}]}`).
pub fn layout_report(schema: &Schema, layouts: &[FieldLayout], total_bits: u32) -> Json {
    let fields: Vec<Json> = layouts
        .iter()
        .map(|l| {
            json!({
                "name": l.name,
                "type": l.kind.type_name(),
                "offset": l.offset,
                "bits": l.bits,
                "nullable": l.nullable,
                "constraints": constraints_json(&l.kind),
            })
        })
        .collect();
    json!({
        "version": schema.version,
        "total_bits": total_bits,
        "fields": fields,
    })
}

fn constraints_json(kind: &FieldKind) -> Json {
    match kind {
        FieldKind::Bool => json!({}),
        FieldKind::Int { min, max } => json!({ "min": min, "max": max }),
        FieldKind::Enum { values } => json!({ "values": values }),
        FieldKind::Date {
            resolution,
            min_date,
            max_date,
        } => json!({
            "resolution": resolution.as_str(),
            "min_date": min_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "max_date": max_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }),
        FieldKind::Bitmask { flags } => json!({ "flags": flags }),
    }
}
