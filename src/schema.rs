//! Schema object model: field kinds with embedded constraints, declaration
//! order, and domain validation.
//!
//! A [`Schema`] is the validated form of a textual schema definition
//! (see [`crate::loader`]). Field declaration order is preserved by
//! [`IndexMap`]; layout planning depends on it.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::errors::SchemaError;

/// Time granularity at which a date field is quantized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Day,
    Hour,
    Minute,
    Second,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Day => "day",
            Resolution::Hour => "hour",
            Resolution::Minute => "minute",
            Resolution::Second => "second",
        }
    }

    /// Whole resolution units between `from` and `to`, truncating toward zero.
    pub fn units_between(self, from: NaiveDateTime, to: NaiveDateTime) -> i64 {
        let delta = to - from;
        match self {
            Resolution::Day => delta.num_days(),
            Resolution::Hour => delta.num_hours(),
            Resolution::Minute => delta.num_minutes(),
            Resolution::Second => delta.num_seconds(),
        }
    }

    /// `from` advanced by `units` whole resolution units. Saturates at the
    /// representable datetime range so decoding stays total.
    pub fn advance(self, from: NaiveDateTime, units: i64) -> NaiveDateTime {
        let delta = match self {
            Resolution::Day => TimeDelta::days(units),
            Resolution::Hour => TimeDelta::hours(units),
            Resolution::Minute => TimeDelta::minutes(units),
            Resolution::Second => TimeDelta::seconds(units),
        };
        from.checked_add_signed(delta).unwrap_or(NaiveDateTime::MAX)
    }
}

/// Field type with its value-domain constraints embedded in the variant.
///
/// Closed sum type: the compiler enforces exhaustive handling, so there is no
/// reachable "unknown field type" branch anywhere downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Bool,
    Int {
        min: i64,
        max: i64,
    },
    Enum {
        values: Vec<String>,
    },
    Date {
        resolution: Resolution,
        #[serde(with = "iso")]
        min_date: NaiveDateTime,
        #[serde(with = "iso")]
        max_date: NaiveDateTime,
    },
    Bitmask {
        /// Flag name -> bit position (0-63) within the field's value bits.
        flags: IndexMap<String, u8>,
    },
}

impl FieldKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Int { .. } => "int",
            FieldKind::Enum { .. } => "enum",
            FieldKind::Date { .. } => "date",
            FieldKind::Bitmask { .. } => "bitmask",
        }
    }
}

/// One named field: a kind plus the orthogonal nullability marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl FieldDef {
    pub fn new(kind: FieldKind) -> Self {
        FieldDef {
            kind,
            nullable: false,
        }
    }

    pub fn nullable(kind: FieldKind) -> Self {
        FieldDef {
            kind,
            nullable: true,
        }
    }
}

/// A complete, ordered schema definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default = "default_version")]
    pub version: String,
    pub name: String,
    pub fields: IndexMap<String, FieldDef>,
}

fn default_version() -> String {
    "1".to_string()
}

impl Schema {
    /// Validate schema-shape invariants: identifier names, non-empty field
    /// set, and per-kind domain definitions. Layout planning assumes a schema
    /// that passed this check.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.version != "1" {
            return Err(SchemaError::Invalid(format!(
                "unsupported schema version '{}' (expected \"1\")",
                self.version
            )));
        }
        if !is_identifier(&self.name) {
            return Err(SchemaError::Invalid(format!(
                "schema name '{}' must be a valid identifier",
                self.name
            )));
        }
        if self.fields.is_empty() {
            return Err(SchemaError::Invalid(
                "schema must have at least one field".to_string(),
            ));
        }
        for (name, def) in &self.fields {
            if !is_identifier(name) {
                return Err(SchemaError::Field {
                    field: name.clone(),
                    message: "field name must be a valid identifier".to_string(),
                });
            }
            validate_kind(name, &def.kind)?;
        }
        Ok(())
    }
}

fn validate_kind(field: &str, kind: &FieldKind) -> Result<(), SchemaError> {
    let fail = |message: String| SchemaError::Field {
        field: field.to_string(),
        message,
    };
    match kind {
        FieldKind::Bool => {}
        FieldKind::Int { min, max } => {
            if min > max {
                return Err(fail(format!("min={} cannot be greater than max={}", min, max)));
            }
        }
        FieldKind::Enum { values } => {
            if values.is_empty() {
                return Err(fail("enum must have at least one value".to_string()));
            }
            if values.len() > 255 {
                return Err(fail(format!(
                    "enum can have at most 255 values, got {}",
                    values.len()
                )));
            }
            for (i, v) in values.iter().enumerate() {
                if v.is_empty() {
                    return Err(fail("enum values cannot be empty strings".to_string()));
                }
                if values[..i].contains(v) {
                    return Err(fail(format!("enum values must be unique, found duplicate '{}'", v)));
                }
            }
        }
        FieldKind::Date {
            min_date, max_date, ..
        } => {
            if min_date >= max_date {
                return Err(fail("min_date must be before max_date".to_string()));
            }
        }
        FieldKind::Bitmask { flags } => {
            if flags.is_empty() {
                return Err(fail("bitmask must have at least one flag".to_string()));
            }
            let mut seen = [false; 64];
            for (flag, &pos) in flags {
                if !is_identifier(flag) {
                    return Err(fail(format!("flag name '{}' must be a valid identifier", flag)));
                }
                if pos > 63 {
                    return Err(fail(format!(
                        "flag '{}' position {} out of range (0-63)",
                        flag, pos
                    )));
                }
                if seen[pos as usize] {
                    return Err(fail(format!("flag positions must be unique, {} is reused", pos)));
                }
                seen[pos as usize] = true;
            }
        }
    }
    Ok(())
}

/// Identifier check: `[A-Za-z_][A-Za-z0-9_]*`.
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse an ISO 8601 date or datetime; a bare date means midnight.
pub(crate) fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = s.parse::<NaiveDateTime>() {
        return Some(dt);
    }
    s.parse::<NaiveDate>().ok().map(|d| d.and_time(NaiveTime::MIN))
}

/// ISO 8601 (de)serialization for schema date bounds; accepts date-only input.
mod iso {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(de)?;
        super::parse_iso(&s)
            .ok_or_else(|| de::Error::custom(format!("invalid ISO 8601 date: {}", s)))
    }
}
