//! Pre-encode data validation: fail fast, before any bit is packed.
//!
//! Checks run in a fixed order for deterministic reporting: missing required
//! fields first (all of them named in one error), then per-field type and
//! domain checks in layout order. Extra keys in the data map are ignored.

use std::collections::HashMap;

use crate::errors::EncodeError;
use crate::layout::{mask, FieldLayout};
use crate::schema::FieldKind;
use crate::value::Value;

const NULL: Value = Value::Null;

/// Validate a data map against planned layouts.
///
/// Nullable fields may be absent or explicitly null; both count as null.
/// Non-nullable fields must be present and non-null.
pub fn validate(data: &HashMap<String, Value>, layouts: &[FieldLayout]) -> Result<(), EncodeError> {
    let mut missing: Vec<&str> = layouts
        .iter()
        .filter(|l| !l.nullable && !data.contains_key(&l.name))
        .map(|l| l.name.as_str())
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        if missing.len() == 1 {
            return Err(EncodeError::MissingField(missing[0].to_string()));
        }
        return Err(EncodeError::MissingFields(
            missing.iter().map(|n| format!("'{}'", n)).collect(),
        ));
    }

    for layout in layouts {
        let value = data.get(&layout.name).unwrap_or(&NULL);
        validate_value(value, layout)?;
    }
    Ok(())
}

/// Validate one value against one field's type and domain.
pub fn validate_value(value: &Value, layout: &FieldLayout) -> Result<(), EncodeError> {
    if value.is_null() {
        if !layout.nullable {
            return Err(EncodeError::value(
                &layout.name,
                "cannot be null (field is not nullable)",
            ));
        }
        return Ok(());
    }

    match &layout.kind {
        FieldKind::Bool => {
            if value.as_bool().is_none() {
                return Err(EncodeError::value(
                    &layout.name,
                    format!("expected boolean, got {}", value.type_name()),
                ));
            }
        }
        FieldKind::Int { min, max } => {
            let n = value.as_int().ok_or_else(|| {
                EncodeError::value(
                    &layout.name,
                    format!("expected integer, got {}", value.type_name()),
                )
            })?;
            if n < *min {
                return Err(EncodeError::value(
                    &layout.name,
                    format!("value {} is below minimum {}", n, min),
                ));
            }
            if n > *max {
                return Err(EncodeError::value(
                    &layout.name,
                    format!("value {} exceeds maximum {}", n, max),
                ));
            }
        }
        FieldKind::Enum { values } => {
            let s = value.as_str().ok_or_else(|| {
                EncodeError::value(
                    &layout.name,
                    format!("expected string, got {}", value.type_name()),
                )
            })?;
            if !values.iter().any(|v| v == s) {
                return Err(EncodeError::value(
                    &layout.name,
                    format!("value '{}' not in allowed values {:?}", s, values),
                ));
            }
        }
        FieldKind::Date {
            resolution,
            min_date,
            max_date,
        } => {
            let dt = value.as_datetime().ok_or_else(|| {
                EncodeError::value(
                    &layout.name,
                    format!("expected ISO 8601 date, got {}", value.type_name()),
                )
            })?;
            if dt < *min_date {
                return Err(EncodeError::value(
                    &layout.name,
                    format!("date {} is before minimum {}", dt, min_date),
                ));
            }
            if dt > *max_date {
                return Err(EncodeError::value(
                    &layout.name,
                    format!("date {} is after maximum {}", dt, max_date),
                ));
            }
            // The planned width covers unit counts up to mask(value_bits);
            // when the span is an exact power of two, max_date itself falls
            // one past that and would alias min_date after masking.
            let units = resolution.units_between(*min_date, dt).max(0) as u64;
            let last = mask(layout.value_bits());
            if units > last {
                let last_encodable = resolution.advance(*min_date, last as i64);
                return Err(EncodeError::value(
                    &layout.name,
                    format!(
                        "date {} is after the last encodable value {}",
                        dt, last_encodable
                    ),
                ));
            }
        }
        FieldKind::Bitmask { .. } => {
            // Flags absent from the map default to false; unknown flag names
            // are ignored, matching the permissive map handling elsewhere.
            if value.as_flags().is_none() {
                return Err(EncodeError::value(
                    &layout.name,
                    format!("expected flag map, got {}", value.type_name()),
                ));
            }
        }
    }
    Ok(())
}
