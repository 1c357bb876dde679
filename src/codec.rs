//! Pack/unpack data against a computed layout.
//!
//! Encoding validates first (fail-fast, no partial packing), then ORs each
//! field's normalized value into a local `u64` accumulator at its planned
//! offset. Decoding is the exact left-inverse on valid data and is total over
//! all 64-bit inputs: bits above the declared width are ignored, and zero-bit
//! fields denormalize to their sole constant without reading anything.

use std::collections::HashMap;

use crate::errors::EncodeError;
use crate::layout::{mask, FieldLayout};
use crate::schema::{FieldKind, Resolution};
use crate::validate::validate;
use crate::value::Value;

/// Map a semantic value to its zero-based unsigned bit pattern.
///
/// Assumes the value already passed [`validate`]; out-of-domain inputs fall
/// back to the domain's base value rather than corrupting neighboring bits.
pub fn normalize(value: &Value, layout: &FieldLayout) -> u64 {
    match &layout.kind {
        FieldKind::Bool => value.as_bool().unwrap_or(false) as u64,
        FieldKind::Int { min, .. } => value.as_int().unwrap_or(*min).wrapping_sub(*min) as u64,
        FieldKind::Enum { values } => value
            .as_str()
            .and_then(|s| values.iter().position(|v| v == s))
            .unwrap_or(0) as u64,
        FieldKind::Date {
            resolution,
            min_date,
            ..
        } => {
            let dt = value.as_datetime().unwrap_or(*min_date);
            resolution.units_between(*min_date, dt).max(0) as u64
        }
        FieldKind::Bitmask { flags } => {
            let set = value.as_flags();
            let mut bits = 0u64;
            for (name, &pos) in flags {
                if set.and_then(|m| m.get(name)).copied().unwrap_or(false) {
                    bits |= 1 << pos;
                }
            }
            bits
        }
    }
}

/// Map an extracted unsigned bit pattern back to its semantic value.
pub fn denormalize(extracted: u64, layout: &FieldLayout) -> Value {
    match &layout.kind {
        FieldKind::Bool => Value::Bool(extracted != 0),
        FieldKind::Int { min, .. } => Value::Int(min.wrapping_add(extracted as i64)),
        FieldKind::Enum { values } => {
            // An index past the end can only come from bits never produced by
            // encode; clamp so decoding stays total.
            let i = (extracted as usize).min(values.len() - 1);
            Value::Str(values[i].clone())
        }
        FieldKind::Date {
            resolution,
            min_date,
            ..
        } => {
            let dt = resolution.advance(*min_date, extracted as i64);
            match resolution {
                Resolution::Day => Value::Date(dt.date()),
                _ => Value::DateTime(dt),
            }
        }
        FieldKind::Bitmask { flags } => Value::Flags(
            flags
                .iter()
                .map(|(name, &pos)| (name.clone(), (extracted >> pos) & 1 == 1))
                .collect(),
        ),
    }
}

/// Encode a data map into a packed 64-bit integer.
///
/// Validation runs before any bit operation; on failure no integer is
/// produced. Nullable fields encode null as an all-zero range (presence bit
/// 0), and a present value as presence bit 1 followed by the value bits.
pub fn encode(data: &HashMap<String, Value>, layouts: &[FieldLayout]) -> Result<u64, EncodeError> {
    validate(data, layouts)?;

    let mut accumulator = 0u64;
    for layout in layouts {
        let value = match data.get(&layout.name) {
            Some(v) if !v.is_null() => v,
            // Nullable and absent/null: every bit of the range stays 0.
            _ => continue,
        };
        if layout.nullable {
            accumulator |= 1 << layout.offset;
            let value_bits = layout.bits - 1;
            if value_bits > 0 {
                accumulator |= (normalize(value, layout) & mask(value_bits)) << (layout.offset + 1);
            }
        } else if layout.bits > 0 {
            accumulator |= (normalize(value, layout) & mask(layout.bits)) << layout.offset;
        }
    }
    Ok(accumulator)
}

/// Decode a packed 64-bit integer back into a data map.
///
/// Total: never fails for any input integer and matching layouts. High bits
/// beyond the declared total width are ignored.
pub fn decode(packed: u64, layouts: &[FieldLayout]) -> HashMap<String, Value> {
    let mut out = HashMap::with_capacity(layouts.len());
    for layout in layouts {
        let value = if layout.nullable {
            if (packed >> layout.offset) & 1 == 0 {
                Value::Null
            } else {
                let value_bits = layout.bits - 1;
                let extracted = if value_bits == 0 {
                    0
                } else {
                    (packed >> (layout.offset + 1)) & mask(value_bits)
                };
                denormalize(extracted, layout)
            }
        } else {
            let extracted = if layout.bits == 0 {
                0
            } else {
                (packed >> layout.offset) & mask(layout.bits)
            };
            denormalize(extracted, layout)
        };
        out.insert(layout.name.clone(), value);
    }
    out
}
