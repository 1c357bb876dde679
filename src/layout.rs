//! Bit layout computation: minimum per-field widths and sequential offsets.
//!
//! Widths use exact integer arithmetic (`bit_length`, never a floating-point
//! log2, which drifts at power-of-two boundaries). Offsets accumulate in
//! declaration order, so planning is deterministic: identical field sequences
//! always produce identical layouts.

use indexmap::IndexMap;

use crate::errors::SchemaError;
use crate::schema::{FieldDef, FieldKind, Schema};

/// Computed bit placement for one field within the packed word.
///
/// `bits` includes the presence bit when `nullable` is set; bit 0 of the
/// field's range is then the presence bit and the value occupies the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldLayout {
    pub name: String,
    /// Field kind with its constraints, copied from the descriptor.
    pub kind: FieldKind,
    /// 0-indexed position of the field's least-significant bit.
    pub offset: u32,
    /// Total bits reserved, presence bit included.
    pub bits: u32,
    pub nullable: bool,
}

impl FieldLayout {
    /// Bits holding the value itself (excludes the presence bit).
    pub fn value_bits(&self) -> u32 {
        if self.nullable {
            self.bits - 1
        } else {
            self.bits
        }
    }
}

/// Number of bits needed to represent `x` (0 for 0).
pub(crate) fn bit_length(x: u64) -> u32 {
    64 - x.leading_zeros()
}

/// Mask covering the low `bits` bits.
pub(crate) fn mask(bits: u32) -> u64 {
    if bits == 0 {
        0
    } else if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Minimum bits to represent a field's value domain (presence bit excluded).
///
/// - bool: 1
/// - int: bit length of the unsigned range size `max - min` (0 when min == max)
/// - enum: bit length of the maximum index (0 for a single-value enum)
/// - date: bit length of `total_units - 1`, where `total_units` is the whole
///   resolution units of span (0 when the span is at most one unit)
/// - bitmask: highest flag position + 1, gaps included
pub fn value_bits(kind: &FieldKind) -> u32 {
    match kind {
        FieldKind::Bool => 1,
        FieldKind::Int { min, max } => bit_length(max.wrapping_sub(*min) as u64),
        FieldKind::Enum { values } => {
            if values.len() == 1 {
                0
            } else {
                bit_length(values.len() as u64 - 1)
            }
        }
        FieldKind::Date {
            resolution,
            min_date,
            max_date,
        } => {
            let total_units = resolution.units_between(*min_date, *max_date);
            if total_units > 0 {
                bit_length(total_units as u64 - 1)
            } else {
                0
            }
        }
        FieldKind::Bitmask { flags } => {
            let highest = flags.values().copied().max().unwrap_or(0);
            highest as u32 + 1
        }
    }
}

/// Plan bit placements for an ordered field set.
///
/// Offsets accumulate strictly in declaration order; nullable fields get one
/// extra presence bit at their base offset. Fails when the total exceeds 64
/// bits, itemizing every field's contribution.
pub fn compute_layout(
    fields: &IndexMap<String, FieldDef>,
) -> Result<(Vec<FieldLayout>, u32), SchemaError> {
    let mut layouts = Vec::with_capacity(fields.len());
    let mut offset = 0u32;

    for (name, def) in fields {
        let mut bits = value_bits(&def.kind);
        if def.nullable {
            bits += 1;
        }
        layouts.push(FieldLayout {
            name: name.clone(),
            kind: def.kind.clone(),
            offset,
            bits,
            nullable: def.nullable,
        });
        offset += bits;
    }

    let total_bits = offset;
    if total_bits > 64 {
        let breakdown = layouts
            .iter()
            .map(|l| format!("{}={}", l.name, l.bits))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(SchemaError::TooLarge {
            total: total_bits,
            breakdown,
        });
    }

    log::debug!("planned layout: {} fields, {} bits", layouts.len(), total_bits);
    Ok((layouts, total_bits))
}

/// Validate a schema and plan its layout in one step.
pub fn plan_schema(schema: &Schema) -> Result<(Vec<FieldLayout>, u32), SchemaError> {
    schema.validate()?;
    compute_layout(&schema.fields)
}
