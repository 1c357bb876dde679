//! Rust source generation: a standalone struct with `encode`/`decode`
//! methods whose bit arithmetic matches the runtime codec exactly (same
//! offsets, masks, and presence-bit convention).
//!
//! Generated code depends only on `chrono` (when the schema has date fields)
//! and the standard library.

use crate::layout::{mask, FieldLayout};
use crate::schema::{FieldKind, Resolution, Schema};

const DATE_FMT: &str = "%Y-%m-%dT%H:%M:%S";

/// Generate Rust source for a schema. `struct_name` overrides the schema
/// name when given.
pub fn generate_rust_code(
    schema: &Schema,
    layouts: &[FieldLayout],
    struct_name: Option<&str>,
) -> String {
    let name = struct_name.unwrap_or(&schema.name);
    let has_dates = layouts
        .iter()
        .any(|l| matches!(l.kind, FieldKind::Date { .. }));
    let has_flags = layouts
        .iter()
        .any(|l| matches!(l.kind, FieldKind::Bitmask { .. }));

    let mut out = Vec::new();
    out.push("// Generated by bitschema. Do not edit.".to_string());
    out.push(String::new());
    if has_dates {
        out.push("use chrono::{NaiveDate, NaiveDateTime, TimeDelta};".to_string());
    }
    if has_flags {
        out.push("use std::collections::HashMap;".to_string());
    }
    if has_dates || has_flags {
        out.push(String::new());
    }

    out.push("#[derive(Debug, Clone, PartialEq)]".to_string());
    out.push(format!("pub struct {} {{", name));
    for layout in layouts {
        out.push(format!("    pub {}: {},", layout.name, field_type(layout)));
    }
    out.push("}".to_string());
    out.push(String::new());

    out.push(format!("impl {} {{", name));
    emit_consts(&mut out, layouts);
    emit_encode(&mut out, layouts);
    out.push(String::new());
    emit_decode(&mut out, layouts);
    out.push("}".to_string());

    out.join("\n") + "\n"
}

fn field_type(layout: &FieldLayout) -> String {
    let base = match &layout.kind {
        FieldKind::Bool => "bool".to_string(),
        FieldKind::Int { .. } => "i64".to_string(),
        FieldKind::Enum { .. } => "String".to_string(),
        FieldKind::Date { resolution, .. } => match resolution {
            Resolution::Day => "NaiveDate".to_string(),
            _ => "NaiveDateTime".to_string(),
        },
        FieldKind::Bitmask { .. } => "HashMap<String, bool>".to_string(),
    };
    if layout.nullable {
        format!("Option<{}>", base)
    } else {
        base
    }
}

fn emit_consts(out: &mut Vec<String>, layouts: &[FieldLayout]) {
    let mut any = false;
    for layout in layouts {
        match &layout.kind {
            FieldKind::Enum { values } => {
                let list = values
                    .iter()
                    .map(|v| format!("{:?}", v))
                    .collect::<Vec<_>>()
                    .join(", ");
                out.push(format!(
                    "    const {}_VALUES: [&'static str; {}] = [{}];",
                    layout.name.to_uppercase(),
                    values.len(),
                    list
                ));
                any = true;
            }
            FieldKind::Date { min_date, .. } => {
                out.push(format!(
                    "    const {}_MIN: &'static str = \"{}\";",
                    layout.name.to_uppercase(),
                    min_date.format(DATE_FMT)
                ));
                any = true;
            }
            _ => {}
        }
    }
    if any {
        out.push(String::new());
    }
}

/// Expression producing the normalized `u64` for a field value. `expr` is the
/// value itself (owned or copied, not a reference).
fn normalize_lines(out: &mut Vec<String>, layout: &FieldLayout, expr: &str, indent: &str) {
    match &layout.kind {
        FieldKind::Bool => out.push(format!("{}let raw = {} as u64;", indent, expr)),
        FieldKind::Int { min, .. } => out.push(format!(
            "{}let raw = {}.wrapping_sub({}) as u64;",
            indent, expr, min
        )),
        FieldKind::Enum { .. } => out.push(format!(
            "{}let raw = Self::{}_VALUES.iter().position(|v| *v == {}.as_str()).unwrap_or(0) as u64;",
            indent,
            layout.name.to_uppercase(),
            expr
        )),
        FieldKind::Date { resolution, .. } => {
            out.push(format!(
                "{}let min = NaiveDateTime::parse_from_str(Self::{}_MIN, \"{}\").unwrap();",
                indent,
                layout.name.to_uppercase(),
                DATE_FMT
            ));
            let dt_expr = match resolution {
                Resolution::Day => format!("{}.and_hms_opt(0, 0, 0).unwrap()", expr),
                _ => expr.to_string(),
            };
            let units = match resolution {
                Resolution::Day => "num_days",
                Resolution::Hour => "num_hours",
                Resolution::Minute => "num_minutes",
                Resolution::Second => "num_seconds",
            };
            out.push(format!(
                "{}let raw = ({} - min).{}() as u64;",
                indent, dt_expr, units
            ));
        }
        FieldKind::Bitmask { flags } => {
            out.push(format!("{}let mut raw = 0u64;", indent));
            for (flag, &pos) in flags {
                out.push(format!(
                    "{}if {}.get({:?}).copied().unwrap_or(false) {{ raw |= 1 << {}; }}",
                    indent, expr, flag, pos
                ));
            }
        }
    }
}

fn emit_encode(out: &mut Vec<String>, layouts: &[FieldLayout]) {
    out.push("    pub fn encode(&self) -> u64 {".to_string());
    out.push("        let mut packed = 0u64;".to_string());
    for layout in layouts {
        let end = layout.offset + layout.bits.max(1) - 1;
        out.push(format!(
            "        // {}: bits {}..={}",
            layout.name, layout.offset, end
        ));
        let by_ref = matches!(
            layout.kind,
            FieldKind::Enum { .. } | FieldKind::Bitmask { .. }
        );
        if layout.nullable {
            let binding = if by_ref {
                format!("if let Some(value) = &self.{} {{", layout.name)
            } else {
                format!("if let Some(value) = self.{} {{", layout.name)
            };
            out.push(format!("        {}", binding));
            out.push(format!("            packed |= 1 << {};", layout.offset));
            let value_bits = layout.bits - 1;
            if value_bits > 0 {
                normalize_lines(out, layout, "value", "            ");
                out.push(format!(
                    "            packed |= (raw & {:#x}) << {};",
                    mask(value_bits),
                    layout.offset + 1
                ));
            }
            out.push("        }".to_string());
        } else if layout.bits > 0 {
            out.push("        {".to_string());
            let expr = format!("self.{}", layout.name);
            normalize_lines(out, layout, &expr, "            ");
            out.push(format!(
                "            packed |= (raw & {:#x}) << {};",
                mask(layout.bits),
                layout.offset
            ));
            out.push("        }".to_string());
        }
    }
    out.push("        packed".to_string());
    out.push("    }".to_string());
}

/// Expression producing the semantic value from an extracted `u64` expression.
fn decoded_expr(layout: &FieldLayout, extracted: &str) -> Vec<String> {
    match &layout.kind {
        FieldKind::Bool => vec![format!("{} != 0", extracted)],
        FieldKind::Int { min, .. } => {
            vec![format!("(({}) as i64).wrapping_add({})", extracted, min)]
        }
        FieldKind::Enum { values } => vec![format!(
            "Self::{}_VALUES[(({}) as usize).min({})].to_string()",
            layout.name.to_uppercase(),
            extracted,
            values.len() - 1
        )],
        FieldKind::Date { resolution, .. } => {
            let min_line = format!(
                "let min = NaiveDateTime::parse_from_str(Self::{}_MIN, \"{}\").unwrap();",
                layout.name.to_uppercase(),
                DATE_FMT
            );
            let delta = match resolution {
                Resolution::Day => "days",
                Resolution::Hour => "hours",
                Resolution::Minute => "minutes",
                Resolution::Second => "seconds",
            };
            let value = match resolution {
                Resolution::Day => {
                    format!("(min + TimeDelta::{}(({}) as i64)).date()", delta, extracted)
                }
                _ => format!("min + TimeDelta::{}(({}) as i64)", delta, extracted),
            };
            vec!["{".to_string(), format!("    {}", min_line), format!("    {}", value), "}".to_string()]
        }
        FieldKind::Bitmask { flags } => {
            let mut lines = vec![
                "{".to_string(),
                format!("    let raw = {};", extracted),
                "    let mut m = HashMap::new();".to_string(),
            ];
            for (flag, &pos) in flags {
                lines.push(format!(
                    "    m.insert({:?}.to_string(), (raw >> {}) & 1 != 0);",
                    flag, pos
                ));
            }
            lines.push("    m".to_string());
            lines.push("}".to_string());
            lines
        }
    }
}

fn emit_decode(out: &mut Vec<String>, layouts: &[FieldLayout]) {
    out.push("    pub fn decode(packed: u64) -> Self {".to_string());
    for layout in layouts {
        if layout.nullable {
            let value_bits = layout.bits - 1;
            let extracted = if value_bits == 0 {
                "0u64".to_string()
            } else {
                format!(
                    "(packed >> {}) & {:#x}",
                    layout.offset + 1,
                    mask(value_bits)
                )
            };
            out.push(format!(
                "        let {} = if (packed >> {}) & 1 != 0 {{",
                layout.name, layout.offset
            ));
            let lines = decoded_expr(layout, &extracted);
            push_value_lines(out, &lines, "            Some(", ")");
            out.push("        } else {".to_string());
            out.push("            None".to_string());
            out.push("        };".to_string());
        } else {
            let extracted = if layout.bits == 0 {
                "0u64".to_string()
            } else {
                format!("(packed >> {}) & {:#x}", layout.offset, mask(layout.bits))
            };
            let lines = decoded_expr(layout, &extracted);
            push_value_lines(out, &lines, &format!("        let {} = ", layout.name), ";");
        }
    }
    let names = layouts
        .iter()
        .map(|l| l.name.clone())
        .collect::<Vec<_>>()
        .join(", ");
    out.push(format!("        Self {{ {} }}", names));
    out.push("    }".to_string());
}

/// Splice a single- or multi-line value expression into `prefix`/`suffix`.
fn push_value_lines(out: &mut Vec<String>, lines: &[String], prefix: &str, suffix: &str) {
    if lines.len() == 1 {
        out.push(format!("{}{}{}", prefix, lines[0], suffix));
        return;
    }
    let base_indent: String = prefix.chars().take_while(|c| *c == ' ').collect();
    out.push(format!("{}{}", prefix, lines[0]));
    for line in &lines[1..lines.len() - 1] {
        out.push(format!("{}{}", base_indent, line));
    }
    out.push(format!(
        "{}{}{}",
        base_indent,
        lines[lines.len() - 1],
        suffix
    ));
}
