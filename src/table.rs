//! Human-readable layout tables (ASCII grid for consoles, markdown for docs).

use crate::layout::FieldLayout;
use crate::schema::FieldKind;

/// Output style for [`render_layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Ascii,
    Markdown,
}

const HEADERS: [&str; 5] = ["Field", "Type", "Bit Range", "Bits", "Constraints"];

/// Bit range as `offset:end` (inclusive); zero-bit fields render `-`.
pub fn format_bit_range(layout: &FieldLayout) -> String {
    if layout.bits == 0 {
        return "-".to_string();
    }
    format!("{}:{}", layout.offset, layout.offset + layout.bits - 1)
}

/// Constraints column: `[min..max]`, `N values`, `N flags`, date range, or `-`.
pub fn format_constraints(layout: &FieldLayout) -> String {
    let mut s = match &layout.kind {
        FieldKind::Bool => "-".to_string(),
        FieldKind::Int { min, max } => format!("[{}..{}]", min, max),
        FieldKind::Enum { values } => format!("{} values", values.len()),
        FieldKind::Date {
            resolution,
            min_date,
            max_date,
        } => format!(
            "{}..{} @{}",
            min_date.date(),
            max_date.date(),
            resolution.as_str()
        ),
        FieldKind::Bitmask { flags } => format!("{} flags", flags.len()),
    };
    if layout.nullable {
        s.push_str(" (nullable)");
    }
    s
}

fn rows(layouts: &[FieldLayout]) -> Vec<[String; 5]> {
    layouts
        .iter()
        .map(|l| {
            [
                l.name.clone(),
                l.kind.type_name().to_string(),
                format_bit_range(l),
                l.bits.to_string(),
                format_constraints(l),
            ]
        })
        .collect()
}

fn column_widths(rows: &[[String; 5]]) -> [usize; 5] {
    let mut widths = [0usize; 5];
    for (i, h) in HEADERS.iter().enumerate() {
        widths[i] = h.len();
    }
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }
    widths
}

/// Render the layout table in the requested format.
pub fn render_layout(layouts: &[FieldLayout], format: TableFormat) -> String {
    let rows = rows(layouts);
    let widths = column_widths(&rows);
    match format {
        TableFormat::Ascii => render_ascii(&rows, &widths),
        TableFormat::Markdown => render_markdown(&rows, &widths),
    }
}

fn render_ascii(rows: &[[String; 5]], widths: &[usize; 5]) -> String {
    let border = |fill: char| {
        let mut line = String::from("+");
        for w in widths {
            for _ in 0..w + 2 {
                line.push(fill);
            }
            line.push('+');
        }
        line
    };
    let fmt_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (i, cell) in cells.iter().enumerate() {
            line.push_str(&format!(" {:<w$} |", cell, w = widths[i]));
        }
        line
    };

    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let mut out = vec![border('-'), fmt_row(&header), border('=')];
    for row in rows {
        out.push(fmt_row(row));
        out.push(border('-'));
    }
    out.join("\n")
}

fn render_markdown(rows: &[[String; 5]], widths: &[usize; 5]) -> String {
    let fmt_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (i, cell) in cells.iter().enumerate() {
            line.push_str(&format!(" {:<w$} |", cell, w = widths[i]));
        }
        line
    };
    let mut separator = String::from("|");
    for w in widths {
        separator.push_str(&format!("{}|", "-".repeat(w + 2)));
    }

    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    let mut out = vec![fmt_row(&header), separator];
    for row in rows {
        out.push(fmt_row(row));
    }
    out.join("\n")
}
