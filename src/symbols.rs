//! Symbol store: read/write/enumerate wrappers over the controller
//! connection plus the plain-text table rendering used for console output.

use std::collections::HashSet;

use crate::error::Result;
use crate::plc::{Plc, Symbol};
use crate::value::coerce_loose;

/// Resolves a symbol and snapshots its current value when it carries a
/// readable type.
pub fn read_symbol(plc: &mut dyn Plc, name: &str) -> Result<Symbol> {
    let mut symbol = plc.get_symbol(name)?;
    if symbol.has_plc_type() {
        symbol.value = Some(plc.read_by_name(name)?);
    }
    Ok(symbol)
}

/// Enumerates every controller symbol not present in the ignore list,
/// reading current values for the typed ones.
pub fn enumerate(plc: &mut dyn Plc, ignore: &HashSet<String>) -> Result<Vec<Symbol>> {
    let mut symbols = Vec::new();
    for mut symbol in plc.get_all_symbols()? {
        if ignore.contains(&symbol.name) {
            continue;
        }
        if symbol.has_plc_type() {
            symbol.value = Some(plc.read_by_name(&symbol.name)?);
        }
        symbols.push(symbol);
    }
    Ok(symbols)
}

/// Writes a loosely-coerced value (trial int, then float, else string) and
/// re-reads the symbol so the caller can show what actually landed.
pub fn write_symbol(plc: &mut dyn Plc, name: &str, text: &str) -> Result<Symbol> {
    plc.write_by_name(name, coerce_loose(text))?;
    read_symbol(plc, name)
}

const SYMBOL_HEADERS: [&str; 8] = [
    "Name",
    "Comment",
    "Type",
    "Array size",
    "Auto update",
    "Index group",
    "Index offset",
    "Value",
];

/// Renders symbols as a fixed-width table. Addressing handles print as hex,
/// matching how controller tooling displays them.
pub fn render_symbols(symbols: &[Symbol]) -> String {
    let rows: Vec<[String; 8]> = symbols
        .iter()
        .map(|symbol| {
            [
                symbol.name.clone(),
                symbol.comment.clone(),
                symbol.symbol_type.clone(),
                symbol.array_size.to_string(),
                symbol.auto_update.to_string(),
                format!("{:#x}", symbol.index_group),
                format!("{:#x}", symbol.index_offset),
                symbol
                    .value
                    .as_ref()
                    .map(|value| value.to_string())
                    .unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths: [usize; 8] = SYMBOL_HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &SYMBOL_HEADERS.map(str::to_string), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

/// One-column table used for the persisted list views.
pub fn render_names(header: &str, names: &[String]) -> String {
    let width = names
        .iter()
        .map(|name| name.len())
        .chain([header.len()])
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    out.push_str(&format!("{header:width$}\n"));
    out.push_str(&format!("{}\n", "-".repeat(width)));
    for name in names {
        out.push_str(&format!("{name:width$}\n"));
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 8], widths: &[usize; 8]) {
    let mut line = String::new();
    for (cell, &width) in cells.iter().zip(widths.iter()) {
        if !line.is_empty() {
            line.push_str("  ");
        }
        line.push_str(&format!("{cell:width$}"));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}
