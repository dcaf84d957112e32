//! Collects the dynamic symbol table of an ELF or Mach-O binary.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};
use crate::probe::InputKind;
use crate::symbol::{Bind, Symbol, SymbolType, Visibility};
use crate::toc::{parse_hex, parse_size, Toc};
use crate::tool;

/// Mirrors Python's `str.isupper()`: true iff the string has at least one
/// cased character and every cased character is uppercase.
fn is_upper(s: &str) -> bool {
    s.chars().any(|c| c.is_alphabetic()) && s.chars().all(|c| !c.is_alphabetic() || c.is_uppercase())
}

/// Collects the visibility map used by both the ELF and Mach-O paths: a
/// global `nm -g` listing is the sole authority for DEFAULT vs. HIDDEN,
/// since `readelf -sW`'s own `Vis` column conflates local and hidden
/// symbols in some binutils builds.
fn collect_visibility(path: &Path) -> Result<HashMap<String, Visibility>> {
    let out = tool::run("nm", &["-g", &path.to_string_lossy()], "")?;
    let mut visibility = HashMap::new();
    for line in out.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() >= 3 {
            let symbol_type = parts[1];
            let name = parts[2];
            let vis = if is_upper(symbol_type) {
                Visibility::Default
            } else {
                Visibility::Hidden
            };
            visibility.insert(name.to_string(), vis);
        }
    }
    Ok(visibility)
}

static LOCALENTRY_MARKER: &str = r"\[<localentry>: [0-9]+\]";

/// Collects symbols from an ELF binary's wide `readelf -sW` listing.
pub fn collect_elf(path: &Path) -> Result<Vec<Symbol>> {
    let visibility = collect_visibility(path)?;
    let marker_re = Regex::new(LOCALENTRY_MARKER).unwrap();
    let out = tool::run("readelf", &["-sW", &path.to_string_lossy()], "")?;

    let mut toc: Option<Toc> = None;
    let mut any_header_seen = false;
    let mut syms = Vec::new();
    let mut seen = HashSet::new();

    for raw_line in out.lines() {
        let line = marker_re.replace_all(raw_line.trim(), "").to_string();
        if line.is_empty() {
            toc = None;
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().collect();

        if line.starts_with("Num") {
            if toc.is_some() {
                return Err(Error::parse("multiple headers in output of readelf"));
            }
            any_header_seen = true;
            let renames: HashMap<&str, &str> = HashMap::new();
            let stripped: Vec<String> = words.iter().map(|w| w.replace(':', "")).collect();
            let stripped_refs: Vec<&str> = stripped.iter().map(|s| s.as_str()).collect();
            toc = Some(Toc::new(stripped_refs, &renames));
            continue;
        }

        let Some(t) = &toc else { continue };
        let row = t.row(&words);
        let name_raw = row.get("Name").cloned().unwrap_or_default();
        if name_raw.is_empty() {
            continue;
        }
        if !seen.insert(name_raw.clone()) {
            continue;
        }

        let value = parse_hex(row.get("Value").map(String::as_str).unwrap_or(""));
        let size = parse_size(row.get("Size").map(String::as_str).unwrap_or(""));
        let sym_type = SymbolType::parse(row.get("Type").map(String::as_str).unwrap_or(""));
        let bind = Bind::parse(row.get("Bind").map(String::as_str).unwrap_or(""));
        let section_index = row.get("Ndx").cloned().unwrap_or_default();

        let (name, version, default_version) = Symbol::split_version(&name_raw);
        let vis = visibility.get(&name).copied().unwrap_or(Visibility::Default);

        syms.push(Symbol {
            name,
            value,
            size,
            sym_type,
            bind,
            visibility: vis,
            section_index,
            default_version,
            version,
            demangled_name: String::new(),
        });
    }

    if !any_header_seen {
        // The wide listing never produced a single header: nothing was ever
        // parsed, so there's no way to know the binary's symbol table.
        return Err(Error::parse("failed to analyze symbols".to_string()));
    }

    Ok(syms)
}

/// Collects symbols from a Mach-O binary's simple `nm -D` listing:
/// three whitespace-separated columns, `address type name`. Sections,
/// relocations, and raw-byte reads are unsupported for Mach-O and return
/// empty further down the pipeline.
pub fn collect_macho(path: &Path) -> Result<Vec<Symbol>> {
    let visibility = collect_visibility(path)?;
    let out = tool::run("nm", &["-D", &path.to_string_lossy()], "")?;

    let mut syms = Vec::new();
    let mut seen = HashSet::new();

    for line in out.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }
        let address = parts[0];
        let symbol_type = parts[1];
        let name = parts[2];

        if !seen.insert(name.to_string()) {
            continue;
        }

        let value = if address == "U" { 0 } else { parse_hex(address) };
        let sym_type = if symbol_type.to_uppercase() == "T" {
            SymbolType::Func
        } else {
            SymbolType::Object
        };
        let bind = if is_upper(symbol_type) { Bind::Global } else { Bind::Local };
        let section_index = if symbol_type.to_uppercase() == "U" {
            "UND".to_string()
        } else {
            "1".to_string()
        };

        let vis = visibility.get(name).copied().unwrap_or(Visibility::Default);

        syms.push(Symbol {
            name: name.to_string(),
            value,
            size: 0,
            sym_type,
            bind,
            visibility: vis,
            section_index,
            default_version: true,
            version: None,
            demangled_name: String::new(),
        });
    }

    Ok(syms)
}

/// Dispatches to the ELF or Mach-O collector based on the probed input kind.
/// Text inputs are handled separately by [`crate::collect::deffile`].
pub fn collect(path: &Path, kind: InputKind) -> Result<Vec<Symbol>> {
    match kind {
        InputKind::Elf => collect_elf(path),
        InputKind::MachO => collect_macho(path),
        InputKind::Text => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toc_driven_row_parsing_matches_expected_columns() {
        let renames: HashMap<&str, &str> = HashMap::new();
        let toc = Toc::new(["Num", "Value", "Size", "Type", "Bind", "Vis", "Ndx", "Name"], &renames);
        let row = toc.row(&["0:", "0000000000001139", "17", "FUNC", "GLOBAL", "DEFAULT", "12", "foo"]);
        assert_eq!(row.get("Name").unwrap(), "foo");
        assert_eq!(parse_hex(row.get("Value").unwrap()), 0x1139);
        assert_eq!(parse_size(row.get("Size").unwrap()), 17);
    }
}
