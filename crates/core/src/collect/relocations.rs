//! Collects dynamic relocations from the wide `readelf -rW` listing.
//!
//! Two header dialects are recognized: GNU (`Offset Info Type Symbol's
//! Value Symbol's Name + Addend`) and FreeBSD (`r_offset r_info r_type
//! st_value st_name + r_addend`), the latter renamed onto the GNU
//! vocabulary so row parsing only has one canonical column set to deal with.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};
use crate::relocation::Relocation;
use crate::toc::{parse_hex, Toc};
use crate::tool;

const TARGET_COLUMN: &str = "Symbol's Name + Addend";
const TARGET_COLUMN_NO_ADDEND: &str = "Symbol's Name";

/// Splits a hex string that may carry a leading `-` sign (negative addends).
fn parse_signed_hex(s: &str) -> i64 {
    if s.is_empty() {
        return 0;
    }
    if let Some(rest) = s.strip_prefix('-') {
        -(i64::from_str_radix(rest, 16).unwrap_or(0))
    } else {
        i64::from_str_radix(s, 16).unwrap_or(0)
    }
}

/// Normalizes and splits a `"sym + addend"`-shaped cell into `(symbol,
/// addend)`. A cell with no `+` is treated as a bare addend with no symbol
/// (matching the `implib-gen.py` source exactly: relocations with no
/// associated symbol, e.g. `R_*_RELATIVE`, render as a lone hex value).
fn split_target(cell: &str) -> (String, i64) {
    if cell.is_empty() {
        return (String::new(), 0);
    }
    let mut parts = cell.splitn(2, '+');
    let first = parts.next().unwrap_or("");
    match parts.next() {
        Some(addend) => (first.to_string(), parse_signed_hex(addend)),
        None => (String::new(), parse_signed_hex(first)),
    }
}

/// Collects relocations. Mach-O inputs have no relocation model in this
/// pipeline and always return an empty list.
pub fn collect(path: &Path, is_macho: bool) -> Result<Vec<Relocation>> {
    if is_macho {
        return Ok(Vec::new());
    }

    let plus_spaces_re = Regex::new(r" \+ ").unwrap();
    let mips_type_re = Regex::new(r"^\s*Type[0-9]:").unwrap();
    let out = tool::run("readelf", &["-rW", &path.to_string_lossy()], "")?;

    let mut toc: Option<Toc> = None;
    let mut rels = Vec::new();

    for raw_line in out.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            toc = None;
            continue;
        }
        if line == "There are no relocations in this file." {
            return Ok(Vec::new());
        }
        if mips_type_re.is_match(line) {
            continue;
        }

        if line.starts_with("Offset") {
            if toc.is_some() {
                return Err(Error::parse("multiple headers in output of readelf"));
            }
            let words = split_wide(line);
            let renames: HashMap<&str, &str> = HashMap::new();
            toc = Some(Toc::new(words.iter().map(String::as_str), &renames));
            continue;
        }
        if line.starts_with("r_offset") {
            if toc.is_some() {
                return Err(Error::parse("multiple headers in output of readelf"));
            }
            let words = split_wide(line);
            let renames: HashMap<&str, &str> = [
                ("r_offset", "Offset"),
                ("r_info", "Info"),
                ("r_type", "Type"),
                ("st_value", "Symbol's Value"),
                ("st_name + r_addend", TARGET_COLUMN),
            ]
            .into_iter()
            .collect();
            toc = Some(Toc::new(words.iter().map(String::as_str), &renames));
            continue;
        }

        let Some(t) = &toc else { continue };
        let normalized = plus_spaces_re.replace_all(line, "+").to_string();
        let words: Vec<&str> = normalized.split_whitespace().collect();
        let mut row = t.row(&words);

        if !row.contains_key(TARGET_COLUMN) {
            if let Some(name_only) = row.get(TARGET_COLUMN_NO_ADDEND).cloned() {
                row.insert(TARGET_COLUMN.to_string(), format!("{name_only}+0"));
            }
        }

        let offset = parse_hex(row.get("Offset").map(String::as_str).unwrap_or(""));
        let info = parse_hex(row.get("Info").map(String::as_str).unwrap_or(""));
        let reloc_type = row.get("Type").cloned().unwrap_or_default();
        let (target_symbol, addend) =
            split_target(row.get(TARGET_COLUMN).map(String::as_str).unwrap_or(""));

        rels.push(Relocation {
            offset,
            info,
            reloc_type,
            target_symbol,
            addend,
        });
    }

    if toc.is_none() {
        return Err(Error::parse(format!(
            "failed to analyze relocations in {}",
            path.display()
        )));
    }

    Ok(rels)
}

/// Splits a header line on runs of two-or-more spaces, since multi-word
/// column names like `Symbol's Name + Addend` contain single spaces.
fn split_wide(line: &str) -> Vec<String> {
    Regex::new(r"\s\s+")
        .unwrap()
        .split(line)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_target_with_addend() {
        assert_eq!(split_target("_ZN1C3fooEv+10"), ("_ZN1C3fooEv".to_string(), 0x10));
    }

    #[test]
    fn split_target_bare_addend_only() {
        assert_eq!(split_target("a20"), (String::new(), 0xa20));
    }

    #[test]
    fn split_target_empty() {
        assert_eq!(split_target(""), (String::new(), 0));
    }
}
