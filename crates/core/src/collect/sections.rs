//! Collects allocatable ELF sections from the wide `readelf -SW` listing.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};
use crate::section::Section;
use crate::toc::{parse_hex, Toc};
use crate::tool;

/// Collects sections. Mach-O inputs have no section model in this pipeline
/// and always return an empty list (see Open Questions in DESIGN.md).
pub fn collect(path: &Path, is_macho: bool) -> Result<Vec<Section>> {
    if is_macho {
        return Ok(Vec::new());
    }

    let bracket_pad_re = Regex::new(r"\[\s+").unwrap();
    let out = tool::run("readelf", &["-SW", &path.to_string_lossy()], "")?;

    let mut toc: Option<Toc> = None;
    let mut sections = Vec::new();

    for raw_line in out.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let line = bracket_pad_re.replace_all(line, "[").to_string();
        let words: Vec<&str> = line.split_whitespace().collect();

        if line.starts_with("[Nr]") {
            if toc.is_some() {
                return Err(Error::parse("multiple headers in output of readelf"));
            }
            let renames: HashMap<&str, &str> = [("Addr", "Address")].into_iter().collect();
            toc = Some(Toc::new(words, &renames));
            continue;
        }

        if line.starts_with('[') {
            let Some(t) = &toc else { continue };
            let row = t.row(&words);
            let section = Section {
                name: row.get("Name").cloned().unwrap_or_default(),
                address: parse_hex(row.get("Address").map(String::as_str).unwrap_or("")),
                file_offset: parse_hex(row.get("Off").map(String::as_str).unwrap_or("")),
                size: parse_hex(row.get("Size").map(String::as_str).unwrap_or("")),
                flags: row.get("Flg").cloned().unwrap_or_default(),
            };
            if section.is_allocatable() {
                sections.push(section);
            }
        }
    }

    if toc.is_none() {
        return Err(Error::parse(format!(
            "failed to analyze sections in {}",
            path.display()
        )));
    }

    Ok(sections)
}
