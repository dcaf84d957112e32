//! Reads an alternate symbol source: a Windows-style `.def` text file listing
//! `EXPORTS`.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};
use crate::symbol::{Bind, Symbol, SymbolType, Visibility};

/// Parses `path` as a `.def` file. Returns the synthetic function symbols
/// found in every `EXPORTS` block plus the logical library name, if a
/// `LIBRARY`/`NAME` directive is present anywhere in the file.
///
/// Multiple `EXPORTS` blocks accumulate. A comment line (`\s*;...`) is
/// skipped; the first line in a block that is neither a comment nor a bare
/// identifier terminates that block (scanning then resumes looking for the
/// next `EXPORTS` line). An empty result is a warning, not an error.
pub fn read(path: &Path) -> Result<(Vec<Symbol>, Option<String>)> {
    let comment_re = Regex::new(r"^\s*;").unwrap();
    let export_re = Regex::new(r"^\s+([A-Za-z0-9_]+)\s*$").unwrap();
    let libname_re = Regex::new(r"^(?:LIBRARY|NAME)\s+([A-Za-z0-9_.\-]+)$").unwrap();

    let content = fs::read_to_string(path).map_err(Error::io)?;
    let lines: Vec<&str> = content.lines().collect();

    let mut syms = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim() != "EXPORTS" {
            i += 1;
            continue;
        }
        i += 1;
        while i < lines.len() {
            let line = lines[i];
            if comment_re.is_match(line) {
                i += 1;
                continue;
            }
            let Some(cap) = export_re.captures(line) else {
                break;
            };
            syms.push(Symbol {
                name: cap[1].to_string(),
                value: 0,
                size: 0,
                sym_type: SymbolType::Func,
                bind: Bind::Global,
                visibility: Visibility::Default,
                section_index: "0".to_string(),
                default_version: true,
                version: None,
                demangled_name: String::new(),
            });
            i += 1;
        }
    }

    if syms.is_empty() {
        log::warn!("failed to locate symbols in {}", path.display());
    }

    let load_name = lines
        .iter()
        .find_map(|l| libname_re.captures(l.trim()).map(|c| c[1].to_string()));

    Ok((syms, load_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_exports_with_comment_and_library_name() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "LIBRARY foo.so.1").unwrap();
        writeln!(f, "EXPORTS").unwrap();
        writeln!(f, "  alpha").unwrap();
        writeln!(f, "  beta").unwrap();
        writeln!(f, "  ; comment").unwrap();
        f.flush().unwrap();

        let (syms, load_name) = read(f.path()).unwrap();
        let names: Vec<_> = syms.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert_eq!(load_name.as_deref(), Some("foo.so.1"));
        assert!(syms.iter().all(|s| s.default_version));
    }

    #[test]
    fn accumulates_multiple_export_blocks() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "EXPORTS").unwrap();
        writeln!(f, "  one").unwrap();
        writeln!(f, "garbage line ends the block").unwrap();
        writeln!(f, "EXPORTS").unwrap();
        writeln!(f, "  two").unwrap();
        f.flush().unwrap();

        let (syms, _) = read(f.path()).unwrap();
        let names: Vec<_> = syms.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two"]);
    }

    #[test]
    fn empty_exports_is_not_fatal() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "NAME nothing.dll").unwrap();
        f.flush().unwrap();

        let (syms, load_name) = read(f.path()).unwrap();
        assert!(syms.is_empty());
        assert_eq!(load_name.as_deref(), Some("nothing.dll"));
    }
}
