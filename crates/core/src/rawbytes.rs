//! Reads each selected symbol's unrelocated bytes straight from the file,
//! by locating the unique section that contains it and seeking to the
//! symbol's byte position within that section.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Error, Result};
use crate::section::Section;
use crate::symbol::Symbol;

/// Reads the raw bytes backing every symbol in `syms`, keyed by name.
///
/// For each symbol, exactly one section in `sections` must contain its
/// `[value, value + size)` interval; zero or multiple matches abort with the
/// offending interval in the message. The read seeks to
/// `section.file_offset + (symbol.value - section.address)`: the source this
/// crate is modeled on seeks to the section's file offset directly, which
/// only happens to work when a section holds a single symbol. See
/// DESIGN.md's Open Questions for the full discussion.
pub fn read_unrelocated(
    path: &Path,
    syms: &[&Symbol],
    sections: &[Section],
) -> Result<HashMap<String, Vec<u8>>> {
    let mut file = File::open(path).map_err(Error::io)?;
    let mut data = HashMap::new();

    let mut ordered: Vec<&&Symbol> = syms.iter().collect();
    ordered.sort_by_key(|s| s.value);

    for sym in ordered {
        let matches: Vec<&Section> = sections
            .iter()
            .filter(|sec| sec.contains(sym.value, sym.size))
            .collect();
        if matches.len() != 1 {
            return Err(Error::model(format!(
                "failed to locate section for interval [{:x}, {:x})",
                sym.value,
                sym.value + sym.size
            )));
        }
        let sec = matches[0];
        let offset = sec.file_offset + (sym.value - sec.address);
        file.seek(SeekFrom::Start(offset)).map_err(Error::io)?;

        let mut buf = vec![0u8; sym.size as usize];
        file.read_exact(&mut buf).map_err(Error::io)?;
        data.insert(sym.name.clone(), buf);
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sym(name: &str, value: u64, size: u64) -> Symbol {
        use crate::symbol::{Bind, SymbolType, Visibility};
        Symbol {
            name: name.to_string(),
            value,
            size,
            sym_type: SymbolType::Object,
            bind: Bind::Global,
            visibility: Visibility::Default,
            section_index: "1".to_string(),
            default_version: true,
            version: None,
            demangled_name: String::new(),
        }
    }

    #[test]
    fn reads_bytes_at_intra_section_offset() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        // 4 bytes of padding, then the 4-byte payload we want.
        f.write_all(&[0xAA, 0xAA, 0xAA, 0xAA, 1, 2, 3, 4]).unwrap();
        f.flush().unwrap();

        let sections = vec![Section {
            name: ".data.rel.ro".to_string(),
            address: 0x2000,
            file_offset: 0,
            size: 16,
            flags: "WA".to_string(),
        }];
        // Symbol starts 4 bytes into the section.
        let s = sym("vtable for C", 0x2004, 4);
        let syms = vec![&s];

        let data = read_unrelocated(f.path(), &syms, &sections).unwrap();
        assert_eq!(data["vtable for C"], vec![1, 2, 3, 4]);
    }

    #[test]
    fn errors_when_no_section_contains_symbol() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let s = sym("orphan", 0xdead, 8);
        let syms = vec![&s];
        let err = read_unrelocated(f.path(), &syms, &[]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Model);
    }
}
