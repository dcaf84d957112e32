//! Reads the SONAME recorded in an ELF binary's dynamic section, or
//! synthesizes an equivalent load name for Mach-O.

use std::path::Path;

use regex::Regex;

use crate::error::Result;
use crate::tool;

/// Reads the ELF `SONAME` dynamic-section entry, e.g. from a line like
/// `0x000000000000000e (SONAME)             Library soname: [libndp.so.0]`.
pub fn read_elf_soname(path: &Path) -> Result<Option<String>> {
    let out = tool::run("readelf", &["-d", &path.to_string_lossy()], "")?;
    let re = Regex::new(r"\(SONAME\).*\[(.+)\]").unwrap();
    for line in out.lines() {
        if let Some(cap) = re.captures(line.trim()) {
            return Ok(Some(cap[1].to_string()));
        }
    }
    Ok(None)
}
