//! Per-architecture configuration: `config.ini` plus the assembly template
//! pair that live in each `arch/<name>/` directory.

use std::path::{Path, PathBuf};

use ini::Ini;

use crate::error::{Error, Result};

/// The record loaded from one `arch/<name>/config.ini`.
#[derive(Debug, Clone)]
pub struct ArchConfig {
    pub pointer_size: u64,
    pub symbol_reloc_types: Vec<String>,
    dir: PathBuf,
}

impl ArchConfig {
    /// Loads `<arch_dir>/config.ini`, section `[Arch]`, keys `PointerSize`
    /// (integer) and `SymbolReloc` (comma-separated relocation type names).
    pub fn load(arch_dir: &Path) -> Result<Self> {
        let ini_path = arch_dir.join("config.ini");
        let conf = Ini::load_from_file(&ini_path)
            .map_err(|e| Error::config(format!("failed to read {}: {e}", ini_path.display())))?;
        let section = conf.section(Some("Arch")).ok_or_else(|| {
            Error::config(format!("{} has no [Arch] section", ini_path.display()))
        })?;

        let pointer_size: u64 = section
            .get("PointerSize")
            .ok_or_else(|| Error::config("missing PointerSize in [Arch]".to_string()))?
            .trim()
            .parse()
            .map_err(|_| Error::config("PointerSize is not an integer".to_string()))?;

        let symbol_reloc_types = section
            .get("SymbolReloc")
            .unwrap_or("")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(ArchConfig {
            pointer_size,
            symbol_reloc_types,
            dir: arch_dir.to_path_buf(),
        })
    }

    pub fn table_template_path(&self) -> PathBuf {
        self.dir.join("table.S.tpl")
    }

    pub fn trampoline_template_path(&self) -> PathBuf {
        self.dir.join("trampoline.S.tpl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_pointer_size_and_reloc_types() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("config.ini")).unwrap();
        writeln!(f, "[Arch]").unwrap();
        writeln!(f, "PointerSize=8").unwrap();
        writeln!(f, "SymbolReloc=R_X86_64_64, R_X86_64_GLOB_DAT").unwrap();
        f.flush().unwrap();

        let cfg = ArchConfig::load(dir.path()).unwrap();
        assert_eq!(cfg.pointer_size, 8);
        assert_eq!(
            cfg.symbol_reloc_types,
            vec!["R_X86_64_64".to_string(), "R_X86_64_GLOB_DAT".to_string()]
        );
    }
}
