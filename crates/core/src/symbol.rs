//! The normalized symbol table shared by every symbol source (ELF/Mach-O
//! binaries and `.def` export lists).

/// ELF/Mach-O symbol type, narrowed to the cases the pipeline cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolType {
    Func,
    Object,
    NoType,
    Other,
}

impl SymbolType {
    pub(crate) fn parse(s: &str) -> Self {
        match s {
            "FUNC" => SymbolType::Func,
            "OBJECT" | "COMMON" => SymbolType::Object,
            "NOTYPE" => SymbolType::NoType,
            _ => SymbolType::Other,
        }
    }
}

/// ELF/Mach-O symbol binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bind {
    Local,
    Global,
    Weak,
}

impl Bind {
    pub(crate) fn parse(s: &str) -> Self {
        match s {
            "LOCAL" => Bind::Local,
            "WEAK" => Bind::Weak,
            _ => Bind::Global,
        }
    }
}

/// ELF symbol visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Default,
    Hidden,
    Protected,
}

impl Visibility {
    pub(crate) fn parse(s: &str) -> Self {
        match s {
            "HIDDEN" => Visibility::Hidden,
            "PROTECTED" => Visibility::Protected,
            _ => Visibility::Default,
        }
    }
}

/// The section index a symbol belongs to, as reported by the wide `readelf`
/// symbol table. `UND` (undefined) is distinguished from an actual section
/// because `is_exported` only needs the undefined case, while section
/// containment lookups in the unrelocated-data reader need the real index.
pub const UNDEFINED_SECTION: &str = "UND";

/// A single normalized symbol, sourced either from an ELF/Mach-O binary or
/// synthesized from a `.def` file's `EXPORTS` block.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub value: u64,
    pub size: u64,
    pub sym_type: SymbolType,
    pub bind: Bind,
    pub visibility: Visibility,
    /// Raw section index string (`"UND"` for undefined, otherwise a decimal
    /// index or another symbolic marker emitted by `readelf`).
    pub section_index: String,
    pub default_version: bool,
    pub version: Option<String>,
    /// Filled in after collection by piping every name through `c++filt`.
    pub demangled_name: String,
}

impl Symbol {
    pub fn is_undefined(&self) -> bool {
        self.section_index == UNDEFINED_SECTION
    }

    /// Splits a `name@version` or `name@@version` symbol name into
    /// `(name, version, is_default)`. A name without an `@` is its own
    /// default-version form. Applying this twice on an already-split name is
    /// a no-op, since the result never contains `@`.
    pub(crate) fn split_version(raw: &str) -> (String, Option<String>, bool) {
        match raw.find('@') {
            None => (raw.to_string(), None, true),
            Some(at) => {
                let default = raw[at..].starts_with("@@");
                let name = raw[..at].to_string();
                let ver_start = if default { at + 2 } else { at + 1 };
                let version = raw[ver_start..].to_string();
                (name, Some(version), default)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_version_default() {
        let (name, ver, default) = Symbol::split_version("read@@GLIBC_2.2.5");
        assert_eq!(name, "read");
        assert_eq!(ver.as_deref(), Some("GLIBC_2.2.5"));
        assert!(default);
    }

    #[test]
    fn split_version_nondefault() {
        let (name, ver, default) = Symbol::split_version("read@GLIBC_2.0");
        assert_eq!(name, "read");
        assert_eq!(ver.as_deref(), Some("GLIBC_2.0"));
        assert!(!default);
    }

    #[test]
    fn split_version_none() {
        let (name, ver, default) = Symbol::split_version("read");
        assert_eq!(name, "read");
        assert_eq!(ver, None);
        assert!(default);
    }

    #[test]
    fn split_version_idempotent() {
        let (name, _, _) = Symbol::split_version("read@@GLIBC_2.2.5");
        let (name2, ver2, default2) = Symbol::split_version(&name);
        assert_eq!(name2, "read");
        assert_eq!(ver2, None);
        assert!(default2);
    }
}
