//! Dynamic relocations, as enumerated by `readelf -rW`.

/// One dynamic relocation entry. `target_symbol` is empty when the tool
/// output carried no symbolic name (e.g. a relative relocation); in that case
/// `addend` is still meaningful on its own.
#[derive(Debug, Clone)]
pub struct Relocation {
    pub offset: u64,
    pub info: u64,
    pub reloc_type: String,
    pub target_symbol: String,
    pub addend: i64,
}
