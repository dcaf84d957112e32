//! The tagged interpretation of one pointer-sized (or byte-sized, for
//! `typeinfo name` symbols) slot within a vtable/typeinfo's raw bytes.
//!
//! This replaces the source tool's ad-hoc `("byte"|"offset"|"reloc", value)`
//! pair encoding with an explicit sum type so emission can match
//! exhaustively.

/// One slot of a reconstructed vtable/typeinfo/typeinfo-name symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// A single raw byte, used only for `typeinfo name` strings.
    Byte(u8),
    /// A pointer-sized word with no matching relocation: printed as a
    /// numeric offset rather than a symbol reference.
    Offset(u64),
    /// A pointer-sized word overlaid by a dynamic relocation pointing at
    /// `target + addend`.
    Reloc { target: String, addend: i64 },
}
