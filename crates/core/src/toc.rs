//! Shared "table of contents" state machine for the wide `readelf` listings.
//!
//! Each listing is a sequence of header-delimited blocks: a header line
//! establishes a mapping from column index to canonical name, a blank line
//! (or, for symbols, a new header) resets it, and every row in between is
//! whitespace-split and mapped through that TOC. Column counts vary between
//! `readelf` builds (empty trailing fields get dropped), so rows are always
//! looked up by index with a missing column defaulting to `""`.

use std::collections::HashMap;

/// A column-index -> canonical-name mapping built from one header line.
#[derive(Debug, Clone)]
pub struct Toc {
    columns: Vec<String>,
}

impl Toc {
    /// Builds a TOC from header words, applying `renames` to normalize
    /// tool-specific column names (e.g. stripping colons, or mapping a
    /// FreeBSD dialect's names onto the GNU vocabulary).
    pub fn new<'a>(words: impl IntoIterator<Item = &'a str>, renames: &HashMap<&str, &str>) -> Self {
        let columns = words
            .into_iter()
            .map(|w| renames.get(w).copied().unwrap_or(w).to_string())
            .collect();
        Toc { columns }
    }

    /// Maps a row's whitespace-split words through this TOC, producing
    /// `column name -> raw string value`. Columns beyond the row's word
    /// count are recorded as an empty string, matching a `readelf` dialect
    /// that drops trailing empty fields entirely.
    pub fn row(&self, words: &[&str]) -> HashMap<String, String> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), words.get(i).copied().unwrap_or("").to_string()))
            .collect()
    }
}

/// Parses a hex string (with or without a leading `0x`) to `u64`. Empty
/// strings parse to 0, matching columns that were absent from a row.
pub fn parse_hex(s: &str) -> u64 {
    if s.is_empty() {
        return 0;
    }
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).unwrap_or(0)
}

/// Parses a size field, which `readelf` renders inconsistently: sometimes
/// `0x...` hex, sometimes plain decimal.
pub fn parse_size(s: &str) -> u64 {
    if s.is_empty() {
        return 0;
    }
    if let Some(hex) = s.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).unwrap_or(0)
    } else {
        s.parse().unwrap_or(0)
    }
}
