//! Detects whether an input path is an ELF/Mach-O binary or a text `.def`
//! export list.

use std::path::Path;

use crate::tool;

/// The detected shape of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Elf,
    MachO,
    Text,
}

/// Probes `path`: first via `readelf -d` (ELF dynamic section), then by
/// searching a `file` invocation's output for a Mach-O marker. Anything else
/// is treated as a `.def` text file; misclassification is not fatal here, it
/// simply surfaces as a parse failure downstream.
pub fn probe(path: &Path) -> InputKind {
    let path_str = path.to_string_lossy();

    if tool::probe("readelf", &["-d", &path_str]) {
        return InputKind::Elf;
    }

    if let Some(out) = tool::run_lossy("file", &[&path_str]) {
        if out.contains("Mach-O") || out.contains("shared library") {
            return InputKind::MachO;
        }
    }

    InputKind::Text
}
