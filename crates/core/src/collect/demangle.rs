//! Demangles symbol names in bulk via `c++filt`.

use crate::error::Result;
use crate::tool;

/// Pipes `names` through `c++filt`, one per line, and returns the demangled
/// form in the same order. Trailing empty lines some `c++filt` builds append
/// are discarded before zipping back with the input.
pub fn demangle_all(names: &[String]) -> Result<Vec<String>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let stdin = names.join("\n");
    let out = tool::run("c++filt", &[], &stdin)?;
    let out = out.trim_end_matches('\n');

    let mut lines: Vec<String> = out.split('\n').map(str::to_string).collect();
    // The demangler is expected to emit exactly one line per input name; pad
    // defensively if it produced fewer (should not happen in practice).
    while lines.len() < names.len() {
        lines.push(String::new());
    }
    lines.truncate(names.len());
    Ok(lines)
}
