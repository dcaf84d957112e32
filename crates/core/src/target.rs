//! Normalizes a `--target` triple to the architecture directory name under
//! `arch/`.

use regex::Regex;

/// Normalizes `triple` to an architecture directory name. Unknown triples
/// fall back to their first hyphen-separated segment, which the caller then
/// validates against the actual `arch/` directory listing.
pub fn normalize(triple: &str) -> String {
    if triple.starts_with("arm") {
        return "arm".to_string();
    }
    if Regex::new(r"^i[0-9]86").unwrap().is_match(triple) {
        return "i386".to_string();
    }
    if triple.starts_with("amd64") {
        return "x86_64".to_string();
    }
    if triple.starts_with("mips64") {
        return "mips64".to_string();
    }
    if triple.starts_with("mips") {
        return "mips".to_string();
    }
    if triple.starts_with("ppc64le") {
        return "powerpc64le".to_string();
    }
    if triple.starts_with("ppc64") {
        return "powerpc64".to_string();
    }
    if triple.starts_with("rv64") {
        return "riscv64".to_string();
    }
    triple.split('-').next().unwrap_or(triple).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ppc64le_normalizes_to_powerpc64le() {
        assert_eq!(normalize("ppc64le-unknown-linux-gnu"), "powerpc64le");
    }

    #[test]
    fn ppc64_without_le_normalizes_to_powerpc64() {
        assert_eq!(normalize("ppc64-unknown-linux-gnu"), "powerpc64");
    }

    #[test]
    fn arm_variants_normalize_to_arm() {
        assert_eq!(normalize("armv7-unknown-linux-gnueabihf"), "arm");
        assert_eq!(normalize("armhf-linux"), "arm");
    }

    #[test]
    fn i686_normalizes_to_i386() {
        assert_eq!(normalize("i686-pc-linux-gnu"), "i386");
    }

    #[test]
    fn x86_64_passes_through_via_first_segment() {
        assert_eq!(normalize("x86_64-unknown-linux-gnu"), "x86_64");
    }

    #[test]
    fn unknown_triple_falls_back_to_first_segment() {
        assert_eq!(normalize("sparc64-unknown-linux-gnu"), "sparc64");
    }
}
