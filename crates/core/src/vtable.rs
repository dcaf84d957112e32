//! Reconstructs C++ vtables/typeinfo from unrelocated bytes plus dynamic
//! relocations, and emits the equivalent C definitions.

use std::collections::{BTreeMap, HashMap};

use crate::relocation::Relocation;
use crate::slot::Slot;
use crate::symbol::Symbol;

/// Strips a trailing `@version` suffix from a relocation target: C has no
/// notion of symbol versioning, so a reloc into a versioned symbol is always
/// referenced unversioned.
fn strip_version_suffix(name: &str) -> &str {
    match name.find('@') {
        Some(at) => &name[..at],
        None => name,
    }
}

/// The three C++ artifacts a class symbol can demangle to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassArtifact {
    Vtable,
    Typeinfo,
    TypeinfoName,
}

/// Recognizes a demangled name of the form `"vtable for C"`, `"typeinfo for
/// C"` or `"typeinfo name for C"`, returning the artifact kind and the class
/// name `C`. Anything else (including a bare `typeinfo name` with no `for`,
/// which [`interpret_slots`] also checks on its own) returns `None`.
pub fn classify(demangled: &str) -> Option<(ClassArtifact, &str)> {
    if let Some(rest) = demangled.strip_prefix("typeinfo name for ") {
        return Some((ClassArtifact::TypeinfoName, rest));
    }
    if let Some(rest) = demangled.strip_prefix("typeinfo for ") {
        return Some((ClassArtifact::Typeinfo, rest));
    }
    if let Some(rest) = demangled.strip_prefix("vtable for ") {
        return Some((ClassArtifact::Vtable, rest));
    }
    None
}

/// Builds the `Slot` sequence for one class symbol (vtable, typeinfo, or
/// typeinfo name).
///
/// `typeinfo name` symbols are interpreted byte-wise as a NUL-terminated
/// string. Everything else is interpreted as an array of little-endian
/// `pointer_size`-byte words, each starting as `Offset`, then overlaid by
/// any relocation of an accepted type landing inside `[sym.value, sym.value
/// + sym.size)`.
pub fn interpret_slots(
    sym: &Symbol,
    bytes: &[u8],
    pointer_size: u64,
    relocs: &[Relocation],
    symbol_reloc_types: &[String],
) -> Vec<Slot> {
    if sym.demangled_name.starts_with("typeinfo name") {
        return bytes.iter().map(|b| Slot::Byte(*b)).collect();
    }

    let ptr = pointer_size as usize;
    let mut slots: Vec<Slot> = bytes
        .chunks(ptr)
        .map(|chunk| {
            let mut word = 0u64;
            for (i, b) in chunk.iter().enumerate() {
                word |= (*b as u64) << (8 * i);
            }
            Slot::Offset(word)
        })
        .collect();

    let start = sym.value;
    let end = start + sym.size;
    for rel in relocs {
        if symbol_reloc_types.iter().any(|t| t == &rel.reloc_type) && rel.offset >= start && rel.offset < end {
            let index = ((rel.offset - start) / pointer_size) as usize;
            if index < slots.len() {
                slots[index] = Slot::Reloc {
                    target: strip_version_suffix(&rel.target_symbol).to_string(),
                    addend: rel.addend,
                };
            }
        }
    }

    slots
}

/// A class symbol's reconstructed slots, keyed by its mangled name.
pub type ClassData = BTreeMap<String, Vec<Slot>>;

/// C type used for one field of a reconstructed vtable struct.
fn field_c_type(slot: &Slot) -> &'static str {
    match slot {
        Slot::Reloc { .. } => "const void *",
        Slot::Byte(_) => "unsigned char",
        Slot::Offset(_) => "size_t",
    }
}

/// Emits the C translation unit for a set of reconstructed vtable/typeinfo
/// symbols: externs for cross-class relocation targets, a typedef plus weak
/// declaration per class symbol, then the definitions. Iteration is always
/// lexicographic by symbol name for deterministic output.
pub fn generate_vtables(class_syms: &HashMap<String, Symbol>, class_data: &ClassData) -> String {
    let mut out = String::new();
    out.push_str("#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n");

    // Externs: one per Reloc target not itself a class symbol, deduplicated.
    let mut externs: Vec<&str> = Vec::new();
    for (name, data) in class_data.iter() {
        let _ = name;
        for slot in data {
            if let Slot::Reloc { target, .. } = slot {
                if !class_syms.contains_key(target) && !externs.contains(&target.as_str()) {
                    externs.push(target.as_str());
                }
            }
        }
    }
    externs.sort();
    externs.dedup();
    for target in &externs {
        out.push_str(&format!("extern const char {target}[];\n\n"));
    }

    // Typedef + declaration per class symbol.
    for (name, sym) in class_syms.iter().collect::<BTreeMap<_, _>>() {
        let data = &class_data[name];
        let type_name = format!("{name}_type");
        if sym.demangled_name.starts_with("typeinfo name") {
            out.push_str(&format!("typedef const unsigned char {type_name}[];\n"));
        } else {
            let fields: Vec<String> = data
                .iter()
                .enumerate()
                .map(|(i, slot)| format!("{} field_{i};", field_c_type(slot)))
                .collect();
            out.push_str(&format!(
                "typedef const struct {{ {} }} {type_name};\n",
                fields.join(" ")
            ));
        }
        out.push_str(&format!(
            "extern __attribute__((weak)) {type_name} {name};\n"
        ));
    }
    out.push('\n');

    // Definitions.
    for (name, _) in class_syms.iter().collect::<BTreeMap<_, _>>() {
        let data = &class_data[name];
        let type_name = format!("{name}_type");
        let vals: Vec<String> = data
            .iter()
            .map(|slot| match slot {
                Slot::Byte(b) => format!("{b}UL"),
                Slot::Offset(w) => format!("{w}UL"),
                Slot::Reloc { target, addend } => format!("(const char *)&{target} + {addend}"),
            })
            .collect();
        out.push_str(&format!(
            "const {type_name} {name} = {{ {} }};\n",
            vals.join(", ")
        ));
    }

    out.push_str("\n#ifdef __cplusplus\n}  // extern \"C\"\n#endif\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Bind, SymbolType, Visibility};

    fn class_sym(name: &str, demangled: &str, value: u64, size: u64) -> Symbol {
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
            demangled_name: demangled.to_string(),
        }
    }

    #[test]
    fn three_pointer_vtable_with_one_reloc_slot() {
        let sym = class_sym("_ZTV1C", "vtable for C", 0x2000, 24);
        let bytes = vec![0u8; 24];
        let relocs = vec![Relocation {
            offset: 0x2010,
            info: 0,
            reloc_type: "R_X86_64_64".to_string(),
            target_symbol: "_ZN1C3fooEv".to_string(),
            addend: 0,
        }];
        let types = vec!["R_X86_64_64".to_string()];
        let slots = interpret_slots(&sym, &bytes, 8, &relocs, &types);
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0], Slot::Offset(0));
        assert_eq!(slots[1], Slot::Offset(0));
        assert_eq!(
            slots[2],
            Slot::Reloc {
                target: "_ZN1C3fooEv".to_string(),
                addend: 0
            }
        );
    }

    #[test]
    fn versioned_reloc_target_is_stripped() {
        assert_eq!(strip_version_suffix("read@@GLIBC_2.2.5"), "read");
        assert_eq!(strip_version_suffix("read"), "read");
    }

    #[test]
    fn typeinfo_name_is_byte_sequence() {
        let sym = class_sym("_ZTS1C", "typeinfo name for C", 0x3000, 3);
        let slots = interpret_slots(&sym, &[b'1', b'C', 0], 8, &[], &[]);
        assert_eq!(slots, vec![Slot::Byte(b'1'), Slot::Byte(b'C'), Slot::Byte(0)]);
    }

    #[test]
    fn classify_recognizes_all_three_artifacts() {
        assert_eq!(
            classify("vtable for C"),
            Some((ClassArtifact::Vtable, "C"))
        );
        assert_eq!(
            classify("typeinfo for C"),
            Some((ClassArtifact::Typeinfo, "C"))
        );
        assert_eq!(
            classify("typeinfo name for C"),
            Some((ClassArtifact::TypeinfoName, "C"))
        );
        assert_eq!(classify("C::foo()"), None);
    }

    #[test]
    fn externs_skip_same_class_targets() {
        let mut class_syms = HashMap::new();
        class_syms.insert(
            "_ZTV1C".to_string(),
            class_sym("_ZTV1C", "vtable for C", 0x2000, 8),
        );
        class_syms.insert(
            "_ZTI1C".to_string(),
            class_sym("_ZTI1C", "typeinfo for C", 0x2100, 8),
        );
        let mut class_data: ClassData = BTreeMap::new();
        class_data.insert(
            "_ZTV1C".to_string(),
            vec![Slot::Reloc {
                target: "_ZTI1C".to_string(),
                addend: 0,
            }],
        );
        class_data.insert(
            "_ZTI1C".to_string(),
            vec![Slot::Reloc {
                target: "_ZTVN10__cxxabiv117__class_type_infoE".to_string(),
                addend: 16,
            }],
        );
        let out = generate_vtables(&class_syms, &class_data);
        assert!(!out.contains("extern const char _ZTV1C"));
        assert!(!out.contains("extern const char _ZTI1C"));
        assert!(out.contains("extern const char _ZTVN10__cxxabiv117__class_type_infoE[];"));
    }
}
