//! Applies the export policy: which symbols become trampolines, which
//! become a warning about unintercepted data, and which versioned/
//! user-list entries get skipped with a diagnostic.

use std::collections::HashSet;

use crate::symbol::{Bind, Symbol, SymbolType};

/// Options that affect the export filter, independent of the architecture
/// or code-emission configuration.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub no_weak_symbols: bool,
    pub vtables: bool,
}

/// A symbol is exported iff its binding isn't local, its visibility isn't
/// hidden, it has a real type, it's defined (not `UND`), and its name isn't
/// one of the reserved init/fini symbols. `--no-weak-symbols` additionally
/// excludes WEAK bindings.
pub fn is_exported(sym: &Symbol, opts: &FilterOptions) -> bool {
    if sym.bind == Bind::Local {
        return false;
    }
    if sym.visibility == crate::symbol::Visibility::Hidden {
        return false;
    }
    if sym.sym_type == SymbolType::NoType {
        return false;
    }
    if sym.is_undefined() {
        return false;
    }
    if matches!(sym.name.as_str(), "" | "_init" | "_fini") {
        return false;
    }
    if opts.no_weak_symbols && sym.bind == Bind::Weak {
        return false;
    }
    true
}

/// A data symbol (`OBJECT` type) counts as an unintercepted export unless
/// it's a vtable-family symbol being handled separately in vtable mode.
pub fn is_unintercepted_data(sym: &Symbol, opts: &FilterOptions) -> bool {
    sym.sym_type == SymbolType::Object && !(opts.vtables && sym.demangled_name.contains(" for "))
}

/// The outcome of building the exported-function list: the ordered names to
/// emit, plus diagnostics the caller should surface as warnings.
pub struct FunctionSelection {
    pub names: Vec<String>,
    pub had_versioned_skips: bool,
    pub missing_user_symbols: Vec<String>,
}

/// Builds the final, ordered list of exported function names.
///
/// `exported` is the already-filtered (`is_exported`) symbol set. Only
/// `FUNC`-typed, default-version symbols are eligible; non-default-version
/// symbols are dropped (the caller aggregates one warning for all of them,
/// not one per symbol). If `user_list` is given, the result is that list's
/// names, in the list's order, intersected with the eligible set; entries
/// absent from the library are reported but do not abort. Without a user
/// list, the result is every eligible name in lexicographic order.
pub fn select_functions(exported: &[Symbol], user_list: Option<&[String]>) -> FunctionSelection {
    let mut had_versioned_skips = false;
    let mut all_funs: HashSet<String> = HashSet::new();

    for sym in exported.iter().filter(|s| s.sym_type == SymbolType::Func) {
        if !sym.default_version {
            had_versioned_skips = true;
            continue;
        }
        all_funs.insert(sym.name.clone());
    }

    match user_list {
        None => {
            let mut names: Vec<String> = all_funs.into_iter().collect();
            names.sort();
            FunctionSelection {
                names,
                had_versioned_skips,
                missing_user_symbols: Vec::new(),
            }
        }
        Some(list) => {
            let missing: Vec<String> = list.iter().filter(|n| !all_funs.contains(*n)).cloned().collect();
            let names: Vec<String> = list.iter().filter(|n| all_funs.contains(*n)).cloned().collect();
            FunctionSelection {
                names,
                had_versioned_skips,
                missing_user_symbols: missing,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Visibility;

    fn func(name: &str, default_version: bool) -> Symbol {
        Symbol {
            name: name.to_string(),
            value: 0,
            size: 0,
            sym_type: SymbolType::Func,
            bind: Bind::Global,
            visibility: Visibility::Default,
            section_index: "1".to_string(),
            default_version,
            version: None,
            demangled_name: name.to_string(),
        }
    }

    #[test]
    fn three_funcs_sorted_no_user_list() {
        let syms = vec![func("c", true), func("a", true), func("b", true)];
        let sel = select_functions(&syms, None);
        assert_eq!(sel.names, vec!["a", "b", "c"]);
        assert!(!sel.had_versioned_skips);
    }

    #[test]
    fn versioned_nondefault_symbol_is_skipped() {
        let syms = vec![func("read", true), func("read", false)];
        let sel = select_functions(&syms, None);
        assert_eq!(sel.names, vec!["read"]);
    }

    #[test]
    fn user_list_order_preserved_and_missing_reported() {
        let syms = vec![func("x", true), func("y", true)];
        let list = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let sel = select_functions(&syms, Some(&list));
        assert_eq!(sel.names, vec!["x", "y"]);
        assert_eq!(sel.missing_user_symbols, vec!["z"]);
    }

    #[test]
    fn hidden_and_undefined_symbols_are_not_exported() {
        let opts = FilterOptions::default();
        let mut hidden = func("h", true);
        hidden.visibility = Visibility::Hidden;
        assert!(!is_exported(&hidden, &opts));

        let mut undef = func("u", true);
        undef.section_index = "UND".to_string();
        assert!(!is_exported(&undef, &opts));

        let reserved = func("_init", true);
        assert!(!is_exported(&reserved, &opts));
    }

    #[test]
    fn no_weak_symbols_excludes_weak_binding() {
        let mut weak = func("w", true);
        weak.bind = Bind::Weak;
        assert!(is_exported(
            &weak,
            &FilterOptions {
                no_weak_symbols: false,
                vtables: false
            }
        ));
        assert!(!is_exported(
            &weak,
            &FilterOptions {
                no_weak_symbols: true,
                vtables: false
            }
        ));
    }
}
