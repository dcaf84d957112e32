//! Composes the architecture's assembly templates and the common C template
//! into the final `.tramp.S` and `.init.c` sources.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::Regex;

use crate::arch::ArchConfig;
use crate::error::{Error, Result};

/// A minimal `$name`/`${name}` template substitution, modeled on Python's
/// `string.Template` (the source tool's templating mechanism). `$$` escapes
/// to a literal `$`.
pub fn substitute(template: &str, vars: &HashMap<&str, String>) -> String {
    let re = Regex::new(r"\$\{(\w+)\}|\$(\w+)|\$\$").unwrap();
    re.replace_all(template, |caps: &regex::Captures| {
        if caps.get(0).unwrap().as_str() == "$$" {
            return "$".to_string();
        }
        let name = caps.get(1).or_else(|| caps.get(2)).unwrap().as_str();
        vars.get(name).cloned().unwrap_or_default()
    })
    .into_owned()
}

/// Sanitizes an arbitrary string into a valid C identifier fragment: every
/// run of non-alphanumeric-underscore characters collapses to a single `_`.
pub fn sanitize_c_ident(s: &str) -> String {
    Regex::new(r"[^a-zA-Z0-9_]+").unwrap().replace_all(s, "_").into_owned()
}

/// Options that drive code emission, independent of the collected function
/// list (which is passed separately since it's threaded through both the
/// trampoline table and the init C's symbol-name array).
#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub lib_suffix: String,
    pub load_name: String,
    pub dlopen_callback: String,
    pub dlsym_callback: String,
    pub no_dlopen: bool,
    pub lazy_load: bool,
    pub thread_safe: bool,
    pub symbol_prefix: String,
}

/// Renders the jump-table template once, then the trampoline template once
/// per exported function, concatenating the result into the `.tramp.S`
/// body.
pub fn render_tramp(arch: &ArchConfig, funs: &[String], opts: &EmitOptions) -> Result<String> {
    let table_tpl = fs::read_to_string(arch.table_template_path()).map_err(Error::io)?;
    let tramp_tpl = fs::read_to_string(arch.trampoline_template_path()).map_err(Error::io)?;

    let table_size = (arch.pointer_size * (funs.len() as u64 + 1)).to_string();
    let mut vars = HashMap::new();
    vars.insert("lib_suffix", opts.lib_suffix.clone());
    vars.insert("table_size", table_size);
    let mut out = substitute(&table_tpl, &vars);

    for (i, name) in funs.iter().enumerate() {
        let mut vars = HashMap::new();
        vars.insert("lib_suffix", opts.lib_suffix.clone());
        vars.insert("sym", format!("{}{}", opts.symbol_prefix, name));
        vars.insert("offset", (i as u64 * arch.pointer_size).to_string());
        vars.insert("number", i.to_string());
        out.push_str(&substitute(&tramp_tpl, &vars));
    }

    Ok(out)
}

/// Renders the common `init.c.tpl`, producing the `.init.c` body (without
/// any vtable synthesis, which the caller appends separately in vtable
/// mode).
pub fn render_init_c(common_dir: &Path, funs: &[String], opts: &EmitOptions) -> Result<String> {
    let tpl_path = common_dir.join("init.c.tpl");
    let tpl = fs::read_to_string(&tpl_path).map_err(Error::io)?;

    let sym_names = if funs.is_empty() {
        String::new()
    } else {
        let joined = funs
            .iter()
            .map(|n| format!("\"{n}\""))
            .collect::<Vec<_>>()
            .join(",\n  ");
        format!("{joined},")
    };

    let mut vars = HashMap::new();
    vars.insert("lib_suffix", opts.lib_suffix.clone());
    vars.insert("load_name", opts.load_name.clone());
    vars.insert("dlopen_callback", opts.dlopen_callback.clone());
    vars.insert("dlsym_callback", opts.dlsym_callback.clone());
    vars.insert(
        "has_dlopen_callback",
        (!opts.dlopen_callback.is_empty() as u8).to_string(),
    );
    vars.insert(
        "has_dlsym_callback",
        (!opts.dlsym_callback.is_empty() as u8).to_string(),
    );
    vars.insert("no_dlopen", (opts.no_dlopen as u8).to_string());
    vars.insert("lazy_load", (opts.lazy_load as u8).to_string());
    vars.insert("thread_safe", (opts.thread_safe as u8).to_string());
    vars.insert("sym_names", sym_names);

    Ok(substitute(&tpl, &vars))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitute_replaces_named_and_braced_vars() {
        let mut vars = HashMap::new();
        vars.insert("lib_suffix", "foo".to_string());
        vars.insert("table_size", "16".to_string());
        let out = substitute("mov $lib_suffix, ${table_size}($$)", &vars);
        assert_eq!(out, "mov foo, 16($)");
    }

    #[test]
    fn sanitize_collapses_runs_of_non_ident_chars() {
        assert_eq!(sanitize_c_ident("libfoo-1.2.3.so"), "libfoo_1_2_3_so");
        assert_eq!(sanitize_c_ident("plain_name"), "plain_name");
    }
}
