//! Generates a static import library for a POSIX shared library.
//!
//! Use [`Generator`] to turn a shared object (ELF or Mach-O) or a `.def`
//! export list into a pair of source files: architecture-specific assembly
//! containing a jump table and one trampoline per exported function, plus a
//! portable C file providing the load/resolve runtime. In vtable mode, C++
//! polymorphic classes are additionally reconstructed from unrelocated
//! vtable/typeinfo bytes and their dynamic relocations.
//!
//! # Example
//! ```no_run
//! use implib_gen_core::{Generator, GeneratorOptions};
//! use std::path::PathBuf;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = GeneratorOptions::new(
//!         PathBuf::from("/usr/lib/libfoo.so.1"),
//!         PathBuf::from("arch"),
//!         PathBuf::from("out"),
//!     );
//!     let generated = Generator.generate(&options)?;
//!     println!("wrote {}", generated.tramp_path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_debug_implementations)]

mod arch;
mod collect;
mod emit;
mod error;
mod filter;
mod probe;
mod rawbytes;
mod relocation;
mod section;
mod slot;
mod soname;
mod symbol;
mod target;
mod toc;
mod tool;
mod vtable;

pub use arch::ArchConfig;
pub use error::{Error, ErrorKind, Result};
pub use filter::FilterOptions;
pub use probe::InputKind;
pub use relocation::Relocation;
pub use section::Section;
pub use slot::Slot;
pub use symbol::{Bind, Symbol, SymbolType, Visibility};
pub use vtable::ClassArtifact;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Options controlling one [`Generator::generate`] run.
///
/// Mirrors `implib-gen.py`'s CLI surface one-for-one; see spec.md §6. Fields
/// are public (`#[non_exhaustive]`-free, like `object_rewrite::Options`)
/// since this is a plain data record with no invariants between fields.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// The shared object, or `.def` export list, to wrap.
    pub input: PathBuf,
    /// Directory containing one subdirectory per architecture
    /// (`<arch_dir>/<target>/config.ini`, `table.S.tpl`, `trampoline.S.tpl`)
    /// plus `<arch_dir>/common/init.c.tpl`.
    pub arch_dir: PathBuf,
    /// Directory the two output files are written into. Created if absent.
    pub outdir: PathBuf,
    /// Target platform triple, normalized via [`target::normalize`]. Defaults
    /// to the host architecture.
    pub target: String,
    /// Override the basename used for the generated `<suffix>.tramp.S` /
    /// `<suffix>.init.c` files. Defaults to the input's basename (with a
    /// trailing `.def` stripped).
    pub suffix: Option<String>,
    /// Emit a `dlopen` call in the generated runtime.
    pub dlopen: bool,
    /// User-provided function to call instead of `dlopen`.
    pub dlopen_callback: String,
    /// User-provided function to call instead of `dlsym`.
    pub dlsym_callback: String,
    /// Override the name passed to the loader. Defaults to the ELF SONAME,
    /// the Mach-O basename, or the `.def` file's `LIBRARY`/`NAME` directive.
    pub library_load_name: Option<String>,
    /// Resolve symbols lazily, on first call, rather than at program start.
    pub lazy_load: bool,
    /// Guard one-time resolution so it is safe under concurrent callers.
    pub thread_safe: bool,
    /// Reconstruct and emit C++ vtables/typeinfo (experimental).
    pub vtables: bool,
    /// Exclude WEAK-bound symbols from the exported set.
    pub no_weak_symbols: bool,
    /// Restrict the exported function set to these names, in this order.
    /// Names absent from the library are warned about, not treated as fatal.
    pub symbol_list: Option<Vec<String>>,
    /// Prefix prepended to every trampoline's emitted external symbol.
    pub symbol_prefix: String,
    /// Suppress the "no public functions were found" warning and progress
    /// messages that would otherwise print even without `RUST_LOG`.
    pub quiet: bool,
}

impl GeneratorOptions {
    /// Builds options with the same defaults as `implib-gen.py`: dlopen on,
    /// lazy load on, thread safety on, vtables off, no symbol restriction.
    pub fn new(input: PathBuf, arch_dir: PathBuf, outdir: PathBuf) -> Self {
        GeneratorOptions {
            input,
            arch_dir,
            outdir,
            target: std::env::consts::ARCH.to_string(),
            suffix: None,
            dlopen: true,
            dlopen_callback: String::new(),
            dlsym_callback: String::new(),
            library_load_name: None,
            lazy_load: true,
            thread_safe: true,
            vtables: false,
            no_weak_symbols: false,
            symbol_list: None,
            symbol_prefix: String::new(),
            quiet: false,
        }
    }
}

/// The two files a successful [`Generator::generate`] call wrote.
#[derive(Debug, Clone)]
pub struct GeneratedFiles {
    /// The `<suffix>.tramp.S` path: jump table plus one trampoline per
    /// exported function.
    pub tramp_path: PathBuf,
    /// The `<suffix>.init.c` path: load/resolve runtime, with vtable
    /// synthesis appended when [`GeneratorOptions::vtables`] is set.
    pub init_path: PathBuf,
    /// The exported function names that ended up in the trampoline table,
    /// in emission order.
    pub functions: Vec<String>,
}

/// Sequences the whole pipeline: probe, collect, filter, and emit.
///
/// Zero-sized, like `object_rewrite::Rewriter` is not — but there is no
/// per-run state to carry between calls, so `generate` takes `&self` only
/// for API symmetry with a future stateful variant (e.g. a cached
/// demangler).
#[derive(Debug, Default, Clone, Copy)]
pub struct Generator;

impl Generator {
    /// Runs the full pipeline for `options`, writing the two generated files
    /// and returning their paths.
    pub fn generate(&self, options: &GeneratorOptions) -> Result<GeneratedFiles> {
        let kind = probe::probe(&options.input);

        if options.vtables {
            if kind == InputKind::Text {
                return Err(Error::config(
                    "vtables not supported for .def files".to_string(),
                ));
            }
            if kind == InputKind::MachO {
                return Err(Error::config(
                    "vtables not supported for Mach-O input".to_string(),
                ));
            }
        }

        let (mut syms, def_load_name) = match kind {
            InputKind::Text => {
                let (syms, load_name) = collect::deffile::read(&options.input)?;
                (syms, load_name)
            }
            _ => (collect::symbols::collect(&options.input, kind)?, None),
        };

        demangle_in_place(&mut syms)?;

        let filter_opts = FilterOptions {
            no_weak_symbols: options.no_weak_symbols,
            vtables: options.vtables,
        };
        let exported: Vec<Symbol> = syms
            .iter()
            .filter(|s| filter::is_exported(s, &filter_opts))
            .cloned()
            .collect();

        let unintercepted: Vec<&str> = exported
            .iter()
            .filter(|s| filter::is_unintercepted_data(s, &filter_opts))
            .map(|s| s.name.as_str())
            .collect();
        if !unintercepted.is_empty() {
            log::warn!(
                "library '{}' contains data symbols which won't be intercepted: {}",
                options.input.display(),
                unintercepted.join(", ")
            );
        }

        let selection = filter::select_functions(&exported, options.symbol_list.as_deref());
        if selection.had_versioned_skips {
            log::warn!(
                "library '{}' contains versioned symbols which are NYI",
                options.input.display()
            );
        }
        if !selection.missing_user_symbols.is_empty() {
            log::warn!(
                "some user-specified functions are not present in library: {}",
                selection.missing_user_symbols.join(", ")
            );
        }
        if selection.names.is_empty() && !options.quiet {
            log::warn!(
                "no public functions were found in {}",
                options.input.display()
            );
        }
        log::debug!("exported functions: {:?}", selection.names);

        let target_name = target::normalize(&options.target);
        let target_dir = options.arch_dir.join(&target_name);
        if !target_dir.is_dir() {
            return Err(Error::config(format!(
                "unknown architecture '{}'",
                target_name
            )));
        }
        let arch_config = ArchConfig::load(&target_dir)?;

        let stem = stem_of(&options.input, kind);
        let load_name = match &options.library_load_name {
            Some(n) => n.clone(),
            None => match kind {
                InputKind::Elf => soname::read_elf_soname(&options.input)?.unwrap_or_else(|| stem.clone()),
                InputKind::MachO => stem.clone(),
                InputKind::Text => def_load_name.unwrap_or_else(|| stem.clone()),
            },
        };

        let suffix = options.suffix.clone().unwrap_or_else(|| stem.clone());
        let lib_suffix = emit::sanitize_c_ident(&suffix);

        std::fs::create_dir_all(&options.outdir).map_err(Error::io)?;

        let emit_opts = emit::EmitOptions {
            lib_suffix,
            load_name,
            dlopen_callback: options.dlopen_callback.clone(),
            dlsym_callback: options.dlsym_callback.clone(),
            no_dlopen: !options.dlopen,
            lazy_load: options.lazy_load,
            thread_safe: options.thread_safe,
            symbol_prefix: options.symbol_prefix.clone(),
        };

        let tramp_path = options.outdir.join(format!("{suffix}.tramp.S"));
        if !options.quiet {
            log::info!("generating {}", tramp_path.display());
        }
        let tramp_body = emit::render_tramp(&arch_config, &selection.names, &emit_opts)?;
        std::fs::write(&tramp_path, tramp_body).map_err(Error::io)?;

        let common_dir = options.arch_dir.join("common");
        let init_path = options.outdir.join(format!("{suffix}.init.c"));
        if !options.quiet {
            log::info!("generating {}", init_path.display());
        }
        let mut init_body = emit::render_init_c(&common_dir, &selection.names, &emit_opts)?;

        if options.vtables {
            init_body.push_str(&generate_vtable_section(
                &options.input,
                &exported,
                &arch_config,
            )?);
        }
        std::fs::write(&init_path, init_body).map_err(Error::io)?;

        Ok(GeneratedFiles {
            tramp_path,
            init_path,
            functions: selection.names,
        })
    }
}

/// Demangles every symbol's name in one batch, assigning the result back to
/// `demangled_name` in input order. A no-op on an empty symbol list.
fn demangle_in_place(syms: &mut [Symbol]) -> Result<()> {
    if syms.is_empty() {
        return Ok(());
    }
    let names: Vec<String> = syms.iter().map(|s| s.name.clone()).collect();
    let demangled = collect::demangle::demangle_all(&names)?;
    for (sym, name) in syms.iter_mut().zip(demangled) {
        sym.demangled_name = name;
    }
    Ok(())
}

/// The input's basename, with a trailing `.def` stripped for non-binary
/// inputs. Used as the fallback suffix, load name, and output stem.
fn stem_of(path: &Path, kind: InputKind) -> String {
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if kind == InputKind::Text {
        base.strip_suffix(".def").map(str::to_string).unwrap_or(base)
    } else {
        base
    }
}

/// Builds the class-symbol map, reads raw vtable bytes, overlays
/// relocations, and emits the vtable C translation unit (spec.md §4.6).
fn generate_vtable_section(
    input: &Path,
    exported: &[Symbol],
    arch_config: &ArchConfig,
) -> Result<String> {
    let mut class_syms: HashMap<String, Symbol> = HashMap::new();
    for sym in exported {
        if vtable::classify(&sym.demangled_name).is_some() {
            class_syms.insert(sym.name.clone(), sym.clone());
        }
    }
    let mut class_names: Vec<&String> = class_syms.keys().collect();
    class_names.sort();
    log::debug!("vtable classes: {:?}", class_names);

    let sections = collect::sections::collect(input, false)?;
    log::debug!(
        "allocatable sections: {:?}",
        sections.iter().map(|s| &s.name).collect::<Vec<_>>()
    );

    let relocs = collect::relocations::collect(input, false)?;
    log::debug!("dynamic relocations: {}", relocs.len());
    for rel in &relocs {
        log::trace!(
            "reloc offset={:#x} type={} target={}+{:#x}",
            rel.offset,
            rel.reloc_type,
            rel.target_symbol,
            rel.addend
        );
    }

    let class_sym_refs: Vec<&Symbol> = class_syms.values().collect();
    let raw_bytes = rawbytes::read_unrelocated(input, &class_sym_refs, &sections)?;

    let mut class_data: vtable::ClassData = vtable::ClassData::new();
    for (name, sym) in &class_syms {
        let bytes = &raw_bytes[name];
        let slots = vtable::interpret_slots(
            sym,
            bytes,
            arch_config.pointer_size,
            &relocs,
            &arch_config.symbol_reloc_types,
        );
        log::trace!("{name} slots: {:?}", slots);
        class_data.insert(name.clone(), slots);
    }

    Ok(vtable::generate_vtables(&class_syms, &class_data))
}

/// Parses a `--symbol-list` file: one name per line, `#` starts a trailing
/// comment, blank lines are skipped. Exposed so the CLI can read the file
/// itself and pass the parsed list through [`GeneratorOptions::symbol_list`].
pub fn parse_symbol_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| match line.find('#') {
            Some(i) => &line[..i],
            None => line,
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_strips_def_suffix_only_for_text() {
        assert_eq!(
            stem_of(Path::new("/x/libfoo.so.1"), InputKind::Elf),
            "libfoo.so.1"
        );
        assert_eq!(stem_of(Path::new("/x/foo.def"), InputKind::Text), "foo");
        assert_eq!(stem_of(Path::new("/x/foo"), InputKind::Text), "foo");
    }

    #[test]
    fn parse_symbol_list_strips_comments_and_blanks() {
        let content = "alpha\n# full comment\nbeta # trailing\n\n  gamma  \n";
        assert_eq!(
            parse_symbol_list(content),
            vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()]
        );
    }
}
