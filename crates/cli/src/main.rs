use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use implib_gen_core::{parse_symbol_list, Generator, GeneratorOptions};

const PROGRAM: &str = "implib-gen";

/// Generate wrappers for shared library functions.
#[derive(Parser, Debug)]
#[command(name = "implib-gen", version, about, long_about = None)]
struct Cli {
    /// Library to be wrapped (or .def file with list of functions).
    #[arg(value_name = "LIB")]
    library: PathBuf,

    /// Print diagnostic info. Repeat for more detail (-vv).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Do not emit a dlopen call (the caller must load/unload the library).
    #[arg(long)]
    no_dlopen: bool,

    /// Call a user-provided function to load the library instead of dlopen.
    #[arg(long, value_name = "NAME", default_value = "")]
    dlopen_callback: String,

    /// Call a user-provided function to resolve a symbol instead of dlsym.
    #[arg(long, value_name = "NAME", default_value = "")]
    dlsym_callback: String,

    /// Use a custom name for the dlopened library (default is the SONAME).
    #[arg(long, value_name = "NAME")]
    library_load_name: Option<String>,

    /// Load the library at program start rather than on first call.
    #[arg(long)]
    no_lazy_load: bool,

    /// Do not ensure thread-safety around one-time resolution.
    #[arg(long)]
    no_thread_safe: bool,

    /// Intercept virtual tables (EXPERIMENTAL).
    #[arg(long)]
    vtables: bool,

    /// Don't bind weak symbols.
    #[arg(long)]
    no_weak_symbols: bool,

    /// Target platform triple, e.g. x86_64-unknown-linux-gnu or arm-none-eabi.
    #[arg(long, default_value = std::env::consts::ARCH)]
    target: String,

    /// Path to file with symbols that should be present in the wrapper
    /// (all exported functions by default).
    #[arg(long, value_name = "PATH")]
    symbol_list: Option<PathBuf>,

    /// Prefix wrapper symbols with PFX.
    #[arg(long, value_name = "PFX", default_value = "")]
    symbol_prefix: String,

    /// Do not print progress info.
    #[arg(short, long)]
    quiet: bool,

    /// Path to create the wrapper at.
    #[arg(short, long, default_value = "./")]
    outdir: PathBuf,

    /// Specify a custom suffix for output files.
    #[arg(long)]
    suffix: Option<String>,

    /// Directory holding per-architecture `config.ini`/template subdirectories
    /// and a `common/init.c.tpl`.
    #[arg(
        long,
        value_name = "DIR",
        default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/../../arch")
    )]
    arch_dir: PathBuf,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{PROGRAM}: error: {}", e.root_cause());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::builder()
        .format(|buf, record| {
            let level = match record.level() {
                log::Level::Error => "error",
                log::Level::Warn => "warning",
                log::Level::Info => "info",
                log::Level::Debug => "debug",
                log::Level::Trace => "trace",
            };
            writeln!(buf, "{PROGRAM}: {level}: {}", record.args())
        })
        .filter_module("implib_gen_core", level)
        .init();

    let symbol_list = cli
        .symbol_list
        .as_ref()
        .map(|path| -> Result<Vec<String>> {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read symbol list '{}'", path.display()))?;
            Ok(parse_symbol_list(&content))
        })
        .transpose()?;

    let mut options = GeneratorOptions::new(cli.library.clone(), cli.arch_dir, cli.outdir);
    options.target = cli.target;
    options.suffix = cli.suffix;
    options.dlopen = !cli.no_dlopen;
    options.dlopen_callback = cli.dlopen_callback;
    options.dlsym_callback = cli.dlsym_callback;
    options.library_load_name = cli.library_load_name;
    options.lazy_load = !cli.no_lazy_load;
    options.thread_safe = !cli.no_thread_safe;
    options.vtables = cli.vtables;
    options.no_weak_symbols = cli.no_weak_symbols;
    options.symbol_list = symbol_list;
    options.symbol_prefix = cli.symbol_prefix;
    options.quiet = cli.quiet;

    let generated = Generator
        .generate(&options)
        .with_context(|| format!("failed to generate wrapper for '{}'", cli.library.display()))?;

    if !cli.quiet {
        println!("generated {}", generated.tramp_path.display());
        println!("generated {}", generated.init_path.display());
    }

    Ok(())
}
