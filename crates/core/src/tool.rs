//! Single chokepoint for invoking external tools.
//!
//! Every collector in this crate goes through [`run`] rather than calling
//! `std::process::Command` directly, so the locale pinning and the
//! "any stderr output is fatal" policy (spec §5/§9) only need to be
//! implemented once.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Runs `program` with `args`, feeding it `stdin`, and returns its captured
/// standard output as a UTF-8 string.
///
/// The child's environment is forced to the C locale (`LC_ALL=c`, `LANG`
/// removed) because every parser downstream depends on English headers and
/// messages. A non-zero exit code or any output on standard error is treated
/// as a fatal tool error, matching the source tool's `run()` helper.
pub fn run(program: &str, args: &[&str], stdin: &str) -> Result<String> {
    log::trace!("running {program} {args:?}");

    let mut child = Command::new(program)
        .args(args)
        .env("LC_ALL", "c")
        .env_remove("LANG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::tool(format!("failed to run {program}: {e}")))?;

    if !stdin.is_empty() {
        let mut pipe = child.stdin.take().expect("stdin was piped");
        pipe.write_all(stdin.as_bytes())
            .map_err(|e| Error::tool(format!("failed to write to {program}'s stdin: {e}")))?;
    }
    drop(child.stdin.take());

    let output = child
        .wait_with_output()
        .map_err(|e| Error::tool(format!("failed to wait for {program}: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() || !stderr.is_empty() {
        return Err(Error::tool(format!(
            "{program} failed with status {}:\n{stderr}",
            output.status
        )));
    }

    Ok(stdout)
}

/// Runs `program` with `args` purely to probe success/failure, discarding
/// all output. Used by the binary prober, which only cares about the exit
/// code of `readelf -d`.
pub fn probe(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .env("LC_ALL", "c")
        .env_remove("LANG")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Runs `program` with `args`, returning its stdout regardless of exit code
/// or stderr content. Used by the Mach-O-detecting `file` probe, which is
/// best-effort and should never itself be fatal.
pub fn run_lossy(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .env("LC_ALL", "c")
        .env_remove("LANG")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}
