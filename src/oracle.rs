//! Oracle adapters: the external judge that decides whether a candidate
//! testcase is still "interesting".

use crate::error::{self, Error};
use is_executable::IsExecutable;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Anything that can decide whether the current testcase is interesting.
///
/// This is the Rust-side replacement for the original tool's dynamically
/// loaded Python module: rather than importing a `.py` file and calling
/// `hasattr` on it, an `OracleAdapter` is a small trait with a subprocess
/// backed implementation (`ScriptOracle`). Anything else that can answer the
/// same question — an in-process closure in tests, say — can implement the
/// trait directly.
pub trait OracleAdapter {
    /// Run once, before the first probe. Adapters that have no setup to do
    /// are free to make this a no-op.
    fn init(&mut self, extra_args: &[String]) -> error::Result<()>;

    /// Decide whether the testcase currently written under `temp_prefix` is
    /// interesting. `extra_args` are the oracle-specific arguments from the
    /// command line, passed through unchanged.
    fn interesting(&mut self, extra_args: &[String], temp_prefix: &Path) -> error::Result<bool>;
}

/// An oracle backed by an external program, invoked as a subprocess.
///
/// Calling convention, matching the original `interesting.py` contract:
/// the program is invoked as `program extra_args... temp_prefix`, where
/// `temp_prefix` is a path prefix the oracle may use for its own scratch
/// files. Exit code `0` means interesting; anything else means boring.
#[derive(Clone, Debug)]
pub struct ScriptOracle {
    program: PathBuf,
}

impl ScriptOracle {
    /// Build an adapter around `program`, which must exist and be
    /// executable.
    pub fn new(program: PathBuf) -> error::Result<ScriptOracle> {
        if !program.is_executable() {
            return Err(Error::OracleFault(format!(
                "{} is not executable",
                program.display()
            )));
        }
        Ok(ScriptOracle { program })
    }
}

/// Resolve an oracle given by path or bare name, mirroring the original
/// tool's module loader: a name containing a path separator is used as-is
/// (relative to the current directory); a bare name is looked up on `PATH`,
/// the way a shell would find a script to exec.
pub fn resolve_program(name: &str) -> PathBuf {
    let path = Path::new(name);
    if name.contains(std::path::MAIN_SEPARATOR) || path.is_absolute() {
        return path.to_path_buf();
    }

    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(name);
            if candidate.is_executable() {
                return candidate;
            }
        }
    }

    path.to_path_buf()
}

impl OracleAdapter for ScriptOracle {
    fn init(&mut self, extra_args: &[String]) -> error::Result<()> {
        // The original Python loader called an optional `init` function if
        // the module happened to define one. A subprocess can't be
        // introspected the same way, so instead we make a best-effort call
        // with a sentinel flag and silently treat failure as "this oracle
        // doesn't have an init hook."
        let status = Command::new(&self.program)
            .arg("--lithium-init")
            .args(extra_args)
            .status();

        match status {
            Ok(s) if s.success() => Ok(()),
            _ => Ok(()),
        }
    }

    fn interesting(&mut self, extra_args: &[String], temp_prefix: &Path) -> error::Result<bool> {
        let output = Command::new(&self.program)
            .args(extra_args)
            .arg(temp_prefix)
            .status()
            .map_err(|e| {
                Error::OracleFault(format!(
                    "failed to run oracle {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        Ok(output.success())
    }
}
