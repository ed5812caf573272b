//! Scratch directories for oracle probes and saved reduction snapshots.

use crate::error::{self, Error};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// A `tmpN`-style scratch directory, plus a counter used both for the
/// oracle's `tempPrefix` and for numbered snapshot files.
#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
    counter: AtomicU64,
}

impl Workspace {
    /// Create a fresh scratch directory under `parent`, named `tmp1`,
    /// `tmp2`, ... — the first integer not already in use.
    ///
    /// Probing is race-tolerant: if another process wins the race to create
    /// a given `tmpN`, we just try the next one, the same way the original
    /// tool did when several reducers shared a working directory.
    pub fn create(parent: &Path) -> error::Result<Workspace> {
        const MAX_ATTEMPTS: u64 = 1_000_000;
        for n in 1..=MAX_ATTEMPTS {
            let candidate = parent.join(format!("tmp{}", n));
            match fs::create_dir(&candidate) {
                Ok(()) => {
                    return Ok(Workspace {
                        dir: candidate,
                        counter: AtomicU64::new(0),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Err(Error::WorkspaceBusy(format!(
            "could not find a free tmpN directory under {} after {} attempts",
            parent.display(),
            MAX_ATTEMPTS
        )))
    }

    /// Use an existing directory as the workspace, without probing for a
    /// free name. Used when the caller has already picked a location.
    pub fn at(dir: PathBuf) -> error::Result<Workspace> {
        fs::create_dir_all(&dir)?;
        Ok(Workspace {
            dir,
            counter: AtomicU64::new(0),
        })
    }

    /// The workspace directory's path.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Bump the shared counter and return the new value. Shared by the
    /// oracle's `tempPrefix` and every numbered snapshot, so that a single
    /// probe's scratch files and its `N-interesting`/`N-boring` snapshot
    /// carry the same `N`.
    pub fn next_count(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The `tempPrefix` to hand to the oracle for the probe numbered `n`: the
    /// workspace directory joined with the counter, as a bare path segment
    /// the oracle may append its own scratch suffixes to.
    pub fn temp_prefix(&self, n: u64) -> PathBuf {
        self.dir.join(n.to_string())
    }

    /// The path a numbered snapshot with the given counter, `tag`, and
    /// `extension` should be written to, e.g. `4-interesting.js`.
    pub fn numbered_snapshot_path(&self, n: u64, tag: &str, extension: &str) -> PathBuf {
        self.dir.join(format!("{}-{}{}", n, tag, extension))
    }

    /// The path an un-numbered snapshot with the given `tag` should be
    /// written to, e.g. `original.js`.
    pub fn named_snapshot_path(&self, tag: &str, extension: &str) -> PathBuf {
        self.dir.join(format!("{}{}", tag, extension))
    }
}
