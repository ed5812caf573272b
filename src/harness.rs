//! Wiring a testcase, a workspace, and an oracle together into the probe
//! loop that every reduction strategy drives.

use crate::atoms::{Atom, Testcase};
use crate::error;
use crate::oracle::OracleAdapter;
use crate::workspace::Workspace;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Whether snapshots written to the workspace get a leading `N-` counter
/// prefix, or just their tag (`original.js` vs `4-interesting.js`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotNaming {
    /// No counter prefix — used for the initial, pre-reduction snapshot.
    Named,
    /// A counter prefix shared with the oracle's `tempPrefix` counter.
    Numbered,
}

/// Drives the testcase/oracle probe loop that every strategy is built on
/// top of: propose a candidate, ask the oracle, keep it or roll back.
pub struct Engine<'a> {
    testcase_path: PathBuf,
    testcase: Testcase,
    workspace: Workspace,
    oracle: &'a mut dyn OracleAdapter,
    oracle_args: Vec<String>,
    interesting_count: u64,
    total_probes: u64,
    total_atoms_tested: u64,
}

impl<'a> Engine<'a> {
    /// Build an engine around an already-loaded testcase.
    pub fn new(
        testcase_path: PathBuf,
        testcase: Testcase,
        workspace: Workspace,
        oracle: &'a mut dyn OracleAdapter,
        oracle_args: Vec<String>,
    ) -> Engine<'a> {
        Engine {
            testcase_path,
            testcase,
            workspace,
            oracle,
            oracle_args,
            interesting_count: 0,
            total_probes: 0,
            total_atoms_tested: 0,
        }
    }

    /// The current, most-reduced testcase.
    pub fn testcase(&self) -> &Testcase {
        &self.testcase
    }

    /// The path the testcase file lives at, and is rewritten at on every
    /// probe.
    pub fn testcase_path(&self) -> &Path {
        &self.testcase_path
    }

    /// How many probes have returned "interesting" so far.
    pub fn interesting_count(&self) -> u64 {
        self.interesting_count
    }

    /// How many probes have been run in total.
    pub fn total_probes(&self) -> u64 {
        self.total_probes
    }

    /// The sum of `|parts|` over every probe run so far (the oracle record's
    /// `testTotal`).
    pub fn total_atoms_tested(&self) -> u64 {
        self.total_atoms_tested
    }

    /// Propose `candidate` as the new set of reducible atoms: write it to
    /// the testcase file, run the oracle, and keep the change if and only
    /// if the oracle finds it interesting. Returns whether the candidate
    /// was kept.
    pub fn probe(&mut self, candidate: Vec<Atom>) -> error::Result<bool> {
        let saved = std::mem::replace(&mut self.testcase.parts, candidate);

        self.testcase.write(&self.testcase_path)?;
        self.total_probes += 1;
        self.total_atoms_tested += self.testcase.parts.len() as u64;

        let n = self.workspace.next_count();
        let temp_prefix = self.workspace.temp_prefix(n);
        let interesting = self.oracle.interesting(&self.oracle_args, &temp_prefix)?;

        let tag = if interesting { "interesting" } else { "boring" };
        let snapshot_path = self
            .workspace
            .numbered_snapshot_path(n, tag, &self.testcase.extension);
        self.testcase.write(&snapshot_path)?;

        if interesting {
            self.interesting_count += 1;
            debug!(
                "probe #{} interesting ({} atoms)",
                self.total_probes,
                self.testcase.parts.len()
            );
        } else {
            debug!(
                "probe #{} boring, rolling back to {} atoms",
                self.total_probes,
                saved.len()
            );
            self.testcase.parts = saved;
            self.testcase.write(&self.testcase_path)?;
        }

        Ok(interesting)
    }

    /// Confirm the unreduced testcase is itself interesting, failing loudly
    /// if it isn't — there is nothing to reduce from a testcase that
    /// doesn't reproduce.
    pub fn confirm_initially_interesting(&mut self) -> error::Result<bool> {
        let parts = self.testcase.parts.clone();
        self.probe(parts)
    }

    /// Write a copy of the current testcase into the workspace under `tag`,
    /// for the user to inspect later.
    pub fn snapshot(&self, tag: &str, naming: SnapshotNaming) -> error::Result<PathBuf> {
        let path = match naming {
            SnapshotNaming::Named => self
                .workspace
                .named_snapshot_path(tag, &self.testcase.extension),
            SnapshotNaming::Numbered => {
                let n = self.workspace.next_count();
                self.workspace
                    .numbered_snapshot_path(n, tag, &self.testcase.extension)
            }
        };
        self.testcase.write(&path)?;
        info!("wrote {} ({} atoms)", path.display(), self.testcase.parts.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysInteresting;

    impl OracleAdapter for AlwaysInteresting {
        fn init(&mut self, _extra_args: &[String]) -> error::Result<()> {
            Ok(())
        }

        fn interesting(&mut self, _extra_args: &[String], _temp_prefix: &Path) -> error::Result<bool> {
            Ok(true)
        }
    }

    fn make_engine<'a>(
        dir: &Path,
        parts: Vec<Atom>,
        oracle: &'a mut dyn OracleAdapter,
    ) -> Engine<'a> {
        let testcase_path = dir.join("case.js");
        let testcase = Testcase {
            before: String::new(),
            parts,
            after: String::new(),
            extension: ".js".to_string(),
        };
        let workspace = Workspace::at(dir.join("workspace")).unwrap();
        Engine::new(testcase_path, testcase, workspace, oracle, vec![])
    }

    #[test]
    fn probe_keeps_candidate_when_interesting() {
        let dir = tempfile::tempdir().unwrap();
        let mut oracle = AlwaysInteresting;
        let mut engine = make_engine(
            dir.path(),
            vec!["a".into(), "b".into(), "c".into()],
            &mut oracle,
        );
        let kept = engine.probe(vec!["a".into()]).unwrap();
        assert!(kept);
        assert_eq!(engine.testcase().parts, vec!["a".to_string()]);
        assert_eq!(engine.total_probes(), 1);
        assert_eq!(engine.interesting_count(), 1);
    }

    struct NeverInteresting;
    impl OracleAdapter for NeverInteresting {
        fn init(&mut self, _extra_args: &[String]) -> error::Result<()> {
            Ok(())
        }
        fn interesting(&mut self, _extra_args: &[String], _temp_prefix: &Path) -> error::Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn probe_rolls_back_when_boring() {
        let dir = tempfile::tempdir().unwrap();
        let mut oracle = NeverInteresting;
        let mut engine = make_engine(
            dir.path(),
            vec!["a".into(), "b".into(), "c".into()],
            &mut oracle,
        );
        let kept = engine.probe(vec!["a".into()]).unwrap();
        assert!(!kept);
        assert_eq!(
            engine.testcase().parts,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert_eq!(engine.total_probes(), 1);
        assert_eq!(engine.interesting_count(), 0);
    }

    #[test]
    fn snapshot_numbered_vs_named() {
        let dir = tempfile::tempdir().unwrap();
        let mut oracle = NeverInteresting;
        let mut engine = make_engine(dir.path(), vec!["a".into()], &mut oracle);
        let named = engine.snapshot("original", SnapshotNaming::Named).unwrap();
        assert_eq!(named.file_name().unwrap(), "original.js");

        let numbered = engine
            .snapshot("interesting", SnapshotNaming::Numbered)
            .unwrap();
        assert_eq!(numbered.file_name().unwrap(), "1-interesting.js");
    }

    #[test]
    fn confirm_initially_interesting_round_trips_parts() {
        let dir = tempfile::tempdir().unwrap();
        let mut oracle = AlwaysInteresting;
        let mut engine = make_engine(dir.path(), vec!["a".into(), "b".into()], &mut oracle);
        assert!(engine.confirm_initially_interesting().unwrap());
        assert_eq!(
            engine.testcase().parts,
            vec!["a".to_string(), "b".to_string()]
        );
    }
}
