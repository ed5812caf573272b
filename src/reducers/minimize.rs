//! Geometric chunked removal: the baseline `minimize` strategy.

use super::{divide_rounding_up, next_round, print_summary, quantity, ChunkPolicy, NextRound};
use crate::error;
use crate::harness::{Engine, SnapshotNaming};
use log::info;

/// Run `minimize` to completion: repeatedly remove non-overlapping windows
/// of atoms, starting at the largest chunk size and halving down to
/// `policy.final_chunk_size()`.
pub fn run(engine: &mut Engine, policy: &ChunkPolicy) -> error::Result<()> {
    let orig_num_parts = engine.testcase().parts.len();
    let mut chunk_size = policy.initial_chunk_size(orig_num_parts);

    loop {
        let any_removed = try_round(engine, chunk_size)?;

        match next_round(policy, chunk_size, any_removed) {
            NextRound::Repeat => {}
            NextRound::Stop => break,
            NextRound::Halve => chunk_size = std::cmp::max(chunk_size / 2, 1),
        }
    }

    print_summary(
        engine,
        orig_num_parts,
        chunk_size == policy.final_chunk_size() && policy.repeat != super::Repeat::Never,
    );
    Ok(())
}

/// A single left-to-right pass at a fixed `chunk_size`. Returns whether any
/// chunk was removed.
fn try_round(engine: &mut Engine, chunk_size: u64) -> error::Result<bool> {
    let chunk_size = chunk_size as usize;
    let mut chunks_so_far = 0u64;
    let mut chunks_removed = 0u64;
    let mut chunks_surviving = 0u64;
    let mut atoms_removed = 0u64;
    let mut summary = String::new();

    let num_chunks = divide_rounding_up(engine.testcase().parts.len() as u64, chunk_size as u64);
    info!(
        "starting a round with chunks of {} ({} chunks)",
        quantity(chunk_size as u64, "atom"),
        num_chunks
    );

    let mut chunk_start = 0usize;

    while chunk_start < engine.testcase().parts.len() {
        chunks_so_far += 1;
        let parts_len = engine.testcase().parts.len();
        let chunk_end = std::cmp::min(parts_len, chunk_start + chunk_size);

        let mut candidate = engine.testcase().parts[..chunk_start].to_vec();
        candidate.extend_from_slice(&engine.testcase().parts[chunk_end..]);

        if engine.probe(candidate)? {
            chunks_removed += 1;
            atoms_removed += (chunk_end - chunk_start) as u64;
            summary.push('-');
            // chunk_start stays the same: what followed has slid down into it.
        } else {
            chunks_surviving += 1;
            summary.push('S');
            chunk_start += chunk_size;
        }

        if chunks_so_far % 2 == 0 {
            summary.push(' ');
        }
    }

    info!(
        "round of chunk size {} done: {} survived, {} removed ({} atoms removed)",
        chunk_size, chunks_surviving, chunks_removed, atoms_removed
    );
    info!("which chunks survived: {}", summary);

    engine.snapshot(&format!("did-round-{}", chunk_size), SnapshotNaming::Numbered)?;

    Ok(chunks_removed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::Testcase;
    use crate::error::Result;
    use crate::oracle::OracleAdapter;
    use crate::workspace::Workspace;
    use std::path::{Path, PathBuf};

    /// An oracle whose verdict is "the on-disk testcase contains `needle`".
    struct ContainsSubstring {
        testcase_path: PathBuf,
        needle: String,
    }

    impl OracleAdapter for ContainsSubstring {
        fn init(&mut self, _extra_args: &[String]) -> Result<()> {
            Ok(())
        }
        fn interesting(&mut self, _extra_args: &[String], _temp_prefix: &Path) -> Result<bool> {
            let contents = std::fs::read_to_string(&self.testcase_path).unwrap();
            Ok(contents.contains(&self.needle))
        }
    }

    #[test]
    fn minimizes_to_the_single_atom_containing_the_needle() {
        let dir = tempfile::tempdir().unwrap();
        let testcase_path = dir.path().join("case.txt");
        let mut oracle = ContainsSubstring {
            testcase_path: testcase_path.clone(),
            needle: "X".to_string(),
        };

        let testcase = Testcase {
            before: String::new(),
            parts: vec!["A\n".into(), "B\n".into(), "X\n".into(), "C\n".into(), "D\n".into()],
            after: String::new(),
            extension: String::new(),
        };
        let workspace = Workspace::at(dir.path().join("ws")).unwrap();
        let mut engine = Engine::new(testcase_path, testcase, workspace, &mut oracle, vec![]);

        let policy = ChunkPolicy {
            max_chunk: 64,
            min_chunk: 1,
            repeat: super::super::Repeat::Last,
        };

        run(&mut engine, &policy).unwrap();
        assert_eq!(engine.testcase().parts, vec!["X\n".to_string()]);
    }

    #[test]
    fn single_atom_round_makes_at_most_one_probe() {
        let dir = tempfile::tempdir().unwrap();
        let testcase_path = dir.path().join("case.txt");
        let mut oracle = ContainsSubstring {
            testcase_path: testcase_path.clone(),
            needle: "X".to_string(),
        };

        let testcase = Testcase {
            before: String::new(),
            parts: vec!["X".into()],
            after: String::new(),
            extension: String::new(),
        };
        let workspace = Workspace::at(dir.path().join("ws")).unwrap();
        let mut engine = Engine::new(testcase_path, testcase, workspace, &mut oracle, vec![]);

        let removed = try_round(&mut engine, 1).unwrap();
        assert!(!removed);
        assert_eq!(engine.total_probes(), 1);
    }
}
