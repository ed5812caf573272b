//! Balanced-bracket pair removal: `minimize-balanced`.
//!
//! Curly/square/paren imbalance is tracked per chunk so that a chunk (or a
//! pair of chunks) is only ever proposed for removal once their combined
//! brackets net to zero.

use super::{
    divide_rounding_up, next_round, next_surviving, print_summary, quantity, ChunkPolicy,
    NextRound, Tag,
};
use crate::error;
use crate::harness::{Engine, SnapshotNaming};
use log::info;

/// Run `minimize-balanced` to completion.
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

    print_summary(engine, orig_num_parts, false);
    Ok(())
}

/// Net `open - close` bracket count for one bracket kind within `atom`.
fn imbalance(atom: &str, open: char, close: char) -> i64 {
    atom.chars().filter(|c| *c == open).count() as i64
        - atom.chars().filter(|c| *c == close).count() as i64
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Imbalance {
    curly: i64,
    square: i64,
    normal: i64,
}

impl Imbalance {
    fn of(atom: &str) -> Imbalance {
        Imbalance {
            curly: imbalance(atom, '{', '}'),
            square: imbalance(atom, '[', ']'),
            normal: imbalance(atom, '(', ')'),
        }
    }

    fn is_zero(&self) -> bool {
        self.curly == 0 && self.square == 0 && self.normal == 0
    }

    fn is_negative(&self) -> bool {
        self.curly < 0 || self.square < 0 || self.normal < 0
    }

    fn add(&self, other: &Imbalance) -> Imbalance {
        Imbalance {
            curly: self.curly + other.curly,
            square: self.square + other.square,
            normal: self.normal + other.normal,
        }
    }
}

/// Chunk an atom sequence into `cs`-sized groups (the last possibly
/// shorter), matching the bounds the outer loop indexes with.
fn chunk_bounds(num_parts: usize, cs: usize, idx: usize) -> (usize, usize) {
    let start = idx * cs;
    let end = std::cmp::min(num_parts, start + cs);
    (start, end)
}

fn try_round(engine: &mut Engine, chunk_size: u64) -> error::Result<bool> {
    let cs = chunk_size as usize;
    let num_parts = engine.testcase().parts.len();
    let num_chunks = divide_rounding_up(num_parts as u64, chunk_size) as usize;

    if num_chunks < 2 {
        return Ok(false);
    }

    info!("starting a round with chunks of {}", quantity(chunk_size, "atom"));

    let imbalances: Vec<Imbalance> = (0..num_chunks)
        .map(|i| {
            let (start, end) = chunk_bounds(num_parts, cs, i);
            let mut acc = Imbalance::default();
            for atom in &engine.testcase().parts[start..end] {
                acc = acc.add(&Imbalance::of(atom));
            }
            acc
        })
        .collect();

    let mut tags = vec![Tag::Surviving; num_chunks];
    let mut chunks_removed = 0u64;
    let mut atoms_removed = 0u64;

    let mut lhs_idx = 0usize;
    let mut chunk_start = 0usize;

    loop {
        if chunk_start >= engine.testcase().parts.len() {
            break;
        }

        let parts_len = engine.testcase().parts.len();
        let (lhs_start, lhs_end) = {
            let start = chunk_start;
            let end = std::cmp::min(parts_len, start + cs);
            (start, end)
        };

        if imbalances[lhs_idx].is_zero() {
            let candidate = {
                let mut v = engine.testcase().parts[..lhs_start].to_vec();
                v.extend_from_slice(&engine.testcase().parts[lhs_end..]);
                v
            };
            if engine.probe(candidate)? {
                chunks_removed += 1;
                atoms_removed += (lhs_end - lhs_start) as u64;
                tags[lhs_idx] = Tag::Removed;
            } else {
                chunk_start += cs;
            }
            match next_surviving(&tags, lhs_idx) {
                Some(idx) => lhs_idx = idx,
                None => break,
            }
            continue;
        }

        // Accumulate imbalances of successive surviving chunks until they
        // cancel out (a candidate pair) or go negative (no match).
        let mut acc = imbalances[lhs_idx];
        let mut rhs_idx = lhs_idx;
        let mut found = false;
        loop {
            match next_surviving(&tags, rhs_idx) {
                Some(idx) => rhs_idx = idx,
                None => break,
            }
            acc = acc.add(&imbalances[rhs_idx]);
            if acc.is_negative() {
                break;
            }
            if acc.is_zero() {
                found = true;
                break;
            }
        }

        if !found {
            chunk_start += cs;
            match next_surviving(&tags, lhs_idx) {
                Some(idx) => lhs_idx = idx,
                None => break,
            }
            continue;
        }

        let surviving_between = tags[lhs_idx..rhs_idx]
            .iter()
            .filter(|t| **t == Tag::Surviving)
            .count();
        let rhs_start = std::cmp::min(parts_len, lhs_start + cs * surviving_between);
        let rhs_end = std::cmp::min(parts_len, rhs_start + cs);

        let candidate = {
            let mut v = engine.testcase().parts[..lhs_start].to_vec();
            v.extend_from_slice(&engine.testcase().parts[lhs_end..rhs_start]);
            v.extend_from_slice(&engine.testcase().parts[rhs_end..]);
            v
        };

        if engine.probe(candidate)? {
            chunks_removed += 2;
            atoms_removed += (lhs_end - lhs_start) as u64;
            atoms_removed += (rhs_end - rhs_start) as u64;
            tags[lhs_idx] = Tag::Removed;
            tags[rhs_idx] = Tag::Removed;
            match next_surviving(&tags, lhs_idx) {
                Some(idx) => lhs_idx = idx,
                None => break,
            }
        } else {
            // Dropping `lhs`/`rhs` makes the file uninteresting. The
            // original tool then tried relocating the chunks strictly
            // between them to either side of the pair, guarded by a
            // condition that was always true in the source — making that
            // relocation logic unreachable. We omit it rather than ship
            // untested behavior and just move past this pair.
            chunk_start += cs;
            match next_surviving(&tags, lhs_idx) {
                Some(idx) => lhs_idx = idx,
                None => break,
            }
        }
    }

    let surviving = tags.iter().filter(|t| **t == Tag::Surviving).count();
    let removed = tags.iter().filter(|t| **t == Tag::Removed).count();
    info!(
        "round of chunk size {} done: {} chunks survived, {} removed ({} atoms removed)",
        cs, surviving, removed, atoms_removed
    );

    engine.snapshot(&format!("did-round-{}", cs), SnapshotNaming::Numbered)?;

    Ok(chunks_removed > 0)
}
