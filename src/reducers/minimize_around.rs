//! Surrounding-pair removal: `minimize-around`.

use super::{
    divide_rounding_up, next_round, next_surviving, prev_surviving, print_summary, quantity,
    ChunkPolicy, NextRound, Tag,
};
use crate::error;
use crate::harness::{Engine, SnapshotNaming};
use log::info;

/// Run `minimize-around` to completion.
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

/// Build `parts[..range.0] ++ parts[range.1..range.2] ++ parts[range.3..]`,
/// the shape every probe in this strategy takes (drop the `before` chunk and
/// the `after` chunk, keep everything in between and after).
fn candidate_dropping(
    parts: &[String],
    bef_start: usize,
    bef_end: usize,
    aft_start: usize,
    aft_end: usize,
) -> Vec<String> {
    let mut out = parts[..bef_start].to_vec();
    out.extend_from_slice(&parts[bef_end..aft_start]);
    out.extend_from_slice(&parts[aft_end..]);
    out
}

fn try_round(engine: &mut Engine, chunk_size: u64) -> error::Result<bool> {
    let cs = chunk_size as usize;
    let num_parts = engine.testcase().parts.len();
    let num_chunks = divide_rounding_up(num_parts as u64, chunk_size) as usize;

    if num_chunks < 3 {
        return Ok(false);
    }

    info!("starting a round with chunks of {}", quantity(chunk_size, "atom"));

    let mut tags = vec![Tag::Surviving; num_chunks];
    let mut chunks_removed = 0u64;
    let mut atoms_removed = 0u64;

    let mut chunk_start = cs;
    let mut before_idx = 0usize;
    let mut keep_idx = 1usize;
    let mut after_idx = 2usize;

    loop {
        if !(chunk_start + cs < engine.testcase().parts.len()) {
            break;
        }

        let parts_len = engine.testcase().parts.len();
        let bef_start = chunk_start.saturating_sub(cs);
        let bef_end = chunk_start;
        let aft_start = std::cmp::min(parts_len, chunk_start + cs);
        let aft_end = std::cmp::min(parts_len, aft_start + cs);

        let candidate =
            candidate_dropping(&engine.testcase().parts, bef_start, bef_end, aft_start, aft_end);

        if engine.probe(candidate)? {
            chunks_removed += 2;
            atoms_removed += (bef_end - bef_start) as u64;
            atoms_removed += (aft_end - aft_start) as u64;
            tags[before_idx] = Tag::Removed;
            tags[after_idx] = Tag::Removed;
            chunk_start = chunk_start.saturating_sub(cs);

            match prev_surviving(&tags, keep_idx) {
                Some(idx) => before_idx = idx,
                None => {
                    before_idx = keep_idx;
                    match next_surviving(&tags, keep_idx) {
                        Some(idx) => keep_idx = idx,
                        None => break,
                    }
                    chunk_start += cs;
                }
            }
        } else {
            before_idx = keep_idx;
            keep_idx = after_idx;
            chunk_start += cs;
        }

        match next_surviving(&tags, keep_idx) {
            Some(idx) => after_idx = idx,
            None => break,
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
