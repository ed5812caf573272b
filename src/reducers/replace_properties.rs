//! Per-identifier property-to-global rewriting: `replace-properties-by-globals`.

use super::{next_round, quantity, ChunkPolicy, NextRound};
use crate::error;
use crate::harness::{Engine, SnapshotNaming};
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    /// Matches `.identifier`; callers must additionally check that the
    /// preceding character is a word character or digit, since the `regex`
    /// crate has no lookbehind assertion to express that inline.
    static ref PROPERTY_ACCESS: Regex = Regex::new(r"\.(\w+)").unwrap();

}

/// Run `replace-properties-by-globals` to completion.
pub fn run(engine: &mut Engine, policy: &ChunkPolicy) -> error::Result<()> {
    let orig_num_chars: usize = engine.testcase().parts.iter().map(|p| p.len()).sum();
    let mut num_chars = orig_num_chars;
    let orig_num_parts = engine.testcase().parts.len();
    let mut chunk_size = std::cmp::min(
        policy.max_chunk,
        2 * super::largest_pow2_smaller_than(orig_num_parts as u64),
    );

    let final_chunk_size = policy.final_chunk_size();

    loop {
        let removed = try_round(engine, chunk_size, final_chunk_size)?;
        num_chars -= removed;

        match next_round(policy, chunk_size, removed > 0) {
            NextRound::Repeat => {}
            NextRound::Stop => break,
            NextRound::Halve => chunk_size = std::cmp::max(chunk_size / 2, 1),
        }
    }

    println!("Lithium is done!");
    println!("  Initial size: {}", quantity(orig_num_chars as u64, "character"));
    println!("  Final size: {}", quantity(num_chars as u64, "character"));
    println!("  Tests performed: {}", engine.total_probes());
    println!("  Test total: {}", quantity(engine.total_atoms_tested(), "atom"));
    Ok(())
}

/// The word captured by a `.word` match in `line`, skipped unless the
/// character before the `.` is a word character or digit (the lookbehind
/// the original regex relies on).
fn property_accesses(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut words = Vec::new();
    for m in PROPERTY_ACCESS.find_iter(line) {
        let byte_start = m.start();
        let char_idx = line[..byte_start].chars().count();
        if char_idx == 0 {
            continue;
        }
        let prev = chars[char_idx - 1];
        if prev.is_alphanumeric() || prev == '_' {
            words.push(m.as_str()[1..].to_string());
        }
    }
    words
}

/// Replace every occurrence of `[\w_.]+\.word` in `line` with `word` alone.
fn collapse_prefixes(line: &str, word: &str) -> String {
    let pattern = format!(r"[\w_.]+\.{}", regex::escape(word));
    let re = Regex::new(&pattern).unwrap();
    re.replace_all(line, word).into_owned()
}

fn try_round(engine: &mut Engine, chunk_size: u64, final_chunk_size: u64) -> error::Result<usize> {
    let cs = chunk_size as usize;
    let num_chunks = super::divide_rounding_up(engine.testcase().parts.len() as u64, chunk_size) as usize;

    // word -> sorted chunk indexes where it occurs.
    let mut words: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (chunk, line) in engine.testcase().parts.iter().enumerate() {
        for word in property_accesses(line) {
            words.entry(word).or_default().push(chunk);
        }
    }

    if words.is_empty() {
        return Ok(0);
    }

    info!("starting a round with chunks of {}", quantity(chunk_size, "atom"));

    let mut num_removed_chars = 0usize;

    for (word, chunks) in words {
        // Group the chunk indexes this word occurs in by the coarser
        // `chunk_size`-sized group they fall into.
        let mut by_group: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &chunk in &chunks {
            by_group.entry(chunk / cs).or_default().push(chunk);
        }

        for (_group, chunk_idxs) in by_group {
            if chunk_idxs.len() == 1 && final_chunk_size != chunk_size {
                continue;
            }

            let mut candidate = engine.testcase().parts.clone();
            let mut maybe_removed = 0usize;
            for &chunk in &chunk_idxs {
                let rewritten = collapse_prefixes(&candidate[chunk], &word);
                maybe_removed += candidate[chunk].len().saturating_sub(rewritten.len());
                candidate[chunk] = rewritten;
            }

            if engine.probe(candidate)? {
                num_removed_chars += maybe_removed;
            }
        }
    }

    info!("round of chunk size {} done: {} chunks", cs, num_chunks);

    engine.snapshot(&format!("did-round-{}", cs), SnapshotNaming::Numbered)?;

    Ok(num_removed_chars)
}
