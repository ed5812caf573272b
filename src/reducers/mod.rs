//! Reduction strategies: the algorithms that drive [`crate::harness::Engine`]
//! toward a smaller interesting testcase.

pub mod aux;
pub mod minimize;
pub mod minimize_around;
pub mod minimize_balanced;
pub mod replace_arguments;
pub mod replace_properties;

use crate::error;
use crate::harness::Engine;

/// When to repeat a round at the same chunk size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Repeat {
    /// Keep going at the same size as long as a round makes progress.
    Always,
    /// Only repeat once `chunkSize` has reached `finalChunkSize`.
    Last,
    /// Never repeat; always halve after a round, win or lose.
    Never,
}

impl std::str::FromStr for Repeat {
    type Err = error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(Repeat::Always),
            "last" => Ok(Repeat::Last),
            "never" => Ok(Repeat::Never),
            other => Err(error::Error::Usage(format!(
                "unknown --repeat value '{}', expected always, last, or never",
                other
            ))),
        }
    }
}

/// Which reduction strategy to run, selected by `--strategy`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Geometric chunked removal (§4.5.1). The default.
    Minimize,
    /// Surrounding-pair removal (§4.5.2).
    MinimizeAround,
    /// Balanced-bracket pair removal (§4.5.3).
    MinimizeBalanced,
    /// Per-identifier property-to-global rewriting (§4.5.4).
    ReplacePropertiesByGlobals,
    /// Function-argument-to-global rewriting (§4.5.5).
    ReplaceArgumentsByGlobals,
    /// Exhaustive pair removal (§4.5.6).
    RemovePair,
    /// One pass of adjacent-pair removal (§4.5.6).
    RemoveAdjacentPairs,
    /// Exhaustive contiguous-substring removal (§4.5.6).
    RemoveSubstring,
    /// Run the oracle once and report the verdict (§4.5.6).
    CheckOnly,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Minimize
    }
}

impl std::str::FromStr for Strategy {
    type Err = error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimize" => Ok(Strategy::Minimize),
            "minimize-around" => Ok(Strategy::MinimizeAround),
            "minimize-balanced" => Ok(Strategy::MinimizeBalanced),
            "replace-properties-by-globals" => Ok(Strategy::ReplacePropertiesByGlobals),
            "replace-arguments-by-globals" => Ok(Strategy::ReplaceArgumentsByGlobals),
            "remove-pair" => Ok(Strategy::RemovePair),
            "remove-adjacent-pairs" => Ok(Strategy::RemoveAdjacentPairs),
            "remove-substring" => Ok(Strategy::RemoveSubstring),
            "check-only" => Ok(Strategy::CheckOnly),
            other => Err(error::Error::Usage(format!(
                "unknown --strategy '{}'; expected one of minimize, minimize-around, \
                 minimize-balanced, replace-properties-by-globals, \
                 replace-arguments-by-globals, remove-pair, remove-adjacent-pairs, \
                 remove-substring, check-only",
                other
            ))),
        }
    }
}

/// Bounds and repeat policy shared by every geometric-chunking strategy.
#[derive(Clone, Copy, Debug)]
pub struct ChunkPolicy {
    /// The largest chunk size a round may start at.
    pub max_chunk: u64,
    /// The smallest chunk size; rounds never go below this.
    pub min_chunk: u64,
    /// When to repeat a round at its current size.
    pub repeat: Repeat,
}

impl ChunkPolicy {
    /// The chunk size the outer loop starts at, given the current atom
    /// count.
    pub fn initial_chunk_size(&self, num_parts: usize) -> u64 {
        std::cmp::min(self.max_chunk, largest_pow2_smaller_than(num_parts as u64))
    }

    /// The chunk size the outer loop stops at.
    pub fn final_chunk_size(&self) -> u64 {
        std::cmp::max(self.min_chunk, 1)
    }
}

/// `true` iff `n` is an exact power of two (`n >= 1`).
pub fn is_power_of_two(n: u64) -> bool {
    if n == 0 {
        return false;
    }
    let mut i: u64 = 1;
    loop {
        if i == n {
            return true;
        }
        if i > n {
            return false;
        }
        i *= 2;
    }
}

/// The largest power of two strictly less than `n` (for `n <= 1`, returns
/// `1`). This is deliberately *not* "largest power of two ≤ n": doubling the
/// result must still be ≥ n, matching the original tool's chunk-size seed.
pub fn largest_pow2_smaller_than(n: u64) -> u64 {
    let mut i: u64 = 1;
    loop {
        if i.saturating_mul(2) >= n {
            return i;
        }
        i *= 2;
    }
}

/// `ceil(n / d)`.
pub fn divide_rounding_up(n: u64, d: u64) -> u64 {
    (n / d) + if n % d != 0 { 1 } else { 0 }
}

/// Render `n` alongside `noun`, pluralized with a trailing `s` unless
/// `n == 1`.
pub fn quantity(n: u64, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

/// After a round, decide whether to repeat at the same chunk size, stop, or
/// halve and continue — shared by every strategy built on [`ChunkPolicy`].
pub enum NextRound {
    /// Repeat the round at the same chunk size.
    Repeat,
    /// Reduction is complete.
    Stop,
    /// Halve `chunkSize` (clamped to `finalChunkSize`) and go again.
    Halve,
}

/// Implements the decision table from the outer strategy loop shared by
/// `minimize`, `minimize-around`, `minimize-balanced`, and
/// `replace-properties-by-globals`.
pub fn next_round(
    policy: &ChunkPolicy,
    chunk_size: u64,
    any_progress: bool,
) -> NextRound {
    let last = chunk_size == policy.final_chunk_size();
    if any_progress
        && (policy.repeat == Repeat::Always || (policy.repeat == Repeat::Last && last))
    {
        NextRound::Repeat
    } else if last {
        NextRound::Stop
    } else {
        NextRound::Halve
    }
}

/// Whether a chunk is still part of the sequence or has been removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tag {
    /// Still present.
    Surviving,
    /// Removed by an earlier, committed probe.
    Removed,
}

/// The index of the nearest surviving tag strictly before `idx`, or `None`
/// if there isn't one. Mirrors the original tool's `list_rindex`.
pub fn prev_surviving(tags: &[Tag], idx: usize) -> Option<usize> {
    tags[..idx]
        .iter()
        .enumerate()
        .rev()
        .find(|(_, t)| **t == Tag::Surviving)
        .map(|(i, _)| i)
}

/// The index of the nearest surviving tag strictly after `idx`, or `None` if
/// there isn't one. Mirrors the original tool's `list_nindex`.
pub fn next_surviving(tags: &[Tag], idx: usize) -> Option<usize> {
    if idx + 1 >= tags.len() {
        return None;
    }
    tags[(idx + 1)..]
        .iter()
        .position(|t| *t == Tag::Surviving)
        .map(|rel| rel + idx + 1)
}

/// Final report printed after a strategy completes, shared by every
/// geometric-chunking strategy.
pub fn print_summary(engine: &Engine, orig_num_parts: usize, note_1_minimal: bool) {
    println!("Lithium is done!");
    if note_1_minimal {
        println!("  Removing any single atom from the final file makes it uninteresting!");
    }
    println!("  Initial size: {}", quantity(orig_num_parts as u64, "atom"));
    println!(
        "  Final size: {}",
        quantity(engine.testcase().parts.len() as u64, "atom")
    );
    println!("  Tests performed: {}", engine.total_probes());
    println!("  Test total: {}", quantity(engine.total_atoms_tested(), "atom"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn strategy_parses_every_documented_name() {
        assert_eq!(Strategy::from_str("minimize").unwrap(), Strategy::Minimize);
        assert_eq!(
            Strategy::from_str("minimize-around").unwrap(),
            Strategy::MinimizeAround
        );
        assert_eq!(
            Strategy::from_str("check-only").unwrap(),
            Strategy::CheckOnly
        );
        assert!(Strategy::from_str("bogus").is_err());
    }

    #[test]
    fn power_of_two_detection() {
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(2));
        assert!(is_power_of_two(64));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(3));
        assert!(!is_power_of_two(63));
    }

    #[test]
    fn largest_pow2_smaller_than_matches_original_semantics() {
        assert_eq!(largest_pow2_smaller_than(1), 1);
        assert_eq!(largest_pow2_smaller_than(4), 2);
        assert_eq!(largest_pow2_smaller_than(5), 4);
        assert_eq!(largest_pow2_smaller_than(8), 4);
        assert_eq!(largest_pow2_smaller_than(9), 8);
    }

    #[test]
    fn divide_rounding_up_examples() {
        assert_eq!(divide_rounding_up(5, 2), 3);
        assert_eq!(divide_rounding_up(4, 2), 2);
        assert_eq!(divide_rounding_up(0, 2), 0);
    }

    #[test]
    fn quantity_pluralizes() {
        assert_eq!(quantity(1, "atom"), "1 atom");
        assert_eq!(quantity(0, "atom"), "0 atoms");
        assert_eq!(quantity(2, "atom"), "2 atoms");
    }

    #[test]
    fn prev_next_surviving_skip_removed() {
        use Tag::*;
        let tags = vec![Surviving, Removed, Surviving, Removed, Surviving];
        assert_eq!(prev_surviving(&tags, 4), Some(2));
        assert_eq!(prev_surviving(&tags, 2), Some(0));
        assert_eq!(prev_surviving(&tags, 0), None);
        assert_eq!(next_surviving(&tags, 0), Some(2));
        assert_eq!(next_surviving(&tags, 2), Some(4));
        assert_eq!(next_surviving(&tags, 4), None);
    }

    #[test]
    fn next_round_decision_table() {
        let always = ChunkPolicy {
            max_chunk: 64,
            min_chunk: 1,
            repeat: Repeat::Always,
        };
        assert!(matches!(next_round(&always, 4, true), NextRound::Repeat));
        assert!(matches!(next_round(&always, 4, false), NextRound::Halve));

        let last = ChunkPolicy {
            max_chunk: 64,
            min_chunk: 1,
            repeat: Repeat::Last,
        };
        assert!(matches!(next_round(&last, 4, true), NextRound::Halve));
        assert!(matches!(next_round(&last, 1, true), NextRound::Repeat));
        assert!(matches!(next_round(&last, 1, false), NextRound::Stop));

        let never = ChunkPolicy {
            max_chunk: 64,
            min_chunk: 1,
            repeat: Repeat::Never,
        };
        assert!(matches!(next_round(&never, 4, true), NextRound::Halve));
        assert!(matches!(next_round(&never, 1, true), NextRound::Stop));
    }
}
