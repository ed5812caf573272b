//! The auxiliary strategies: `check-only`, `remove-pair`,
//! `remove-adjacent-pairs`, and `remove-substring`. Unlike the geometric
//! chunking strategies, these don't share `ChunkPolicy` — they walk the atom
//! sequence directly, the same "enable/disable a range of indices, probe,
//! keep or restore" shape without any chunk-size bookkeeping.

use crate::atoms::Atom;
use crate::error;
use crate::harness::Engine;

/// Print the already-known verdict for the unreduced testcase and stop.
/// `check-only` performs no reduction of its own: the single oracle
/// invocation is the driver's initial interestingness check.
pub fn check_only(interesting: bool) {
    println!("{}", if interesting { "Interesting." } else { "Not interesting." });
}

/// Exhaustively try removing every pair of atoms `(i, j)` with `i < j`,
/// stopping at the first one whose removal is still interesting.
pub fn remove_pair(engine: &mut Engine) -> error::Result<()> {
    let n = engine.testcase().parts.len();

    for i in 0..n {
        for j in (i + 1)..n {
            println!("Trying removing the pair {}, {}", i, j);

            let candidate: Vec<Atom> = engine
                .testcase()
                .parts
                .iter()
                .enumerate()
                .filter(|&(k, _)| k != i && k != j)
                .map(|(_, atom)| atom.clone())
                .collect();

            if engine.probe(candidate)? {
                println!("Success! Removed a pair! Exiting.");
                return Ok(());
            }
        }
    }

    println!("Failure! No pair can be removed.");
    Ok(())
}

/// One left-to-right pass trying to remove every adjacent pair of atoms. A
/// successful removal doesn't advance the cursor, since what follows slides
/// down into the gap (the same convention `minimize` uses for a removed
/// chunk).
pub fn remove_adjacent_pairs(engine: &mut Engine) -> error::Result<()> {
    let mut i = 0usize;
    let mut removed = 0u64;

    loop {
        let len = engine.testcase().parts.len();
        if i + 1 >= len {
            break;
        }

        let mut candidate = engine.testcase().parts[..i].to_vec();
        candidate.extend_from_slice(&engine.testcase().parts[(i + 2)..]);

        if engine.probe(candidate)? {
            println!("Removed an adjacent pair based at {}", i);
            removed += 1;
        } else {
            i += 1;
        }
    }

    println!(
        "Done with one pass of removing adjacent pairs ({} removed)",
        removed
    );
    Ok(())
}

/// For each starting index, try removing progressively longer runs of atoms
/// beginning there, stopping at the first successful removal.
pub fn remove_substring(engine: &mut Engine) -> error::Result<()> {
    let n = engine.testcase().parts.len();

    for i in 0..n {
        for j in i..n {
            println!("Trying removing the substring {}..{}", i, j);

            let mut candidate = engine.testcase().parts[..i].to_vec();
            candidate.extend_from_slice(&engine.testcase().parts[(j + 1)..]);

            if engine.probe(candidate)? {
                println!("Success! Removed a substring! Exiting.");
                return Ok(());
            }
        }
    }

    println!("Failure! No substring can be removed.");
    Ok(())
}
