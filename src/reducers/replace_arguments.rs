//! Function-argument-to-global rewriting: `replace-arguments-by-globals`.

use super::{quantity, Repeat};
use crate::error;
use crate::harness::Engine;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref NAMED_FUNCTION: Regex = Regex::new(
        r"(?:function\s+(\w+)|(\w+)\s*=\s*function)\s*\(\s*(\w+(?:\s*,\s*\w+)*)?\s*\)"
    )
    .unwrap();
    static ref ANONYMOUS_FUNCTION: Regex =
        Regex::new(r"\(function\s*\w*\s*\(((?:\s*\w+\s*(?:,\s*\w+\s*)*)?)\)\s*\{").unwrap();
    static ref ANONYMOUS_CALL: Regex =
        Regex::new(r"\}\s*\)\s*\(((?:[^()]|\([^,()]*\))*)\)").unwrap();
    static ref FUNCTION_CALL: Regex = Regex::new(r"(\w+)\s*\(((?:[^()]|\([^,()]*\))*)\)").unwrap();
}

#[derive(Clone, Debug)]
struct FunctionDef {
    params: Vec<String>,
    args_pattern: String,
    chunk: usize,
}

#[derive(Clone, Debug)]
struct FunctionUse {
    values: Vec<String>,
    chunk: usize,
    pattern: String,
}

#[derive(Clone, Debug, Default)]
struct FunctionInfo {
    def: Option<FunctionDef>,
    uses: Vec<FunctionUse>,
}

#[derive(Clone, Debug)]
struct AnonymousFunction {
    params: Vec<String>,
    chunk: usize,
    call_values: Option<Vec<String>>,
    call_chunk: usize,
}

fn split_args(s: &str) -> Vec<String> {
    if s.trim().is_empty() {
        Vec::new()
    } else {
        s.split(',').map(|a| a.trim().to_string()).collect()
    }
}

/// Scan every line once, building the three tables the original tool's
/// single combined pass produces: named function definitions/uses, and
/// immediately-invoked anonymous functions paired definition-to-call-site
/// via a stack (a function call closes the most recently opened anonymous
/// definition still awaiting its call).
fn scan(parts: &[String]) -> (BTreeMap<String, FunctionInfo>, Vec<AnonymousFunction>) {
    let mut functions: BTreeMap<String, FunctionInfo> = BTreeMap::new();
    let mut anonymous_stack: Vec<AnonymousFunction> = Vec::new();
    let mut anonymous_queue: Vec<AnonymousFunction> = Vec::new();

    for (chunk, line) in parts.iter().enumerate() {
        for caps in NAMED_FUNCTION.captures_iter(line) {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string());
            let name = match name {
                Some(n) => n,
                None => continue,
            };
            let params = caps.get(3).map(|m| m.as_str()).unwrap_or("");
            let entry = functions.entry(name).or_default();
            entry.def = Some(FunctionDef {
                params: split_args(params),
                args_pattern: params.to_string(),
                chunk,
            });
        }

        for caps in ANONYMOUS_FUNCTION.captures_iter(line) {
            let params = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            anonymous_stack.push(AnonymousFunction {
                params: split_args(params),
                chunk,
                call_values: None,
                call_chunk: 0,
            });
        }

        for caps in ANONYMOUS_CALL.captures_iter(line) {
            let mut anon = match anonymous_stack.pop() {
                Some(anon) => anon,
                None => continue,
            };
            let values_text = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            if values_text.is_empty() && anon.params.is_empty() {
                continue;
            }
            anon.call_values = Some(split_args(values_text));
            anon.call_chunk = chunk;
            anonymous_queue.push(anon);
        }

        for caps in FUNCTION_CALL.captures_iter(line) {
            let name = caps.get(1).unwrap().as_str().to_string();
            let args_text = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let pattern = caps.get(0).unwrap().as_str().to_string();
            let entry = functions.entry(name).or_default();
            entry.uses.push(FunctionUse {
                values: split_args(args_text),
                chunk,
                pattern,
            });
        }
    }

    (functions, anonymous_queue)
}

/// Run `replace-arguments-by-globals` to completion.
pub fn run(engine: &mut Engine, repeat: Repeat) -> error::Result<()> {
    let mut round_num = 0u64;

    loop {
        let num_removed = try_round(engine, round_num)?;
        round_num += 1;

        if num_removed > 0 && (repeat == Repeat::Always || repeat == Repeat::Last) {
            continue;
        }
        break;
    }

    println!("Lithium is done!");
    println!("  Tests performed: {}", engine.total_probes());
    println!(
        "  Final size: {}",
        quantity(engine.testcase().parts.len() as u64, "atom")
    );
    println!("  Test total: {}", quantity(engine.total_atoms_tested(), "atom"));
    Ok(())
}

fn try_round(engine: &mut Engine, round_num: u64) -> error::Result<u64> {
    let (functions, anonymous_queue) = scan(&engine.testcase().parts);

    if functions.is_empty() && anonymous_queue.is_empty() {
        return Ok(0);
    }

    info!("round {}: removing function arguments", round_num);

    let mut num_moved = 0u64;

    // Phase 1: named functions with at least one use — delete the
    // definition's argument list and prepend assignments at every call
    // site.
    for (name, info) in &functions {
        let def = match &info.def {
            Some(d) if !info.uses.is_empty() => d,
            _ => continue,
        };

        let mut candidate = engine.testcase().parts.clone();
        candidate[def.chunk] = candidate[def.chunk].replacen(&def.args_pattern, "", 1);

        for use_ in &info.uses {
            if use_.chunk == def.chunk && use_.values == def.params {
                continue;
            }
            let mut values = use_.values.clone();
            while values.len() < def.params.len() {
                values.push("undefined".to_string());
            }
            let setters: String = def
                .params
                .iter()
                .zip(values.iter())
                .map(|(a, v)| format!("{} = {};\n", a, v))
                .collect();
            candidate[use_.chunk] = format!("{}{}", setters, candidate[use_.chunk]);
        }

        if engine.probe(candidate)? {
            info!("reduced arguments of '{}'", name);
            num_moved += 1;
        }
    }

    // Phase 2: per-call-site rewriting to a bare `name()`.
    for (name, info) in &functions {
        let def = &info.def;
        for use_ in &info.uses {
            if let Some(d) = def {
                if use_.chunk == d.chunk && use_.values == d.params {
                    continue;
                }
            }

            let mut candidate = engine.testcase().parts.clone();
            let replacement = format!("{}()", name);
            if candidate[use_.chunk].contains(&use_.pattern) {
                candidate[use_.chunk] =
                    candidate[use_.chunk].replacen(&use_.pattern, &replacement, 1);
                if engine.probe(candidate)? {
                    num_moved += 1;
                }
            }
        }
    }

    // Phase 3: immediately-invoked anonymous functions.
    for anon in &anonymous_queue {
        let values = match &anon.call_values {
            Some(v) => v,
            None => continue,
        };

        let mut candidate = engine.testcase().parts.clone();
        let params_pattern = anon.params.join(", ");
        let def_rewritten = candidate[anon.chunk].replacen(&params_pattern, "", 1);

        let values_pattern = values.join(", ");
        let call_rewritten = candidate[anon.call_chunk].replacen(&values_pattern, "", 1);

        let setters: String = anon
            .params
            .iter()
            .zip(values.iter())
            .map(|(a, v)| format!("var {} = {};\n", a, v))
            .collect();

        let def_unchanged = def_rewritten == candidate[anon.chunk];
        let call_unchanged = call_rewritten == candidate[anon.call_chunk];
        if def_unchanged && call_unchanged && setters.is_empty() {
            continue;
        }

        candidate[anon.chunk] = def_rewritten;
        if anon.call_chunk == anon.chunk {
            candidate[anon.chunk] = format!("{}{}", setters, candidate[anon.chunk]);
        } else {
            candidate[anon.call_chunk] = call_rewritten;
            candidate[anon.chunk] = format!("{}{}", setters, candidate[anon.chunk]);
        }

        if engine.probe(candidate)? {
            num_moved += 1;
        }
    }

    Ok(num_moved)
}
