//! The `lithium` executable: parses options, confirms the unreduced
//! testcase reproduces the oracle's verdict, and dispatches to the
//! selected reduction strategy.

use lithium::atoms::{self, Tokenization};
use lithium::error::{self, Error};
use lithium::harness::{Engine, SnapshotNaming};
use lithium::oracle::{self, OracleAdapter, ScriptOracle};
use lithium::reducers::{
    self, aux, minimize, minimize_around, minimize_balanced, quantity, replace_arguments,
    replace_properties, ChunkPolicy, Repeat, Strategy,
};
use lithium::workspace::Workspace;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

fn main() {
    let _ = simple_logger::SimpleLogger::new().env().init();

    if let Err(e) = try_main() {
        eprintln!("Error: {}", e);
        process::exit(error::exit_code(&e));
    }
}

/// Parsed, validated command-line options.
struct Options {
    tokenization: Tokenization,
    strategy: Strategy,
    policy: ChunkPolicy,
    testcase_path: PathBuf,
    tempdir: Option<PathBuf>,
    oracle_program: String,
    oracle_args: Vec<String>,
}

fn parse_args() -> error::Result<Options> {
    let app = clap::App::new("lithium")
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            clap::Arg::with_name("char")
                .short("c")
                .long("char")
                .help("Treat the file as a sequence of characters rather than lines."),
        )
        .arg(
            clap::Arg::with_name("symbols")
                .short("s")
                .long("symbols")
                .help("Treat the file as a sequence of lexer symbols rather than lines."),
        )
        .arg(
            clap::Arg::with_name("cut-before")
                .long("cut-before")
                .takes_value(true)
                .value_name("CHARS")
                .help("Characters after which a new symbol atom may begin. Default: ]}:"),
        )
        .arg(
            clap::Arg::with_name("cut-after")
                .long("cut-after")
                .takes_value(true)
                .value_name("CHARS")
                .help("Characters that terminate a symbol atom. Default: ?=;{["),
        )
        .arg(
            clap::Arg::with_name("strategy")
                .long("strategy")
                .takes_value(true)
                .value_name("NAME")
                .help(
                    "One of minimize, minimize-around, minimize-balanced, \
                     replace-properties-by-globals, replace-arguments-by-globals, \
                     remove-pair, remove-adjacent-pairs, remove-substring, check-only. \
                     Default: minimize.",
                ),
        )
        .arg(
            clap::Arg::with_name("repeat")
                .long("repeat")
                .takes_value(true)
                .value_name("WHEN")
                .help("One of always, last, never. Default: last."),
        )
        .arg(
            clap::Arg::with_name("min")
                .long("min")
                .takes_value(true)
                .value_name("N")
                .help("Smallest chunk size to try. Must be a power of two. Default: 1."),
        )
        .arg(
            clap::Arg::with_name("max")
                .long("max")
                .takes_value(true)
                .value_name("N")
                .help("Largest chunk size to start at. Must be a power of two."),
        )
        .arg(
            clap::Arg::with_name("chunksize")
                .long("chunksize")
                .takes_value(true)
                .value_name("N")
                .help("Shortcut for --min=N --max=N --repeat=never."),
        )
        .arg(
            clap::Arg::with_name("testcase")
                .long("testcase")
                .takes_value(true)
                .value_name("PATH")
                .help("Overrides the positional testcase file."),
        )
        .arg(
            clap::Arg::with_name("tempdir")
                .long("tempdir")
                .takes_value(true)
                .value_name("PATH")
                .help("A preexisting directory to use as the workspace."),
        )
        .arg(
            clap::Arg::with_name("oracle")
                .required(true)
                .help("The interestingness test: a loadable module or executable."),
        )
        .arg(
            clap::Arg::with_name("rest")
                .multiple(true)
                .value_name("ARGS")
                .help(
                    "Arguments to the oracle, followed by the testcase file (unless \
                     --testcase is given).",
                ),
        );

    let matches = match app.get_matches_safe() {
        Ok(m) => m,
        Err(e)
            if e.kind == clap::ErrorKind::HelpDisplayed
                || e.kind == clap::ErrorKind::VersionDisplayed =>
        {
            println!("{}", e.message);
            process::exit(0);
        }
        Err(e) => return Err(Error::Usage(e.message)),
    };

    let cut_before = matches.value_of("cut-before").unwrap_or("]}:").to_string();
    let cut_after = matches.value_of("cut-after").unwrap_or("?=;{[").to_string();

    let tokenization = if matches.is_present("symbols") {
        Tokenization::SymbolDelimiter {
            cut_before,
            cut_after,
        }
    } else if matches.is_present("char") {
        Tokenization::Char
    } else {
        Tokenization::Line
    };

    let strategy = match matches.value_of("strategy") {
        Some(s) => Strategy::from_str(s)?,
        None => Strategy::default(),
    };

    let mut repeat = match matches.value_of("repeat") {
        Some(s) => Repeat::from_str(s)?,
        None => Repeat::Last,
    };
    let mut min_chunk = parse_power_of_two(matches.value_of("min"), "min")?.unwrap_or(1);
    let mut max_chunk =
        parse_power_of_two(matches.value_of("max"), "max")?.unwrap_or(1 << 30);

    if let Some(n) = parse_power_of_two(matches.value_of("chunksize"), "chunksize")? {
        min_chunk = n;
        max_chunk = n;
        repeat = Repeat::Never;
    }

    let rest: Vec<String> = matches
        .values_of("rest")
        .map(|v| v.map(String::from).collect())
        .unwrap_or_default();

    let testcase_path = if let Some(tc) = matches.value_of("testcase") {
        PathBuf::from(tc)
    } else if let Some(last) = rest.last() {
        PathBuf::from(last)
    } else {
        return Err(Error::Usage(
            "No testcase specified (use --testcase or give it as the last argument)".to_string(),
        ));
    };

    Ok(Options {
        tokenization,
        strategy,
        policy: ChunkPolicy {
            max_chunk,
            min_chunk,
            repeat,
        },
        testcase_path,
        tempdir: matches.value_of("tempdir").map(PathBuf::from),
        oracle_program: matches.value_of("oracle").unwrap().to_string(),
        oracle_args: rest,
    })
}

fn parse_power_of_two(value: Option<&str>, flag: &str) -> error::Result<Option<u64>> {
    let value = match value {
        Some(v) => v,
        None => return Ok(None),
    };
    let n: u64 = value
        .parse()
        .map_err(|_| Error::Usage(format!("--{} must be an integer, got '{}'", flag, value)))?;
    if !reducers::is_power_of_two(n) {
        return Err(Error::Usage(format!("--{} must be a power of two.", flag)));
    }
    Ok(Some(n))
}

/// The noun `quantity()` pluralizes for a given tokenization, matching the
/// original tool's "N lines/chars/symbol-delimiters" phrasing.
fn atom_noun(tokenization: &Tokenization) -> &'static str {
    match *tokenization {
        Tokenization::Line => "line",
        Tokenization::Char => "char",
        Tokenization::SymbolDelimiter { .. } => "symbol-delimiter",
    }
}

fn try_main() -> error::Result<()> {
    let opts = parse_args()?;

    let oracle_path = oracle::resolve_program(&opts.oracle_program);
    let mut oracle_adapter = ScriptOracle::new(oracle_path)?;
    oracle_adapter.init(&opts.oracle_args)?;

    let testcase = atoms::read_testcase(&opts.testcase_path, &opts.tokenization)?;

    let workspace = match opts.tempdir.clone() {
        Some(dir) => Workspace::at(dir)?,
        None => {
            let ws = Workspace::create(Path::new("."))?;
            println!(
                "Intermediate files will be stored in {}{}.",
                ws.dir().display(),
                std::path::MAIN_SEPARATOR
            );
            ws
        }
    };

    let noun = atom_noun(&opts.tokenization);
    let testcase_path = opts.testcase_path.clone();
    let oracle_args = opts.oracle_args.clone();
    let mut engine = Engine::new(testcase_path, testcase, workspace, &mut oracle_adapter, oracle_args);

    if opts.strategy == Strategy::CheckOnly {
        let interesting = engine.confirm_initially_interesting()?;
        aux::check_only(interesting);
        return Ok(());
    }

    println!(
        "The original testcase has {}.",
        quantity(engine.testcase().parts.len() as u64, noun)
    );
    println!("Checking that the original testcase is 'interesting'...");

    if !engine.confirm_initially_interesting()? {
        return Err(Error::NotInteresting);
    }

    if engine.testcase().parts.is_empty() {
        return Err(Error::Usage(format!(
            "The file has {} so there's nothing for Lithium to try to remove!",
            quantity(0, noun)
        )));
    }

    engine.snapshot("original", SnapshotNaming::Named)?;

    match opts.strategy {
        Strategy::Minimize => minimize::run(&mut engine, &opts.policy)?,
        Strategy::MinimizeAround => minimize_around::run(&mut engine, &opts.policy)?,
        Strategy::MinimizeBalanced => minimize_balanced::run(&mut engine, &opts.policy)?,
        Strategy::ReplacePropertiesByGlobals => replace_properties::run(&mut engine, &opts.policy)?,
        Strategy::ReplaceArgumentsByGlobals => {
            replace_arguments::run(&mut engine, opts.policy.repeat)?
        }
        Strategy::RemovePair => aux::remove_pair(&mut engine)?,
        Strategy::RemoveAdjacentPairs => aux::remove_adjacent_pairs(&mut engine)?,
        Strategy::RemoveSubstring => aux::remove_substring(&mut engine)?,
        Strategy::CheckOnly => unreachable!("handled above"),
    }

    engine.testcase().write(engine.testcase_path())?;

    Ok(())
}
