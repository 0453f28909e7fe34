//! rulepy - command-line front end
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  rule file ─► translate() ─► Python (stdout or -o)          │
//! │                          └─► source map (--source-map)      │
//! │                                                              │
//! │  --groups   print the statement grouping and its statistics │
//! │  --config   JSON options document (TranspileOptions)        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exit code is 1 when translation fails; the errors go to stderr.

use std::env;
use std::fs;
use std::process::exit;

use anyhow::{bail, Context, Result};
use log::info;
use serde::Serialize;

use rulepy::grouping::statistics;
use rulepy::{GroupingStatistics, StatementGroup, TranspileOptions, Transpiler};

//=============================================================================
// ANSI COLORS
//=============================================================================

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD_RED: &str = "\x1b[1;31m";
    pub const BOLD_GREEN: &str = "\x1b[1;32m";
    pub const BOLD_YELLOW: &str = "\x1b[1;33m";
    pub const BOLD_CYAN: &str = "\x1b[1;36m";
    pub const GREEN: &str = "\x1b[32m";
}

//=============================================================================
// ARGUMENTS
//=============================================================================

#[derive(Debug, Default)]
struct CliArgs {
    input: String,
    output: Option<String>,
    source_map: Option<String>,
    config: Option<String>,
    instrument: bool,
    groups: bool,
}

#[derive(Serialize)]
struct GroupReport<'a> {
    groups: &'a [StatementGroup],
    statistics: GroupingStatistics,
}

enum Invocation {
    Run(CliArgs),
    Help,
    Version,
}

fn take_value(args: &[String], i: usize, flag: &str) -> Result<String> {
    match args.get(i + 1) {
        Some(value) => Ok(value.clone()),
        None => bail!("{} requires a file name", flag),
    }
}

fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut cli = CliArgs::default();
    let mut input = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(Invocation::Help),
            "-V" | "--version" => return Ok(Invocation::Version),
            "-o" => {
                cli.output = Some(take_value(args, i, "-o")?);
                i += 2;
            }
            "--source-map" => {
                cli.source_map = Some(take_value(args, i, "--source-map")?);
                i += 2;
            }
            "--config" => {
                cli.config = Some(take_value(args, i, "--config")?);
                i += 2;
            }
            "--instrument" => {
                cli.instrument = true;
                i += 1;
            }
            "--groups" => {
                cli.groups = true;
                i += 1;
            }
            arg if arg.starts_with('-') => bail!("unknown option '{}'", arg),
            arg => {
                if input.is_some() {
                    bail!("more than one input file given");
                }
                input = Some(arg.to_string());
                i += 1;
            }
        }
    }

    match input {
        Some(path) => {
            cli.input = path;
            Ok(Invocation::Run(cli))
        }
        None => bail!("no input file specified"),
    }
}

fn print_usage() {
    eprintln!("{}rulepy{} {}", ansi::BOLD_CYAN, ansi::RESET, env!("CARGO_PKG_VERSION"));
    eprintln!("Translate business rules into Python\n");
    eprintln!("{}USAGE:{}", ansi::BOLD_YELLOW, ansi::RESET);
    eprintln!("    rulepy <input> [OPTIONS]\n");
    eprintln!("{}OPTIONS:{}", ansi::BOLD_YELLOW, ansi::RESET);
    eprintln!("    {}-o <file>{}             Write Python to <file> instead of stdout", ansi::GREEN, ansi::RESET);
    eprintln!("    {}--source-map <file>{}   Write the source map as JSON", ansi::GREEN, ansi::RESET);
    eprintln!("    {}--config <file>{}       Read options from a JSON document", ansi::GREEN, ansi::RESET);
    eprintln!("    {}--instrument{}          Emit step-control calls", ansi::GREEN, ansi::RESET);
    eprintln!("    {}--groups{}              Print statement groups and statistics", ansi::GREEN, ansi::RESET);
    eprintln!("    {}-h, --help{}            Show this help message", ansi::GREEN, ansi::RESET);
    eprintln!("    {}-V, --version{}         Show version\n", ansi::GREEN, ansi::RESET);
    eprintln!("Set RUST_LOG=debug to trace grouping and dispatch.");
}

//=============================================================================
// RUN
//=============================================================================

fn load_options(cli: &CliArgs) -> Result<TranspileOptions> {
    let mut options = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading config '{}'", path))?;
            TranspileOptions::from_json(&text).with_context(|| format!("loading config '{}'", path))?
        }
        None => TranspileOptions::default(),
    };
    if cli.instrument {
        options.instrument = true;
    }
    Ok(options)
}

/// Returns false when translation failed
fn run(cli: &CliArgs) -> Result<bool> {
    let source = fs::read_to_string(&cli.input).with_context(|| format!("reading '{}'", cli.input))?;
    let transpiler = Transpiler::new(load_options(cli)?);

    if cli.groups {
        let groups = transpiler.group(&source);
        let report = GroupReport {
            groups: &groups,
            statistics: statistics(&groups),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(true);
    }

    let result = transpiler.translate_with_diagnostics(&source);
    for warning in &result.warnings {
        eprintln!("{}warning{}: {}", ansi::BOLD_YELLOW, ansi::RESET, warning);
    }
    if !result.success {
        for error in &result.errors {
            eprintln!("{}error{}: {}", ansi::BOLD_RED, ansi::RESET, error);
        }
        return Ok(false);
    }

    match &cli.output {
        Some(path) => {
            fs::write(path, &result.generated_code).with_context(|| format!("writing '{}'", path))?;
            info!("wrote {}", path);
            eprintln!("{}translated{} {} -> {}", ansi::BOLD_GREEN, ansi::RESET, cli.input, path);
        }
        None => print!("{}", result.generated_code),
    }

    if let Some(path) = &cli.source_map {
        let json = result.source_map.to_json().context("serializing source map")?;
        fs::write(path, json).with_context(|| format!("writing '{}'", path))?;
        info!("wrote source map {}", path);
    }

    Ok(true)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();
    let cli = match parse_args(&args) {
        Ok(Invocation::Run(cli)) => cli,
        Ok(Invocation::Help) => {
            print_usage();
            exit(0);
        }
        Ok(Invocation::Version) => {
            println!("rulepy {}", env!("CARGO_PKG_VERSION"));
            exit(0);
        }
        Err(e) => {
            eprintln!("{}error{}: {}\n", ansi::BOLD_RED, ansi::RESET, e);
            print_usage();
            exit(1);
        }
    };

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(e) => {
            eprintln!("{}error{}: {:#}", ansi::BOLD_RED, ansi::RESET, e);
            exit(1);
        }
    }
}
