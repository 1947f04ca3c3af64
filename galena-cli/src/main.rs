//! Galena CLI - command-line front end for SMT-LIB v2 scripts

use clap::{Parser, ValueEnum};
use galena_core::{NodeBackend, ParserOpts, SatResult};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Verbosity level
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
enum Verbosity {
    /// No output except results
    Quiet,
    /// Minimal output
    Normal,
    /// Detailed output
    Verbose,
    /// Debug output
    Debug,
    /// Trace output
    Trace,
}

/// Galena - SMT-LIB v2 front end for the Galena bit-vector solver
#[derive(Parser, Debug)]
#[command(name = "galena")]
#[command(version)]
#[command(about = "Parses SMT-LIB v2 scripts and drives the solver backend")]
struct Args {
    /// Input file(s) (SMT-LIB v2 format). If not provided, reads from stdin.
    #[arg(value_name = "FILE")]
    input: Vec<PathBuf>,

    /// Output file. If not provided, writes to stdout.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, value_enum, default_value = "normal")]
    verbosity: Verbosity,

    /// Treat |quoted| and plain symbols as distinct names (strict SMT-LIB)
    #[arg(long)]
    strict_symbols: bool,

    /// Assume the given status for every check-sat instead of solving
    #[arg(long, value_parser = parse_status)]
    status: Option<SatResult>,
}

fn parse_status(arg: &str) -> Result<SatResult, String> {
    match arg {
        "sat" => Ok(SatResult::Sat),
        "unsat" => Ok(SatResult::Unsat),
        "unknown" => Ok(SatResult::Unknown),
        other => Err(format!("invalid status '{other}'")),
    }
}

fn run_input(args: &Args, input: &str, name: &str, out: &mut dyn Write) -> bool {
    let mut backend = NodeBackend::new();
    if let Some(status) = args.status {
        // enough queued answers for any reasonable script
        for _ in 0..1024 {
            backend.queue_result(status);
        }
    }
    let opts = ParserOpts {
        quote_equiv: !args.strict_symbols,
    };
    let parser =
        galena_core::Parser::with_options(&mut backend, None, input, name, out, opts);
    match parser.parse() {
        Ok(result) => {
            info!(
                logic = %result.logic,
                status = %result.status,
                nsatcalls = result.nsatcalls,
                "parsed {name}"
            );
            true
        }
        Err(err) => {
            eprintln!("{err}");
            false
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbosity {
        Verbosity::Quiet => Level::ERROR,
        Verbosity::Normal => Level::WARN,
        Verbosity::Verbose => Level::INFO,
        Verbosity::Debug => Level::DEBUG,
        Verbosity::Trace => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => match fs::File::create(path) {
            Ok(file) => Box::new(file),
            Err(err) => {
                eprintln!("galena: can not create '{}': {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(io::stdout()),
    };

    let mut ok = true;
    if args.input.is_empty() {
        let mut script = String::new();
        if let Err(err) = io::stdin().read_to_string(&mut script) {
            eprintln!("galena: <stdin>: {err}");
            return ExitCode::FAILURE;
        }
        ok &= run_input(&args, &script, "<stdin>", &mut out);
    } else {
        for path in &args.input {
            let script = match fs::read_to_string(path) {
                Ok(script) => script,
                Err(err) => {
                    eprintln!("galena: {}: {err}", path.display());
                    ok = false;
                    continue;
                }
            };
            let name = path.display().to_string();
            ok &= run_input(&args, &script, &name, &mut out);
        }
    }

    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
