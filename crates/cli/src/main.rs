//! bug65 command-line runner.
//!
//! This binary exposes the harness library from the shell. It performs:
//! 1. **Single run:** Loads one image, feeds it scripted input, copies its output to the
//!    host streams and exits with the program's status.
//! 2. **Suite run:** Runs every case of a JSON manifest, prints one line per case and a
//!    summary, and exits 0 (all passed), 1 (any failure) or 2 (harness problem).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bug65_core::Config;
use bug65_core::common::error::Error;
use bug65_core::isa::CpuVariant;
use bug65_core::sim::harness::{self, EXIT_FAIL, EXIT_HARNESS, RunOutcome};
use bug65_core::sim::image::ProgramImage;
use bug65_core::sim::labels::SymbolTable;
use bug65_core::sim::manifest::Manifest;
use bug65_core::soc::console::{FailureInjection, InputScript, Stream};

#[derive(Parser, Debug)]
#[command(
    name = "bug65",
    author,
    version,
    about = "Deterministic 6502 execution harness for cc65 programs",
    long_about = "Run a sim65 program image against scripted input, or run a JSON test suite.\n\n\
                  Examples:\n  \
                  bug65 run args.sim -- one two\n  \
                  bug65 run interactive.sim --labels interactive.lbl --input keys.txt\n  \
                  bug65 suite tests/manifest.json --jobs 4"
)]
struct Cli {
    /// JSON configuration file; omitted fields take their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one program image.
    Run {
        /// sim65 image (or raw bytes with --load/--entry).
        image: PathBuf,

        /// ld65 label file naming library routines to intercept.
        #[arg(long)]
        labels: Option<PathBuf>,

        /// File whose bytes are delivered as standard input.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Steps allowed before the run times out.
        #[arg(long)]
        step_budget: Option<u64>,

        /// Log a disassembly of every executed instruction.
        #[arg(long)]
        trace: bool,

        /// Print run statistics to stderr when the program ends.
        #[arg(long)]
        stats: bool,

        /// Treat the image as headerless bytes loaded at this address.
        #[arg(long, value_parser = parse_addr, requires = "entry")]
        load: Option<u16>,

        /// Entry address of a headerless image.
        #[arg(long, value_parser = parse_addr, requires = "load")]
        entry: Option<u16>,

        /// Arguments passed to the program after its name.
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Run every case of a JSON manifest.
    Suite {
        /// Manifest path; case files are resolved relative to it.
        manifest: PathBuf,

        /// Worker threads; defaults to the available parallelism.
        #[arg(short, long)]
        jobs: Option<usize>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let trace = matches!(cli.command, Commands::Run { trace: true, .. });
    init_logging(trace);

    let config = match &cli.config {
        Some(path) => match Config::from_path(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("bug65: {e}");
                return ExitCode::from(EXIT_HARNESS);
            }
        },
        None => Config::default(),
    };

    match cli.command {
        Commands::Run {
            image,
            labels,
            input,
            step_budget,
            trace,
            stats,
            load,
            entry,
            args,
        } => {
            let opts = RunOptions {
                image,
                labels,
                input,
                step_budget,
                trace,
                stats,
                raw: load.zip(entry),
                args,
            };
            cmd_run(opts, config)
        }
        Commands::Suite { manifest, jobs } => cmd_suite(&manifest, jobs, &config),
    }
}

/// Installs the `tracing` subscriber; `RUST_LOG` overrides the default filter.
fn init_logging(trace: bool) {
    let default = if trace { "warn,bug65::cpu=trace" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses `$0200`, `0x0200` or decimal.
fn parse_addr(s: &str) -> Result<u16, String> {
    let parsed = if let Some(hex) = s.strip_prefix('$').or_else(|| s.strip_prefix("0x")) {
        u16::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|e| format!("bad address '{s}': {e}"))
}

struct RunOptions {
    image: PathBuf,
    labels: Option<PathBuf>,
    input: Option<PathBuf>,
    step_budget: Option<u64>,
    trace: bool,
    stats: bool,
    raw: Option<(u16, u16)>,
    args: Vec<String>,
}

/// Runs one image and mirrors its output.
///
/// Exits with the program's status, 1 on a fault or timeout, 2 if the image cannot be
/// loaded.
fn cmd_run(opts: RunOptions, mut config: Config) -> ExitCode {
    if let Some(budget) = opts.step_budget {
        config.general.step_budget = budget;
    }
    if opts.trace {
        config.general.trace_instructions = true;
    }

    let prepared = prepare_run(&opts, &config);
    let (image, script) = match prepared {
        Ok(p) => p,
        Err(e) => {
            eprintln!("bug65: {e}");
            return ExitCode::from(EXIT_HARNESS);
        }
    };

    let mut argv = vec![opts.image.display().to_string().into_bytes()];
    argv.extend(opts.args.iter().map(|a| a.as_bytes().to_vec()));

    let failures = FailureInjection::from(&config.console);
    let result = match harness::run_with(&image, &argv, script, failures, &config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("bug65: load error: {e}");
            return ExitCode::from(EXIT_HARNESS);
        }
    };

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    for event in result.transcript.outputs() {
        let written = match event.stream {
            Stream::Stdout => stdout.lock().write_all(&event.bytes),
            Stream::Stderr => stderr.lock().write_all(&event.bytes),
        };
        if let Err(e) = written {
            tracing::warn!(error = %e, "could not mirror program output");
        }
    }
    let _ = stdout.lock().flush();

    if opts.stats {
        eprint!("{}", result.stats.summary());
    }

    match result.outcome {
        RunOutcome::Exited(status) => ExitCode::from(status as u8),
        RunOutcome::Faulted(fault) => {
            eprintln!("bug65: {fault}");
            ExitCode::from(EXIT_FAIL)
        }
    }
}

/// Reads the image, label file and input script named by `opts`.
fn prepare_run(opts: &RunOptions, config: &Config) -> Result<(ProgramImage, InputScript), Error> {
    let image = match opts.raw {
        Some((load, entry)) => {
            let bytes = bug65_core::sim::loader::load_binary(&opts.image)?;
            let variant = config.cpu.variant.unwrap_or(CpuVariant::Nmos6502);
            ProgramImage::raw(bytes, load, entry, variant)
        }
        None => ProgramImage::from_path(&opts.image)?,
    };
    let image = match &opts.labels {
        Some(path) => image.with_symbols(SymbolTable::from_path(path)?),
        None => image,
    };
    let script = match &opts.input {
        Some(path) => InputScript::new(bug65_core::sim::loader::load_binary(path)?),
        None => InputScript::default(),
    };
    Ok((image, script))
}

/// Runs a manifest and prints one line per case.
fn cmd_suite(manifest_path: &Path, jobs: Option<usize>, config: &Config) -> ExitCode {
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
    let cases = match Manifest::from_path(manifest_path) {
        Ok(manifest) => manifest.resolve(base_dir),
        Err(e) => {
            eprintln!("bug65: {e}");
            return ExitCode::from(EXIT_HARNESS);
        }
    };

    let jobs = jobs.unwrap_or_else(|| std::thread::available_parallelism().map_or(1, usize::from));
    let report = harness::run_suite(&cases, config, jobs);
    for case in &report.cases {
        println!("{case}");
    }
    println!("{}", report.summary());
    ExitCode::from(report.exit_code())
}
