//! det3-bench: run testbench sequences against the engine, or replay a
//! recorded stimulus trace.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use det3_runtime::replay::replay_file;
use det3_runtime::{generate, BenchConfig, BenchResult, BenchSession, SequenceKind};

#[derive(Parser)]
#[command(name = "det3-bench")]
#[command(version)]
#[command(about = "Testbench for the 3x3 determinant engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a sequence through a fresh engine and score the results
    Run {
        #[arg(short, long, value_enum, default_value = "simple")]
        sequence: SequenceKind,

        /// Overrides the seed from the config file
        #[arg(long)]
        seed: Option<u64>,

        /// Item count; defaults to the sequence's own count
        #[arg(long)]
        items: Option<usize>,

        /// JSON config file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Record trace.log (and snapshots) into this directory
        #[arg(long, value_name = "DIR")]
        trace_dir: Option<PathBuf>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a recorded trace and print the final state hash
    Replay {
        #[arg(short, long, value_name = "FILE")]
        trace: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "det3_runtime=info,det3_bench=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            sequence,
            seed,
            items,
            config,
            trace_dir,
            json,
        } => run_command(
            sequence,
            seed,
            items,
            config.as_deref(),
            trace_dir.as_deref(),
            json,
        ),
        Commands::Replay { trace } => replay_command(&trace),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run_command(
    kind: SequenceKind,
    seed: Option<u64>,
    items: Option<usize>,
    config_path: Option<&Path>,
    trace_dir: Option<&Path>,
    json: bool,
) -> BenchResult<bool> {
    let mut config = match config_path {
        Some(p) => BenchConfig::load(p)?,
        None => BenchConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    if items.is_some() {
        config.items = items;
    }
    config.validate()?;

    let sequence = generate(kind, &config);
    let mut session = BenchSession::new(sequence, config);
    if let Some(dir) = trace_dir {
        session = session.with_trace_dir(dir)?;
    }
    let report = session.run()?;

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| det3_runtime::BenchError::Config(e.to_string()))?;
        println!("{}", out);
    } else {
        println!("sequence:     {:?}", report.kind);
        println!("cycles:       {}", report.cycles);
        println!("items driven: {}", report.items_driven);
        println!("aborted:      {}", report.items_aborted);
        println!("matched:      {}/{}", report.score.matched, report.score.expected);
        println!("mismatches:   {}", report.score.mismatches.len());
        println!("latency warn: {}", report.score.latency_warnings.len());
        println!("unprocessed:  {}", report.score.unprocessed);
        println!("final hash:   {}", report.final_hash);
        println!("{}", report.coverage);
        println!("{}", if report.passed() { "TEST PASSED" } else { "TEST FAILED" });
    }
    Ok(report.passed())
}

fn replay_command(trace: &Path) -> BenchResult<bool> {
    let report = replay_file(trace)?;
    println!("edges:      {}", report.edges);
    println!("results:    {}", report.results);
    println!("state hash: {}", report.state_hash);
    println!("trace hash: {}", report.trace_hash);
    Ok(true)
}
