//! ctburn CLI
//!
//! Usage:
//!   ctburn run --config job.json            # burn every chip type of a job
//!   ctburn resolve --root D:\CT ABC123 XYZ  # show which CT file each chip type uses
//!   ctburn chips chip_list.txt              # list the chip types of a list file

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use ctburn::chip_list::load_chip_list_file;
use ctburn::{
    create_engine, format_trace, load_job, ArtifactResolver, BurnError, BurnSequencer,
    ChipSource, ChipTypeToken, DiagnosticLog, ProgressLog, ResolverConfig, RunOutcome, RunReport,
};
use std::path::PathBuf;
use tracing::{error, info};

mod elevation;

#[derive(Parser)]
#[command(name = "ctburn")]
#[command(about = "Unattended BurnScc programming runs")]
#[command(
    long_about = "Resolves one CT file per chip type and drives BurnScc through each burn, assigning consecutive range indices."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Burn every chip type of a job descriptor
    Run(RunArgs),
    /// Resolve chip types to CT files without touching BurnScc
    Resolve(ResolveArgs),
    /// List the chip types found in a chip list file
    Chips(ChipsArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// JSON job descriptor
    #[clap(long, short = 'c', env = "CTBURN_CONFIG")]
    config: PathBuf,

    /// Where failure traces are appended (defaults to the Desktop)
    #[clap(long, env = "CTBURN_ERROR_LOG")]
    error_log: Option<PathBuf>,

    /// Do not relaunch as administrator
    #[clap(long)]
    no_elevate: bool,
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    /// Folder searched recursively for CT files
    #[clap(long, short = 'r')]
    root: PathBuf,

    /// Chip types to resolve
    #[clap(required = true)]
    chips: Vec<String>,
}

#[derive(Parser, Debug)]
struct ChipsArgs {
    /// Text file with `Chip_Type = ...` lines
    file: PathBuf,
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run_job(args).await,
        Commands::Resolve(args) => resolve_chips(args),
        Commands::Chips(args) => list_chips(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                // progress lines are printed directly, keep them out of the log stream
                .unwrap_or_else(|_| "info,ctburn::progress=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

async fn run_job(args: RunArgs) -> Result<()> {
    if !args.no_elevate && elevation::relaunch_if_needed()? {
        println!("Relaunched as administrator; this window can be closed.");
        return Ok(());
    }

    let diagnostics = args
        .error_log
        .map(DiagnosticLog::new)
        .unwrap_or_else(DiagnosticLog::resolve_default);
    info!("Error log: {}", diagnostics.path().display());

    let loaded = match load_job(&args.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            let context = format!("Loading job descriptor {}", args.config.display());
            return Err(record_failure(&diagnostics, &context, &BurnError::from(e)));
        }
    };

    let job = loaded.job;
    println!("IP address: {}", job.ip_address());
    println!("Starting range index: {}", job.starting_index());
    match job.chip_source() {
        ChipSource::Inline => println!("Chip types: {} (inline)", job.chip_types().len()),
        ChipSource::File(path) => println!(
            "Chip types: {} (from {})",
            job.chip_types().len(),
            path.display()
        ),
    }
    println!("BurnScc: {}", job.burn_exe_path().display());
    println!("CT search root: {}", job.ct_search_root().display());

    let (log, mut lines) = ProgressLog::channel();
    let settings = loaded.settings;
    let worker = tokio::task::spawn_blocking(move || -> Result<RunReport, BurnError> {
        let engine = create_engine()?;
        let sequencer = BurnSequencer::new(engine, settings, log)?;
        Ok(sequencer.run(&job))
    });

    while let Some(line) = lines.recv().await {
        println!("{line}");
    }

    let report = match worker.await.context("Burn worker stopped unexpectedly")? {
        Ok(report) => report,
        Err(e) => return Err(record_failure(&diagnostics, "Starting automation", &e)),
    };

    println!(
        "Completed {} chip type(s); next range index: {}",
        report.completed.len(),
        report.range_index
    );

    match &report.outcome {
        RunOutcome::Done => Ok(()),
        RunOutcome::Aborted {
            chip_type,
            step,
            error,
        } => {
            let context = format!("Chip type {chip_type} failed at {step}");
            Err(record_failure(&diagnostics, &context, error))
        }
    }
}

/// Persist the trace and turn the failure into the CLI's error.
fn record_failure(diagnostics: &DiagnosticLog, context: &str, error: &BurnError) -> anyhow::Error {
    error!("{context}: {error}");
    if diagnostics.append(&format_trace(context, error)) {
        anyhow!(
            "{context}: {error}\nDetails were written to {}",
            diagnostics.path().display()
        )
    } else {
        anyhow!("{context}: {error}")
    }
}

fn resolve_chips(args: ResolveArgs) -> Result<()> {
    let resolver = ArtifactResolver::new(ResolverConfig::default());
    let mut failures = 0;
    for chip in &args.chips {
        let token = ChipTypeToken::new(chip.as_str());
        match resolver.resolve_detailed(&token, &args.root) {
            Ok(resolution) => println!(
                "{token}: {} ({:?})",
                resolution.path.display(),
                resolution.tier
            ),
            Err(e) => {
                failures += 1;
                println!("{token}: {e}");
            }
        }
    }
    if failures > 0 {
        return Err(anyhow!("{failures} chip type(s) did not resolve"));
    }
    Ok(())
}

fn list_chips(args: ChipsArgs) -> Result<()> {
    let chips = load_chip_list_file(&args.file)
        .with_context(|| format!("Reading chip list {}", args.file.display()))?;
    for (i, chip) in chips.iter().enumerate() {
        println!("{:>3}  {chip}", i + 1);
    }
    Ok(())
}
