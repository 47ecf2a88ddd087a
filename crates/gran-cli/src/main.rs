//! granulo - grayscale granulometry CLI
//!
//! Measures how image intensity responds to morphological operators of
//! growing size and turns it into a size distribution.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::ParamArgs;

#[derive(Parser)]
#[command(name = "granulo")]
#[command(author, version, about = "Grayscale granulometry of images")]
#[command(long_about = "
Computes granulometric curves: the image volume after openings, closings,
erosions or dilations with structuring elements of growing size, and the
size distribution derived from it.

Examples:
  granulo curve grains.png --op opening --shape disk --max 21 --step 2
  granulo curve grains.png --params run.yaml --json
  granulo batch images/ --op closing --shape square --max 51 --parallel
  granulo batch 'images/*.tif' --glob -o results/
  granulo stats results/images_ClSq51.gr.txt
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Also write the log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Volume curve, distribution and statistics of one image
    Curve(CurveArgs),

    /// Granulometry of every image in a directory or glob
    Batch(BatchArgs),

    /// Recompute statistics from a saved distribution table
    Stats(StatsArgs),
}

#[derive(Args)]
struct CurveArgs {
    /// Input image (PNG or TIFF)
    input: PathBuf,

    #[command(flatten)]
    params: ParamArgs,

    /// Write the volume curve as a table
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct BatchArgs {
    /// Input directory, or a glob pattern with --glob
    input: String,

    /// Treat the input as a glob pattern
    #[arg(long)]
    glob: bool,

    #[command(flatten)]
    params: ParamArgs,

    /// Output directory, or the summary file path when it ends in .txt
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Process images concurrently
    #[arg(long)]
    parallel: bool,

    /// Print results as JSON instead of writing tables
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct StatsArgs {
    /// Distribution table (.gr.txt)
    input: PathBuf,

    /// Output table (prints to stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `-v`. The returned guard flushes the file writer
/// and must outlive the run.
fn init_logging(verbose: u8, log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            builder
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to set up logging: {}", e))?;
            Ok(Some(guard))
        }
        None => {
            builder
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to set up logging: {}", e))?;
            Ok(None)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_file.as_ref())?;

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let verbose = cli.verbose > 0;
    match cli.command {
        Commands::Curve(args) => commands::curve::run(args, verbose),
        Commands::Batch(args) => commands::batch::run(args, verbose),
        Commands::Stats(args) => commands::stats::run(args, verbose),
    }
}
