//! PredictLab CLI — run the prediction pipeline and inspect configuration.
//!
//! Commands:
//! - `run` — load bars (CSV file or synthetic walk), train, signal, evaluate
//! - `config` — print the default configuration as TOML

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use predictlab_runner::data_loader::{load_csv, load_synthetic};
use predictlab_runner::export::{export_json, save_artifacts};
use predictlab_runner::runner::run_pipeline;
use predictlab_runner::{BacktestResult, PipelineConfig};

#[derive(Parser)]
#[command(
    name = "predictlab",
    about = "PredictLab CLI — ML signal backtests against buy-and-hold"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline on a CSV file or synthetic bars.
    Run {
        /// CSV with a header row: timestamp,open,high,low,close,volume.
        #[arg(long, conflicts_with = "synthetic")]
        csv: Option<PathBuf>,

        /// Generate this many synthetic hourly bars instead of reading a file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for synthetic bars.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the signal probability threshold.
        #[arg(long)]
        threshold: Option<f64>,

        /// Cross-validate candidates in parallel.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Write the full result as JSON to this file.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Save result.json, bars.csv and report.md under this directory.
        #[arg(long)]
        artifacts_dir: Option<PathBuf>,
    },
    /// Print the default configuration as TOML.
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            csv,
            synthetic,
            seed,
            config,
            threshold,
            parallel,
            output,
            artifacts_dir,
        } => run_cmd(
            csv,
            synthetic,
            seed,
            config,
            threshold,
            parallel,
            output,
            artifacts_dir,
        ),
        Commands::Config => {
            print!("{}", PipelineConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_cmd(
    csv: Option<PathBuf>,
    synthetic: Option<usize>,
    seed: u64,
    config_path: Option<PathBuf>,
    threshold: Option<f64>,
    parallel: bool,
    output: Option<PathBuf>,
    artifacts_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::load(&path)?,
        None => PipelineConfig::default(),
    };
    if let Some(t) = threshold {
        config.signal.threshold = t;
    }
    if parallel {
        config.selection.parallel = true;
    }
    config.validate()?;

    let data = match (csv, synthetic) {
        (Some(path), None) => load_csv(&path)?,
        (None, Some(n)) => load_synthetic(n, seed),
        (None, None) => bail!("one of --csv or --synthetic is required"),
        (Some(_), Some(_)) => bail!("--csv and --synthetic are mutually exclusive"),
    };

    let run = run_pipeline(&data, &config)?;
    print_summary(&run.result);

    if let Some(path) = output {
        std::fs::write(&path, export_json(&run.result)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Result written to: {}", path.display());
    }
    if let Some(dir) = artifacts_dir {
        let run_dir = save_artifacts(&run.result, &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn print_summary(result: &BacktestResult) {
    println!();
    println!("=== PredictLab Result ===");
    println!("Bars:           {}", result.bar_count);
    println!("Feature rows:   {}", result.feature_rows);
    println!(
        "Labeled rows:   {} ({:.1}% positive)",
        result.labeled_rows,
        result.positive_rate * 100.0
    );
    println!("Signals:        {}", result.signal_count());
    println!();
    println!("--- Model Scores (CV accuracy) ---");
    for (name, score) in result.scores() {
        let marker = if result.ensemble_members.contains(&name) {
            "*"
        } else {
            " "
        };
        println!("{marker} {name:<22} {score:.4}");
    }
    println!("Held-out accuracy: {:.4}", result.holdout_accuracy);
    for failure in &result.member_failures {
        println!("WARNING: ensemble member dropped: {failure}");
    }
    println!();
    println!("--- Performance ---");
    print!("{}", result.metrics);
    if result.synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}
