//! Reporting and export — JSON, CSV, and Markdown artifacts for a run.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: the per-bar table (signal, confidence, returns, cumulative curves)
//! - **Markdown**: candidate scores and the metrics table
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::evaluator::BarRecord;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.8}")).unwrap_or_default()
}

/// Per-bar table as CSV. Undefined first-row returns are left empty.
pub fn export_bars_csv(records: &[BarRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "bar_index",
        "close",
        "signal",
        "confidence",
        "returns",
        "strategy",
        "cumulative_returns",
        "cumulative_strategy",
    ])?;
    for r in records {
        wtr.write_record([
            r.timestamp.to_string(),
            r.bar_index.to_string(),
            format!("{:.4}", r.close),
            r.signal.to_string(),
            format!("{:.4}", r.confidence),
            optional(r.market_return),
            optional(r.strategy_return),
            optional(r.cumulative_market),
            optional(r.cumulative_strategy),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Markdown report ────────────────────────────────────────────────

pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(1024);

    md.push_str("# PredictLab Report\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Bars | {} |\n", result.bar_count));
    md.push_str(&format!("| Labeled rows | {} |\n", result.labeled_rows));
    md.push_str(&format!(
        "| Positive rate | {:.2}% |\n",
        result.positive_rate * 100.0
    ));
    md.push_str(&format!("| Signals | {} |\n", result.signal_count()));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    md.push_str(&format!("| Config Hash | {} |\n", result.config_hash));
    if result.synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Candidates\n\n");
    md.push_str("| Model | CV Accuracy | In Ensemble |\n");
    md.push_str("| --- | --- | --- |\n");
    for c in &result.candidates {
        let member = result.ensemble_members.iter().any(|m| m == c.name());
        md.push_str(&format!(
            "| {} | {:.4} | {} |\n",
            c.name(),
            c.score,
            if member { "yes" } else { "" }
        ));
    }
    md.push_str(&format!(
        "\nHeld-out accuracy: {:.4}\n\n",
        result.holdout_accuracy
    ));

    md.push_str("## Performance\n\n");
    md.push_str("| Metric | Strategy | Market |\n");
    md.push_str("| --- | --- | --- |\n");
    for row in result.metrics.rows() {
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            row.metric, row.strategy, row.market
        ));
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

fn short(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}

/// Save `result.json`, `bars.csv` and `report.md` under `output_dir`.
///
/// The run directory is named from the dataset and config hashes, so the
/// same run always lands in the same place. Returns that directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "run_{}_{}",
        short(&result.dataset_hash),
        short(&result.config_hash)
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("result.json"), export_json(result)?)?;
    std::fs::write(run_dir.join("bars.csv"), export_bars_csv(&result.records)?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(result))?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
