//! Bar loading for the runner.
//!
//! Two sources:
//! 1. A CSV file with a header row (`timestamp,open,high,low,close,volume`,
//!    case-insensitive, extra columns ignored)
//! 2. A seeded synthetic random walk for development runs
//!
//! Either way the result is a schema-validated `PriceFrame` plus a BLAKE3
//! dataset hash for provenance.

use std::io::Read;
use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::info;

use predictlab_core::domain::frame::{CLOSE, HIGH, LOW, OPEN, VOLUME};
use predictlab_core::domain::{PriceBar, PriceFrame};
use predictlab_core::schema::{self, SchemaError};

/// Header names accepted for the timestamp column.
const TIMESTAMP_HEADERS: &[&str] = &["timestamp", "datetime", "date", "time"];

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no timestamp column (expected one of: {})", TIMESTAMP_HEADERS.join(", "))]
    MissingTimestamp,

    #[error("line {line}: cannot parse timestamp '{value}'")]
    InvalidTimestamp { line: usize, value: String },

    #[error("line {line}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        line: usize,
        column: String,
        value: String,
    },

    #[error("schema violation: {0}")]
    Schema(#[from] SchemaError),
}

/// Bars plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub frame: PriceFrame,
    /// BLAKE3 over timestamps and every column.
    pub dataset_hash: String,
    /// Whether the bars came from the synthetic generator.
    pub synthetic: bool,
}

impl LoadedData {
    pub fn from_frame(frame: PriceFrame, synthetic: bool) -> Self {
        let dataset_hash = compute_dataset_hash(&frame);
        Self {
            frame,
            dataset_hash,
            synthetic,
        }
    }
}

/// Load and validate a CSV file.
pub fn load_csv(path: &Path) -> Result<LoadedData, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let frame = read_csv(file)?;
    info!(path = %path.display(), bars = frame.len(), "loaded CSV bars");
    Ok(LoadedData::from_frame(frame, false))
}

/// Parse CSV bars from any reader and validate the resulting frame.
pub fn read_csv<R: Read>(reader: R) -> Result<PriceFrame, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();

    let ts_col = headers
        .iter()
        .position(|h| TIMESTAMP_HEADERS.contains(&h.as_str()))
        .ok_or(LoadError::MissingTimestamp)?;
    let value_cols: Vec<(usize, &str)> = [OPEN, HIGH, LOW, CLOSE, VOLUME]
        .into_iter()
        .filter_map(|name| headers.iter().position(|h| h == name).map(|i| (i, name)))
        .collect();

    let mut timestamps = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); value_cols.len()];

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        // header is line 1
        let line = row + 2;
        let raw_ts = record.get(ts_col).unwrap_or_default();
        timestamps.push(parse_timestamp(raw_ts).ok_or_else(|| LoadError::InvalidTimestamp {
            line,
            value: raw_ts.to_string(),
        })?);

        for ((idx, name), column) in value_cols.iter().zip(columns.iter_mut()) {
            let raw = record.get(*idx).unwrap_or_default();
            let value = raw.parse::<f64>().map_err(|_| LoadError::InvalidNumber {
                line,
                column: (*name).to_string(),
                value: raw.to_string(),
            })?;
            column.push(value);
        }
    }

    let mut frame = PriceFrame::new(timestamps);
    for ((_, name), values) in value_cols.into_iter().zip(columns) {
        frame.insert_column(name, values);
    }
    schema::validate(&frame)?;
    Ok(frame)
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Synthetic bars wrapped with provenance.
pub fn load_synthetic(n: usize, seed: u64) -> LoadedData {
    let frame = PriceFrame::from_bars(&generate_synthetic_bars(n, seed));
    info!(bars = n, seed, "generated synthetic bars");
    LoadedData::from_frame(frame, true)
}

/// Hourly random walk from 100.0 starting 2024-01-02 00:00.
///
/// Deterministic in `seed`. Clearly fake data, for development only.
pub fn generate_synthetic_bars(n: usize, seed: u64) -> Vec<PriceBar> {
    let seed_bytes = blake3::hash(format!("synthetic/{seed}").as_bytes());
    let mut rng = StdRng::from_seed(*seed_bytes.as_bytes());

    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let mut price = 100.0_f64;
    let mut bars = Vec::with_capacity(n);

    for i in 0..n {
        let bar_return: f64 = rng.gen_range(-0.01..0.01);
        let open = price;
        let close = price * (1.0 + bar_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.003));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.003));
        let volume = rng.gen_range(5_000.0..50_000.0_f64).round();

        bars.push(PriceBar {
            timestamp: start + Duration::hours(i as i64),
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
    }

    bars
}

/// Compute a deterministic BLAKE3 hash over all bar data.
///
/// Columns are visited in name order, so the hash does not depend on the
/// order they were inserted in.
pub fn compute_dataset_hash(frame: &PriceFrame) -> String {
    let mut hasher = blake3::Hasher::new();
    for ts in frame.timestamps() {
        hasher.update(ts.to_string().as_bytes());
    }
    for name in frame.column_names() {
        hasher.update(name.as_bytes());
        for v in frame.column(name).unwrap_or_default() {
            hasher.update(&v.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
