//! PriceFrame — columnar view over a bar sequence.
//!
//! Market-data collaborators hand over named columns (CSV headers, dataframe
//! exports). Nothing guarantees that `close` or `volume` is among them, so the
//! frame keeps columns by name and leaves validation to `schema`.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::bar::PriceBar;

pub const OPEN: &str = "open";
pub const HIGH: &str = "high";
pub const LOW: &str = "low";
pub const CLOSE: &str = "close";
pub const VOLUME: &str = "volume";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceFrame {
    timestamps: Vec<NaiveDateTime>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl PriceFrame {
    pub fn new(timestamps: Vec<NaiveDateTime>) -> Self {
        Self {
            timestamps,
            columns: BTreeMap::new(),
        }
    }

    /// Build a frame carrying all five OHLCV columns.
    pub fn from_bars(bars: &[PriceBar]) -> Self {
        let mut frame = Self::new(bars.iter().map(|b| b.timestamp).collect());
        frame.insert_column(OPEN, bars.iter().map(|b| b.open).collect());
        frame.insert_column(HIGH, bars.iter().map(|b| b.high).collect());
        frame.insert_column(LOW, bars.iter().map(|b| b.low).collect());
        frame.insert_column(CLOSE, bars.iter().map(|b| b.close).collect());
        frame.insert_column(VOLUME, bars.iter().map(|b| b.volume).collect());
        frame
    }

    /// Insert (or replace) a named column. Names are stored lowercase.
    pub fn insert_column(&mut self, name: impl AsRef<str>, values: Vec<f64>) {
        self.columns
            .insert(name.as_ref().to_ascii_lowercase(), values);
    }

    pub fn with_column(mut self, name: impl AsRef<str>, values: Vec<f64>) -> Self {
        self.insert_column(name, values);
        self
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Vec<f64>> {
        self.columns.remove(&name.to_ascii_lowercase())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .get(&name.to_ascii_lowercase())
            .map(|v| v.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Number of bars (timestamps) in the frame.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
