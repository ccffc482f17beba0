//! Price-frame schema contract — the boundary between market-data collaborators
//! and the feature engine.
//!
//! - Required columns: `close`, `volume` (OHLC extras are optional)
//! - Every column has one value per timestamp
//! - Timestamps strictly increasing, no duplicates

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::frame::{CLOSE, VOLUME};
use crate::domain::PriceFrame;

/// Columns the feature engine cannot run without.
pub const REQUIRED_COLUMNS: &[&str] = &[CLOSE, VOLUME];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("column '{column}' has {actual} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("timestamps not strictly increasing at row {index}: {previous} then {current}")]
    UnorderedTimestamps {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },
}

/// Validate a frame against the schema contract.
///
/// Checks run in a fixed order (required columns, column lengths, timestamp
/// order) and the first violation wins.
pub fn validate(frame: &PriceFrame) -> Result<(), SchemaError> {
    for name in REQUIRED_COLUMNS {
        if frame.column(name).is_none() {
            return Err(SchemaError::MissingColumn(name.to_string()));
        }
    }

    let expected = frame.len();
    for name in frame.column_names() {
        let actual = frame.column(name).map_or(0, |c| c.len());
        if actual != expected {
            return Err(SchemaError::LengthMismatch {
                column: name.to_string(),
                expected,
                actual,
            });
        }
    }

    for (i, w) in frame.timestamps().windows(2).enumerate() {
        if w[1] <= w[0] {
            return Err(SchemaError::UnorderedTimestamps {
                index: i + 1,
                previous: w[0],
                current: w[1],
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn valid_frame() -> PriceFrame {
        PriceFrame::new(vec![ts(9), ts(10), ts(11)])
            .with_column(CLOSE, vec![1.0, 2.0, 3.0])
            .with_column(VOLUME, vec![10.0, 10.0, 10.0])
    }

    #[test]
    fn valid_frame_passes() {
        assert_eq!(validate(&valid_frame()), Ok(()));
    }

    #[test]
    fn missing_close_fails() {
        let mut frame = valid_frame();
        frame.remove_column(CLOSE);
        assert_eq!(
            validate(&frame),
            Err(SchemaError::MissingColumn("close".into()))
        );
    }

    #[test]
    fn missing_volume_fails() {
        let mut frame = valid_frame();
        frame.remove_column(VOLUME);
        assert_eq!(
            validate(&frame),
            Err(SchemaError::MissingColumn("volume".into()))
        );
    }

    #[test]
    fn short_column_fails() {
        let frame = valid_frame().with_column("open", vec![1.0]);
        assert!(matches!(
            validate(&frame),
            Err(SchemaError::LengthMismatch { ref column, expected: 3, actual: 1 }) if column == "open"
        ));
    }

    #[test]
    fn duplicate_timestamp_fails() {
        let frame = PriceFrame::new(vec![ts(9), ts(10), ts(10)])
            .with_column(CLOSE, vec![1.0, 2.0, 3.0])
            .with_column(VOLUME, vec![10.0, 10.0, 10.0]);
        assert!(matches!(
            validate(&frame),
            Err(SchemaError::UnorderedTimestamps { index: 2, .. })
        ));
    }

    #[test]
    fn empty_frame_with_columns_passes() {
        let frame = PriceFrame::new(vec![])
            .with_column(CLOSE, vec![])
            .with_column(VOLUME, vec![]);
        assert_eq!(validate(&frame), Ok(()));
    }
}
