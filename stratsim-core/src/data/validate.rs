//! Price series validation — the gate in front of the simulation.
//!
//! Checks run in a fixed order so callers always see the most fundamental
//! problem first: empty → missing columns → too few rows → per-row checks.

use crate::domain::{PriceBar, PriceSeries};
use crate::error::ValidationError;

use super::frame::{PriceFrame, REQUIRED_COLUMNS};

/// Minimum number of bars a backtest needs.
pub const MIN_ROWS: usize = 5;

/// Validate a columnar frame and convert it into a [`PriceSeries`].
pub fn validate_frame(frame: &PriceFrame) -> Result<PriceSeries, ValidationError> {
    validate_frame_with_min_rows(frame, MIN_ROWS)
}

pub fn validate_frame_with_min_rows(
    frame: &PriceFrame,
    min_rows: usize,
) -> Result<PriceSeries, ValidationError> {
    if frame.is_empty() {
        return Err(ValidationError::EmptySeries);
    }

    let missing = frame.missing_columns();
    if !missing.is_empty() {
        return Err(ValidationError::MissingColumns(missing));
    }

    let rows = frame.row_count();
    if rows < min_rows {
        return Err(ValidationError::InsufficientRows { rows, min: min_rows });
    }

    let mut columns: [&[f64]; 5] = [&[]; 5];
    for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
        // Presence checked above.
        let values = frame.column(name).unwrap_or(&[]);
        if values.len() != rows {
            return Err(ValidationError::ColumnLengthMismatch {
                column: name.to_string(),
                expected: rows,
                actual: values.len(),
            });
        }
        *slot = values;
    }

    let [open, high, low, close, volume] = columns;
    let bars = (0..rows)
        .map(|i| PriceBar {
            timestamp: frame.timestamps[i],
            open: open[i],
            high: high[i],
            low: low[i],
            close: close[i],
            volume: volume[i],
        })
        .collect();

    check_bars(bars)
}

/// Validate bars that are already in row form.
pub fn validate_bars(bars: Vec<PriceBar>) -> Result<PriceSeries, ValidationError> {
    if bars.is_empty() {
        return Err(ValidationError::EmptySeries);
    }
    if bars.len() < MIN_ROWS {
        return Err(ValidationError::InsufficientRows {
            rows: bars.len(),
            min: MIN_ROWS,
        });
    }
    check_bars(bars)
}

fn check_bars(bars: Vec<PriceBar>) -> Result<PriceSeries, ValidationError> {
    for (row, bar) in bars.iter().enumerate() {
        let fields = [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
            ("volume", bar.volume),
        ];
        if let Some((column, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ValidationError::NonFiniteValue {
                column: column.to_string(),
                row,
            });
        }
        if bar.high < bar.low {
            return Err(ValidationError::InvalidBar {
                row,
                reason: format!("high {} below low {}", bar.high, bar.low),
            });
        }
        if bar.low < 0.0 {
            return Err(ValidationError::InvalidBar {
                row,
                reason: format!("negative low {}", bar.low),
            });
        }
        if row > 0 && bar.timestamp <= bars[row - 1].timestamp {
            return Err(ValidationError::UnorderedTimestamps { row });
        }
    }
    Ok(PriceSeries::from_validated(bars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(i: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + chrono::Duration::days(i)
    }

    fn frame(rows: usize) -> PriceFrame {
        let closes: Vec<f64> = (0..rows).map(|i| 100.0 + i as f64).collect();
        PriceFrame::new((0..rows as i64).map(ts).collect())
            .with_column("open", closes.clone())
            .with_column("high", closes.iter().map(|c| c + 1.0).collect())
            .with_column("low", closes.iter().map(|c| c - 1.0).collect())
            .with_column("close", closes.clone())
            .with_column("volume", vec![1_000.0; rows])
    }

    #[test]
    fn accepts_valid_frame() {
        let series = validate_frame(&frame(10)).unwrap();
        assert_eq!(series.len(), 10);
        assert_eq!(series.first().close, 100.0);
    }

    #[test]
    fn empty_frame_rejected_first() {
        // Empty and missing columns: emptiness wins.
        let err = validate_frame(&PriceFrame::default()).unwrap_err();
        assert_eq!(err, ValidationError::EmptySeries);
    }

    #[test]
    fn missing_columns_checked_before_row_count() {
        let mut f = frame(3);
        f.remove_column("volume");
        let err = validate_frame(&f).unwrap_err();
        assert_eq!(err, ValidationError::MissingColumns(vec!["volume".into()]));
    }

    #[test]
    fn four_rows_is_insufficient() {
        let err = validate_frame(&frame(4)).unwrap_err();
        assert_eq!(err, ValidationError::InsufficientRows { rows: 4, min: 5 });
    }

    #[test]
    fn five_rows_missing_volume_names_volume() {
        let mut f = frame(5);
        f.remove_column("volume");
        let err = validate_frame(&f).unwrap_err();
        assert!(err.to_string().contains("volume"));
    }

    #[test]
    fn ragged_column_rejected() {
        let mut f = frame(6);
        f.insert_column("close", vec![1.0; 5]);
        assert!(matches!(
            validate_frame(&f).unwrap_err(),
            ValidationError::ColumnLengthMismatch { actual: 5, expected: 6, .. }
        ));
    }

    #[test]
    fn nan_value_rejected_with_location() {
        let mut f = frame(6);
        let mut closes = f.column("close").unwrap().to_vec();
        closes[3] = f64::NAN;
        f.insert_column("close", closes);
        assert_eq!(
            validate_frame(&f).unwrap_err(),
            ValidationError::NonFiniteValue {
                column: "close".into(),
                row: 3
            }
        );
    }

    #[test]
    fn inverted_bar_rejected() {
        let mut f = frame(6);
        f.insert_column("high", vec![50.0; 6]);
        assert!(matches!(
            validate_frame(&f).unwrap_err(),
            ValidationError::InvalidBar { row: 0, .. }
        ));
    }

    #[test]
    fn duplicate_timestamp_rejected() {
        let mut f = frame(6);
        f.timestamps[4] = f.timestamps[3];
        assert_eq!(
            validate_frame(&f).unwrap_err(),
            ValidationError::UnorderedTimestamps { row: 4 }
        );
    }

    #[test]
    fn extra_columns_are_ignored() {
        let f = frame(6).with_column("adj_close", vec![1.0; 6]);
        assert!(validate_frame(&f).is_ok());
    }

    #[test]
    fn validate_bars_applies_same_rules() {
        assert_eq!(
            validate_bars(Vec::new()).unwrap_err(),
            ValidationError::EmptySeries
        );
    }
}
