//! Price data loading for the runner.
//!
//! Two sources:
//! 1. CSV file → columnar [`PriceFrame`] (header names case-insensitive)
//! 2. Seeded synthetic random walk
//!
//! Loading never validates: missing columns, short series and bad values are
//! reported by the engine's validator with its own error types.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use stratsim_core::data::REQUIRED_COLUMNS;
use stratsim_core::PriceFrame;

use crate::config::DataConfig;

/// Header names accepted for the timestamp column.
pub const TIMESTAMP_COLUMNS: [&str; 3] = ["date", "timestamp", "datetime"];

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{source_name}': {source}")]
    Csv {
        source_name: String,
        #[source]
        source: csv::Error,
    },

    #[error("'{source_name}' has no date/timestamp/datetime column")]
    NoTimestampColumn { source_name: String },

    #[error("'{source_name}' row {row}: cannot parse timestamp '{value}'")]
    BadTimestamp {
        source_name: String,
        row: usize,
        value: String,
    },

    #[error("'{source_name}' row {row}: column '{column}' is not numeric: '{value}'")]
    BadNumber {
        source_name: String,
        row: usize,
        column: String,
        value: String,
    },
}

/// Load the frame a [`DataConfig`] points at.
pub fn load_data(config: &DataConfig) -> Result<PriceFrame, LoadError> {
    match config {
        DataConfig::Csv { path } => load_csv(path),
        DataConfig::Synthetic { seed, bars, start } => Ok(generate_synthetic(*seed, *bars, *start)),
    }
}

pub fn load_csv(path: &Path) -> Result<PriceFrame, LoadError> {
    let source_name = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| LoadError::Csv {
        source_name: source_name.clone(),
        source: csv::Error::from(e),
    })?;
    let frame = read_csv(file, &source_name)?;
    tracing::debug!(path = %path.display(), rows = frame.row_count(), "loaded csv");
    Ok(frame)
}

/// Parse CSV text into a frame.
///
/// Empty cells become NaN so validation can name the row. A non-numeric
/// value fails the load for an OHLCV column; any other such column is dropped.
pub fn read_csv<R: Read>(reader: R, source_name: &str) -> Result<PriceFrame, LoadError> {
    let csv_err = |source| LoadError::Csv {
        source_name: source_name.to_string(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    let ts_idx = headers
        .iter()
        .position(|h| TIMESTAMP_COLUMNS.contains(&h.as_str()))
        .ok_or_else(|| LoadError::NoTimestampColumn {
            source_name: source_name.to_string(),
        })?;

    let mut timestamps = Vec::new();
    let mut columns: BTreeMap<usize, Vec<f64>> = (0..headers.len())
        .filter(|&i| i != ts_idx)
        .map(|i| (i, Vec::new()))
        .collect();
    let mut dropped: Vec<usize> = Vec::new();

    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let raw_ts = record.get(ts_idx).unwrap_or("");
        let ts = parse_timestamp(raw_ts).ok_or_else(|| LoadError::BadTimestamp {
            source_name: source_name.to_string(),
            row,
            value: raw_ts.to_string(),
        })?;
        timestamps.push(ts);

        for (&idx, values) in columns.iter_mut() {
            let cell = record.get(idx).unwrap_or("");
            let value = if cell.is_empty() {
                f64::NAN
            } else {
                match cell.parse::<f64>() {
                    Ok(v) => v,
                    Err(_) if REQUIRED_COLUMNS.contains(&headers[idx].as_str()) => {
                        return Err(LoadError::BadNumber {
                            source_name: source_name.to_string(),
                            row,
                            column: headers[idx].clone(),
                            value: cell.to_string(),
                        });
                    }
                    Err(_) => {
                        if !dropped.contains(&idx) {
                            dropped.push(idx);
                        }
                        f64::NAN
                    }
                }
            };
            values.push(value);
        }
    }

    let mut frame = PriceFrame::new(timestamps);
    for (idx, values) in columns {
        if dropped.contains(&idx) {
            tracing::debug!(column = %headers[idx], "dropping non-numeric column");
            continue;
        }
        frame.insert_column(&headers[idx], values);
    }
    Ok(frame)
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Seeded daily random walk over weekdays starting at `start`.
///
/// The same seed always produces the same frame.
pub fn generate_synthetic(seed: u64, bars: usize, start: NaiveDate) -> PriceFrame {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let mut timestamps = Vec::with_capacity(bars);
    let (mut open_col, mut high_col, mut low_col, mut close_col, mut volume_col) = (
        Vec::with_capacity(bars),
        Vec::with_capacity(bars),
        Vec::with_capacity(bars),
        Vec::with_capacity(bars),
        Vec::with_capacity(bars),
    );

    let mut price = 100.0_f64;
    let mut current = start;
    while timestamps.len() < bars {
        // Skip weekends (simple heuristic)
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(500_000..5_000_000u64) as f64;

        timestamps.push(current.and_time(NaiveTime::MIN));
        open_col.push(open);
        high_col.push(high);
        low_col.push(low);
        close_col.push(close);
        volume_col.push(volume);

        price = close;
        current += chrono::Duration::days(1);
    }

    PriceFrame::new(timestamps)
        .with_column("open", open_col)
        .with_column("high", high_col)
        .with_column("low", low_col)
        .with_column("close", close_col)
        .with_column("volume", volume_col)
}

/// BLAKE3 over the frame's canonical JSON, for provenance in reports.
pub fn dataset_hash(frame: &PriceFrame) -> String {
    match serde_json::to_vec(frame) {
        Ok(bytes) => blake3::hash(&bytes).to_hex().to_string(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Date,Open,High,Low,Close,Volume,Symbol
2024-01-02,100.0,101.5,99.0,101.0,12000,SPY
2024-01-03,101.0,102.0,100.5,101.8,13000,SPY
2024-01-04,101.8,103.0,101.0,102.5,,SPY
";

    #[test]
    fn reads_case_insensitive_headers() {
        let frame = read_csv(CSV.as_bytes(), "inline").unwrap();
        assert_eq!(frame.row_count(), 3);
        assert!(frame.missing_columns().is_empty());
        assert_eq!(frame.column("close").unwrap(), &[101.0, 101.8, 102.5]);
        assert_eq!(
            frame.timestamps[0],
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn empty_cell_becomes_nan_and_text_column_is_dropped() {
        let frame = read_csv(CSV.as_bytes(), "inline").unwrap();
        assert!(frame.column("volume").unwrap()[2].is_nan());
        assert!(!frame.has_column("symbol"));
    }

    #[test]
    fn missing_columns_are_left_to_validation() {
        let frame = read_csv("timestamp,close\n2024-01-02 09:30:00,1.0\n".as_bytes(), "inline").unwrap();
        assert_eq!(frame.row_count(), 1);
        assert_eq!(frame.missing_columns(), vec!["open", "high", "low", "volume"]);
    }

    #[test]
    fn no_timestamp_column() {
        let err = read_csv("open,close\n1,2\n".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, LoadError::NoTimestampColumn { .. }));
    }

    #[test]
    fn bad_timestamp_names_row() {
        let err = read_csv("date,close\n2024-01-02,1\nyesterday,2\n".as_bytes(), "inline").unwrap_err();
        match err {
            LoadError::BadTimestamp { row, value, .. } => {
                assert_eq!(row, 1);
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_numeric_price_is_an_error() {
        let err = read_csv("date,close\n2024-01-02,abc\n".as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, LoadError::BadNumber { ref column, .. } if column == "close"));
    }

    #[test]
    fn timestamp_formats() {
        assert!(parse_timestamp("2024-01-02").is_some());
        assert!(parse_timestamp("2024-01-02 15:30:00").is_some());
        assert!(parse_timestamp("2024-01-02T15:30:00").is_some());
        assert!(parse_timestamp("02/01/2024").is_none());
    }

    #[test]
    fn synthetic_is_deterministic_and_sane() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let a = generate_synthetic(7, 300, start);
        let b = generate_synthetic(7, 300, start);
        assert_eq!(a, b);
        assert_eq!(a.row_count(), 300);
        assert_ne!(a, generate_synthetic(8, 300, start));

        let series = stratsim_core::validate_frame(&a).unwrap();
        assert_eq!(series.len(), 300);
        assert!(series
            .bars()
            .iter()
            .all(|b| b.timestamp.weekday() != chrono::Weekday::Sat
                && b.timestamp.weekday() != chrono::Weekday::Sun));
    }

    #[test]
    fn dataset_hash_tracks_content() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let a = generate_synthetic(1, 50, start);
        assert_eq!(dataset_hash(&a), dataset_hash(&a.clone()));
        assert_ne!(dataset_hash(&a), dataset_hash(&generate_synthetic(2, 50, start)));
    }
}
