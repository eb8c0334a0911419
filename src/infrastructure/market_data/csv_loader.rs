//! OHLCV history from CSV files.
//!
//! Expected columns: `timestamp,open,high,low,close,volume` (capitalized
//! headers as exported by common downloaders are accepted too). The timestamp
//! may be epoch milliseconds, RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`.

use crate::domain::market::observation::Observation;
use crate::domain::market::series_buffer::SeriesBuffer;
use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct OhlcvRecord {
    #[serde(alias = "Timestamp", alias = "Date", alias = "Datetime", alias = "time")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close")]
    close: f64,
    #[serde(alias = "Volume")]
    volume: f64,
}

/// Loads a CSV file into a buffer, failing on malformed or out-of-order rows.
pub fn load_series(path: &Path) -> Result<SeriesBuffer> {
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let buffer = read_series(BufReader::new(file))
        .with_context(|| format!("Failed to load OHLCV data from {:?}", path))?;
    info!("Loaded {} observations from {:?}", buffer.len(), path);
    Ok(buffer)
}

/// Parses CSV content from any reader.
pub fn read_series<R: Read>(reader: R) -> Result<SeriesBuffer> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut buffer = SeriesBuffer::new();

    for (row, result) in rdr.deserialize().enumerate() {
        // Header is line 1
        let line = row + 2;
        let record: OhlcvRecord = result.with_context(|| format!("Malformed row at line {}", line))?;
        let timestamp = parse_timestamp(&record.timestamp)
            .with_context(|| format!("Bad timestamp at line {}", line))?;

        buffer
            .append(Observation::new(
                timestamp,
                record.open,
                record.high,
                record.low,
                record.close,
                record.volume,
            ))
            .with_context(|| format!("Rejected row at line {}", line))?;
    }

    Ok(buffer)
}

/// Epoch milliseconds from the accepted timestamp formats.
pub fn parse_timestamp(raw: &str) -> Result<i64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc().timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        && let Some(dt) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(dt.and_utc().timestamp_millis());
    }
    bail!("Unrecognized timestamp '{}'", raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::SeriesError;

    #[test]
    fn test_read_series_epoch_millis() {
        let data = "timestamp,open,high,low,close,volume\n\
                    1000,1.0,2.0,0.5,1.5,100\n\
                    2000,1.5,2.5,1.0,2.0,150\n";
        let buffer = read_series(data.as_bytes()).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.get(1).unwrap().close, 2.0);
        assert_eq!(buffer.get(0).unwrap().timestamp, 1000);
    }

    #[test]
    fn test_read_series_capitalized_headers_and_dates() {
        let data = "Date,Open,High,Low,Close,Volume\n\
                    2024-01-01,1,2,0.5,1.5,100\n\
                    2024-01-02,1.5,2.5,1,2,150\n";
        let buffer = read_series(data.as_bytes()).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.get(0).unwrap().timestamp, 1_704_067_200_000);
    }

    #[test]
    fn test_read_series_rejects_out_of_order() {
        let data = "timestamp,open,high,low,close,volume\n\
                    2000,1,1,1,1,1\n\
                    1000,1,1,1,1,1\n";
        let err = read_series(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"));
        assert!(matches!(
            err.downcast_ref::<SeriesError>(),
            Some(SeriesError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn test_read_series_rejects_bad_number() {
        let data = "timestamp,open,high,low,close,volume\n1000,1,1,1,abc,1\n";
        assert!(read_series(data.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("1700000000000").unwrap(), 1_700_000_000_000);
        assert_eq!(
            parse_timestamp("2024-01-01T00:00:00Z").unwrap(),
            1_704_067_200_000
        );
        assert_eq!(
            parse_timestamp("2024-01-01 00:01:00").unwrap(),
            1_704_067_260_000
        );
        assert!(parse_timestamp("yesterday").is_err());
    }
}
