//! Latest and historical rate artifacts.
//!
//! Each writer is independent: it logs its own failure and returns `None`,
//! so one broken artifact never stops the others from being written.
use chrono::{DateTime, NaiveDate, Utc};
use ratewatch_common::ExtractedRates;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::record::{build_records, RateRecord};
use crate::StoreResult;

/// File name of the dated history artifact, e.g. `2025-03-01_rates.csv`.
pub fn historical_filename(date: NaiveDate) -> String {
    format!("{}_rates.csv", date.format("%Y-%m-%d"))
}

/// Write `rates` as CSV to `dir/filename`, creating `dir` if needed.
///
/// An empty mapping leaves the file untouched but still reports its path.
pub fn save_csv(
    dir: &Path,
    filename: &str,
    rates: &ExtractedRates,
    at: DateTime<Utc>,
) -> Option<PathBuf> {
    let path = dir.join(filename);
    match write_csv(dir, &path, rates, at) {
        Ok(()) => {
            info!(target: "store.csv", path = %path.display(), "CSV saved");
            Some(path)
        }
        Err(e) => {
            error!(target: "store.csv", path = %path.display(), error = %e, "Failed to save CSV");
            None
        }
    }
}

fn write_csv(dir: &Path, path: &Path, rates: &ExtractedRates, at: DateTime<Utc>) -> StoreResult<()> {
    fs::create_dir_all(dir)?;
    let records = build_records(rates, at)?;
    if records.is_empty() {
        return Ok(());
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in &records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `rates` as a pretty-printed JSON array to `dir/filename`.
pub fn save_json(
    dir: &Path,
    filename: &str,
    rates: &ExtractedRates,
    at: DateTime<Utc>,
) -> Option<PathBuf> {
    let path = dir.join(filename);
    match write_json(dir, &path, rates, at) {
        Ok(()) => {
            info!(target: "store.json", path = %path.display(), "JSON saved");
            Some(path)
        }
        Err(e) => {
            error!(target: "store.json", path = %path.display(), error = %e, "Failed to save JSON");
            None
        }
    }
}

fn write_json(dir: &Path, path: &Path, rates: &ExtractedRates, at: DateTime<Utc>) -> StoreResult<()> {
    fs::create_dir_all(dir)?;
    let records = build_records(rates, at)?;
    write_pretty_json(path, &records)
}

pub(crate) fn write_pretty_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Read records back from a CSV artifact.
pub fn read_csv(path: &Path) -> StoreResult<Vec<RateRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for record in reader.deserialize() {
        out.push(record?);
    }
    Ok(out)
}

/// Read records back from a JSON artifact.
pub fn read_json(path: &Path) -> StoreResult<Vec<RateRecord>> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ratewatch_common::ExtractionMethod;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap()
    }

    #[test]
    fn dated_filename() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(historical_filename(d), "2025-03-01_rates.csv");
    }

    #[test]
    fn csv_and_json_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("data");
        let rates: ExtractedRates = vec![("US Dollar", "3.6725")].into_iter().collect();

        let csv_path = save_csv(&dir, "latest_rates.csv", &rates, at()).expect("csv saved");
        let json_path = save_json(&dir, "latest_rates.json", &rates, at()).expect("json saved");

        for records in [read_csv(&csv_path).unwrap(), read_json(&json_path).unwrap()] {
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].currency, "US Dollar");
            assert_eq!(records[0].rate, "3.6725");
            assert_eq!(records[0].rate_float, 3.6725);
            assert_eq!(records[0].extraction_method, ExtractionMethod::SeleniumSimple);
        }
    }

    #[test]
    fn csv_has_expected_header_and_row() {
        let tmp = tempfile::tempdir().unwrap();
        let rates: ExtractedRates = vec![("Euro", "4.0021")].into_iter().collect();
        let path = save_csv(tmp.path(), "latest_rates.csv", &rates, at()).unwrap();

        let text = fs::read_to_string(path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("currency,rate,rate_float,extraction_timestamp,extraction_method")
        );
        assert_eq!(
            lines.next(),
            Some("Euro,4.0021,4.0021,2025-03-01T08:30:00.000000+00:00,selenium_simple")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn json_keeps_non_ascii_text() {
        let tmp = tempfile::tempdir().unwrap();
        let rates: ExtractedRates = vec![("Yuan Renminbi (人民币)", "0.5071")].into_iter().collect();
        let path = save_json(tmp.path(), "latest_rates.json", &rates, at()).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("人民币"));
        assert!(text.starts_with("[\n  {"));
    }

    #[test]
    fn empty_mapping_writes_no_csv() {
        let tmp = tempfile::tempdir().unwrap();
        let path = save_csv(tmp.path(), "latest_rates.csv", &ExtractedRates::new(), at()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn malformed_rate_omits_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let rates: ExtractedRates = vec![("Euro", "four")].into_iter().collect();
        assert!(save_csv(tmp.path(), "latest_rates.csv", &rates, at()).is_none());
        assert!(save_json(tmp.path(), "latest_rates.json", &rates, at()).is_none());
        assert!(!tmp.path().join("latest_rates.json").exists());
    }
}
