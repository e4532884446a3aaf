use chrono::{DateTime, Utc};
use ratewatch_common::{ExtractedRates, ExtractionMethod};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use crate::files::write_pretty_json;
use crate::record::iso_timestamp;
use crate::StoreResult;

/// Facts about a run that are not part of the extracted data.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub duration: Duration,
    pub source_url: String,
    pub extractor_version: String,
    pub target_currencies: Vec<String>,
}

/// Summary of the last extraction run, overwritten every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub last_extraction: String,
    pub extraction_method: ExtractionMethod,
    pub currencies_extracted: usize,
    pub extraction_duration_seconds: f64,
    pub success: bool,
    pub source_url: String,
    pub extractor_version: String,
    pub target_currencies: Vec<String>,
    pub notes: String,
}

impl ExtractionMetadata {
    /// Describe a run; `rates` is `None` (or empty) when extraction failed.
    pub fn new(rates: Option<&ExtractedRates>, stats: &RunStats, at: DateTime<Utc>) -> Self {
        let count = rates.map_or(0, ExtractedRates::len);
        let notes = if count > 0 {
            format!("Extracted {count} currencies successfully")
        } else {
            "Extraction failed".to_string()
        };
        Self {
            last_extraction: iso_timestamp(at),
            extraction_method: ExtractionMethod::SeleniumSimple,
            currencies_extracted: count,
            extraction_duration_seconds: round_centis(stats.duration.as_secs_f64()),
            success: count > 0,
            source_url: stats.source_url.clone(),
            extractor_version: stats.extractor_version.clone(),
            target_currencies: stats.target_currencies.clone(),
            notes,
        }
    }
}

fn round_centis(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

/// Write the metadata record to `dir/filename`.
pub fn save_metadata(
    dir: &Path,
    filename: &str,
    rates: Option<&ExtractedRates>,
    stats: &RunStats,
    at: DateTime<Utc>,
) -> Option<PathBuf> {
    let path = dir.join(filename);
    let metadata = ExtractionMetadata::new(rates, stats, at);
    match write_metadata(dir, &path, &metadata) {
        Ok(()) => {
            info!(target: "store.metadata", path = %path.display(), success = metadata.success, "Metadata saved");
            Some(path)
        }
        Err(e) => {
            error!(target: "store.metadata", path = %path.display(), error = %e, "Failed to save metadata");
            None
        }
    }
}

fn write_metadata(dir: &Path, path: &Path, metadata: &ExtractionMetadata) -> StoreResult<()> {
    fs::create_dir_all(dir)?;
    write_pretty_json(path, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> RunStats {
        RunStats {
            duration: Duration::from_millis(12_346),
            source_url: "https://example.test/rates".into(),
            extractor_version: "1.0.0".into(),
            target_currencies: vec!["Euro".into(), "US Dollar".into()],
        }
    }

    #[test]
    fn successful_run_metadata() {
        let rates: ExtractedRates = vec![("Euro", "4.0021")].into_iter().collect();
        let tmp = tempfile::tempdir().unwrap();
        let path = save_metadata(tmp.path(), "metadata.json", Some(&rates), &stats(), Utc::now())
            .expect("metadata saved");

        let meta: ExtractionMetadata =
            serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert!(meta.success);
        assert_eq!(meta.currencies_extracted, 1);
        assert_eq!(meta.extraction_duration_seconds, 12.35);
        assert_eq!(meta.notes, "Extracted 1 currencies successfully");
        assert_eq!(meta.target_currencies, vec!["Euro", "US Dollar"]);
        assert_eq!(meta.extraction_method, ExtractionMethod::SeleniumSimple);
    }

    #[test]
    fn failed_run_metadata() {
        let meta = ExtractionMetadata::new(None, &stats(), Utc::now());
        assert!(!meta.success);
        assert_eq!(meta.currencies_extracted, 0);
        assert_eq!(meta.notes, "Extraction failed");
        assert_eq!(meta.source_url, "https://example.test/rates");
    }
}
