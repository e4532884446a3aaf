//! Persistence and publishing of extracted rates.
//!
//! - [`files`]: latest CSV/JSON and dated history CSV
//! - [`metadata`]: per-run metadata record
//! - [`vcs`]: staging, committing and pushing the data directory
//!
//! Public writers never return errors. They log and hand back `None`, and the
//! caller decides what still makes sense to do with the artifacts that did
//! get written.

pub mod files;
pub mod metadata;
pub mod record;
pub mod vcs;

pub use files::{historical_filename, read_csv, read_json, save_csv, save_json};
pub use metadata::{save_metadata, ExtractionMetadata, RunStats};
pub use record::{build_records, RateRecord};
pub use vcs::{publish, GitCli, PublishOutcome, VcsClient, VcsOutput};

/// Errors raised while writing or reading artifacts.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A rate string could not be converted to a number.
    #[error("invalid rate {0:?}")]
    InvalidRate(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
