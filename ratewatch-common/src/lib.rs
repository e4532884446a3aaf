//! Common types and utilities shared across ratewatch crates.
//!
//! This crate holds the pieces every other member needs: the extraction
//! method tag written into every persisted record, the ordered rate mapping
//! produced by the extractor, and logging setup.
//!
//! # Overview
//!
//! - [`ExtractedRates`]: ordered currency text → rate text mapping
//! - [`ExtractionMethod`]: tag recorded alongside each rate
//! - [`rate`]: parsing and range check for rate tokens
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use ratewatch_common::ExtractedRates;
//!
//! let mut rates = ExtractedRates::new();
//! assert!(rates.insert_first("US Dollar", "3.6725"));
//! assert!(!rates.insert_first("US Dollar", "9.9999"));
//! assert_eq!(rates.get("US Dollar"), Some("3.6725"));
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod observability;
pub mod rate;

/// Tag describing how a rate was obtained.
///
/// Serialized as the lowercase snake‑case string stored in the
/// `extraction_method` column of every artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Headless browser driven through WebDriver, simple table scan.
    #[default]
    SeleniumSimple,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::SeleniumSimple => "selenium_simple",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered mapping from matched display text to matched rate text.
///
/// Insertion order is preserved and the first value recorded for a key is
/// never replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRates {
    entries: Vec<(String, String)>,
}

impl ExtractedRates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `currency → rate` unless `currency` is already present.
    ///
    /// Returns `true` when the pair was inserted.
    pub fn insert_first(&mut self, currency: impl Into<String>, rate: impl Into<String>) -> bool {
        let currency = currency.into();
        if self.contains(&currency) {
            return false;
        }
        self.entries.push((currency, rate.into()));
        true
    }

    pub fn contains(&self, currency: &str) -> bool {
        self.entries.iter().any(|(c, _)| c == currency)
    }

    pub fn get(&self, currency: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(c, _)| c == currency)
            .map(|(_, r)| r.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate pairs in insertion (document) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, r)| (c.as_str(), r.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtractedRates {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut rates = ExtractedRates::new();
        for (k, v) in iter {
            rates.insert_first(k, v);
        }
        rates
    }
}
