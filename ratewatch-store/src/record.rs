use chrono::{DateTime, SecondsFormat, Utc};
use ratewatch_common::rate::parse_rate;
use ratewatch_common::{ExtractedRates, ExtractionMethod};
use serde::{Deserialize, Serialize};

use crate::{StoreError, StoreResult};

/// One persisted exchange rate, as written to every CSV and JSON artifact.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub currency: String,
    pub rate: String,
    pub rate_float: f64,
    pub extraction_timestamp: String,
    pub extraction_method: ExtractionMethod,
}

/// ISO-8601 UTC timestamp with microsecond precision, e.g. `2025-01-02T03:04:05.000006+00:00`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Turn the extracted mapping into records stamped with `at`, in mapping order.
///
/// Fails on the first rate that is not numeric.
pub fn build_records(rates: &ExtractedRates, at: DateTime<Utc>) -> StoreResult<Vec<RateRecord>> {
    let timestamp = iso_timestamp(at);
    rates
        .iter()
        .map(|(currency, rate)| {
            let rate_float =
                parse_rate(rate).ok_or_else(|| StoreError::InvalidRate(rate.to_string()))?;
            Ok(RateRecord {
                currency: currency.to_string(),
                rate: rate.to_string(),
                rate_float,
                extraction_timestamp: timestamp.clone(),
                extraction_method: ExtractionMethod::SeleniumSimple,
            })
        })
        .collect()
}
