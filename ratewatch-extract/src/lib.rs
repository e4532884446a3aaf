//! Exchange-rate extraction from the central bank's published table.
//!
//! - [`scan::scan_rows`]: pure matching over row cell texts
//! - rate tokens are validated with [`ratewatch_common::rate`]
//! - [`browser::PageFetcher`]: the browser seam, with a WebDriver-backed
//!   implementation in [`browser::WebDriverFetcher`]
//!
//! Failures never escape as errors: [`extract_exchange_rates`] logs them and
//! returns `None`, which callers treat as "no data this run".

pub mod browser;
pub mod scan;

use anyhow::Result;
use browser::{PageFetcher, WebDriverFetcher};
use ratewatch_common::ExtractedRates;
use ratewatch_config::ExtractorConfig;
use tracing::{debug, error, info, warn};

const LOGGED_PREVIEW_ROWS: usize = 5;

/// Connect a WebDriver session and extract rates with it.
///
/// Returns `None` when the driver is unavailable or extraction yields nothing.
pub async fn extract_with_webdriver(config: &ExtractorConfig) -> Option<ExtractedRates> {
    let mut fetcher = match WebDriverFetcher::connect(config).await {
        Ok(fetcher) => fetcher,
        Err(e) => {
            error!(target: "extract", error = %format!("{e:#}"), "ChromeDriver not available");
            return None;
        }
    };
    extract_exchange_rates(&mut fetcher, config).await
}

/// Drive `fetcher` through the page and scan its table for `config.target_currencies`.
///
/// The session is closed on every path before returning.
pub async fn extract_exchange_rates<F>(
    fetcher: &mut F,
    config: &ExtractorConfig,
) -> Option<ExtractedRates>
where
    F: PageFetcher + ?Sized,
{
    let outcome = scrape(fetcher, config).await;

    if let Err(e) = fetcher.close().await {
        warn!(target: "extract", error = %format!("{e:#}"), "failed to close browser session");
    }

    match outcome {
        Ok(rates) if !rates.is_empty() => Some(rates),
        Ok(_) => {
            warn!(target: "extract", "no target currency matched");
            None
        }
        Err(e) => {
            error!(target: "extract", error = %format!("{e:#}"), "Extraction failed");
            None
        }
    }
}

async fn scrape<F>(fetcher: &mut F, config: &ExtractorConfig) -> Result<ExtractedRates>
where
    F: PageFetcher + ?Sized,
{
    fetcher.open(&config.source_url).await?;

    match fetcher
        .dismiss_disclaimer(&config.disclaimer_link_text, config.wait_timeout())
        .await
    {
        Ok(true) => info!(target: "extract", "Disclaimer accepted"),
        Ok(false) => info!(target: "extract", "Disclaimer already accepted or not present"),
        Err(e) => info!(target: "extract", error = %e, "Disclaimer could not be dismissed; continuing"),
    }

    let rows = fetcher.table_rows(config.wait_timeout()).await?;
    for (index, cells) in rows.iter().take(LOGGED_PREVIEW_ROWS).enumerate() {
        debug!(target: "extract.row", row = index, cells = ?cells, "table row");
    }

    Ok(scan::scan_rows(&rows, &config.target_currencies))
}
