use chrono::{DateTime, Local, Utc};
use ratewatch_common::ExtractedRates;
use ratewatch_config::RatewatchConfig;
use ratewatch_extract::extract_with_webdriver;
use ratewatch_store::{
    GitCli, PublishOutcome, RunStats, VcsClient, historical_filename, publish, read_csv, save_csv,
    save_json, save_metadata,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Paths written (or not) by one run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub latest_csv: Option<PathBuf>,
    pub latest_json: Option<PathBuf>,
    pub history_csv: Option<PathBuf>,
    pub metadata: Option<PathBuf>,
    pub publish: Option<PublishOutcome>,
}

impl RunReport {
    pub fn artifacts_written(&self) -> usize {
        [&self.latest_csv, &self.latest_json, &self.history_csv, &self.metadata]
            .into_iter()
            .filter(|p| p.is_some())
            .count()
    }

    pub fn published(&self) -> bool {
        self.publish.as_ref().is_some_and(PublishOutcome::is_success)
    }
}

/// `ratewatch extract`: scrape, persist, publish.
pub async fn run_extract(cfg: &RatewatchConfig) -> RunReport {
    info!(target: "pipeline", url = %cfg.extractor.source_url, "Starting CBUAE rate extraction");
    let started = Instant::now();
    let rates = extract_with_webdriver(&cfg.extractor).await;
    let elapsed = started.elapsed();

    let vcs = GitCli::new(&cfg.publish.repo_dir);
    let report = persist_and_publish(cfg, rates.as_ref(), elapsed, &vcs, Utc::now());
    info!(
        target: "pipeline",
        artifacts = report.artifacts_written(),
        published = report.published(),
        "Run finished"
    );
    report
}

/// Write every artifact for `rates` and publish when both latest files exist.
///
/// Without rates only the failure metadata is written.
pub fn persist_and_publish(
    cfg: &RatewatchConfig,
    rates: Option<&ExtractedRates>,
    duration: Duration,
    vcs: &dyn VcsClient,
    at: DateTime<Utc>,
) -> RunReport {
    let store = &cfg.store;
    let stats = RunStats {
        duration,
        source_url: cfg.extractor.source_url.clone(),
        extractor_version: store.extractor_version.clone(),
        target_currencies: cfg.extractor.target_currencies.clone(),
    };

    let Some(rates) = rates else {
        error!(target: "pipeline", "Extraction failed");
        return RunReport {
            metadata: save_metadata(&store.data_dir, &store.metadata_file, None, &stats, at),
            ..RunReport::default()
        };
    };

    info!(target: "pipeline", count = rates.len(), "Extracted exchange rates");
    for (currency, rate) in rates.iter() {
        info!(target: "pipeline", "{currency}: {rate} AED");
    }

    let local_date = at.with_timezone(&Local).date_naive();
    let mut report = RunReport {
        latest_csv: save_csv(&store.data_dir, &store.latest_csv, rates, at),
        latest_json: save_json(&store.data_dir, &store.latest_json, rates, at),
        history_csv: save_csv(&store.data_dir, &historical_filename(local_date), rates, at),
        metadata: save_metadata(&store.data_dir, &store.metadata_file, Some(rates), &stats, at),
        publish: None,
    };

    if let Some(path) = &report.latest_csv {
        match read_csv(path) {
            Ok(records) => info!(target: "pipeline", path = %path.display(), records = records.len(), "Latest CSV written"),
            Err(e) => warn!(target: "pipeline", path = %path.display(), error = %e, "Latest CSV unreadable"),
        }
    }

    if report.latest_csv.is_none() || report.latest_json.is_none() {
        warn!(target: "pipeline", "Skipping publish: latest CSV or JSON missing");
        return report;
    }
    if !cfg.publish.enabled {
        info!(target: "pipeline", "Publishing disabled");
        return report;
    }

    let outcome = publish(vcs, &store.data_dir, at.with_timezone(&Local));
    if outcome.is_success() {
        info!(target: "pipeline", ?outcome, "Data published");
    } else {
        warn!(target: "pipeline", ?outcome, "Publish did not complete");
    }
    report.publish = Some(outcome);
    report
}
