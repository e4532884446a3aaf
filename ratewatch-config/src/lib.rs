//! Loader for ratewatch configuration with YAML + environment overlays.
//!
//! Every field has a default, so an empty document (or no file at all)
//! yields a working configuration that targets the CBUAE exchange-rate page.
//! Environment variables use the `RATEWATCH__` prefix with `__` between
//! path segments, e.g. `RATEWATCH__EXTRACTOR__HEADLESS=false`. String values
//! may reference other variables as `${VAR}`; expansion is applied after all
//! sources are merged.
use config::{Config, ConfigError, Environment, File};
use ratewatch_common::observability::LogFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

pub const DEFAULT_SOURCE_URL: &str = "https://www.centralbank.ae/en/forex-eibor/exchange-rates/";
pub const DEFAULT_MANIFEST_URL: &str =
    "https://googlechromelabs.github.io/chrome-for-testing/known-good-versions-with-downloads.json";
pub const DEFAULT_LEGACY_URL: &str = "https://chromedriver.storage.googleapis.com/LATEST_RELEASE";
pub const DEFAULT_LEGACY_DOWNLOAD_BASE: &str = "https://chromedriver.storage.googleapis.com";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RatewatchConfig {
    pub extractor: ExtractorConfig,
    pub store: StoreConfig,
    pub publish: PublishConfig,
    pub installer: InstallerConfig,
    pub logging: LoggingConfig,
}

/// Where and how the exchange-rate table is scraped.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub source_url: String,
    /// Driver service tried first; when nothing answers there, `driver_binary`
    /// is started on a free port for the run.
    pub webdriver_url: String,
    pub driver_binary: PathBuf,
    pub headless: bool,
    pub disclaimer_link_text: String,
    pub wait_timeout_secs: u64,
    pub settle_delay_secs: u64,
    /// Currency name fragments, matched case-insensitively in caller order.
    pub target_currencies: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.into(),
            webdriver_url: "http://localhost:9515".into(),
            driver_binary: PathBuf::from("chromedriver"),
            headless: true,
            disclaimer_link_text: "Agree and continue".into(),
            wait_timeout_secs: 20,
            settle_delay_secs: 3,
            target_currencies: default_target_currencies(),
        }
    }
}

impl ExtractorConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

fn default_target_currencies() -> Vec<String> {
    [
        "US Dollar",
        "Euro",
        "GB Pound",
        "Japanese Yen",
        "Swiss Franc",
        "Canadian Dollar",
        "Brazilian Real",
        "Australian Dollar",
        "Singapore Dollar",
        "Chinese Yuan",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Output locations for the persisted artifacts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub latest_csv: String,
    pub latest_json: String,
    pub metadata_file: String,
    pub extractor_version: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            latest_csv: "latest_rates.csv".into(),
            latest_json: "latest_rates.json".into(),
            metadata_file: "metadata.json".into(),
            extractor_version: "1.0.0".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub enabled: bool,
    /// Working tree the git commands run in.
    pub repo_dir: PathBuf,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            repo_dir: PathBuf::from("."),
        }
    }
}

/// Endpoints and limits used while provisioning ChromeDriver.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub manifest_url: String,
    pub legacy_url: String,
    pub legacy_download_base: String,
    pub request_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub verify_url: String,
    /// Port for the driver under test; 0 picks a free one.
    pub verify_port: u16,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            manifest_url: DEFAULT_MANIFEST_URL.into(),
            legacy_url: DEFAULT_LEGACY_URL.into(),
            legacy_download_base: DEFAULT_LEGACY_DOWNLOAD_BASE.into(),
            request_timeout_secs: 30,
            download_timeout_secs: 60,
            verify_url: "https://www.google.com".into(),
            verify_port: 0,
        }
    }
}

impl InstallerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: true,
            directory: None,
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct RatewatchConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for RatewatchConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RatewatchConfigLoader {
    /// Start with no file sources; every field falls back to its default.
    ///
    /// ```
    /// use ratewatch_config::RatewatchConfigLoader;
    ///
    /// let config = RatewatchConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(config.extractor.wait_timeout_secs, 20);
    /// assert_eq!(config.extractor.target_currencies.len(), 10);
    /// assert_eq!(config.store.latest_csv, "latest_rates.csv");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is merged only when present.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use ratewatch_config::RatewatchConfigLoader;
    ///
    /// let cfg = RatewatchConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// extractor:
    ///   headless: false
    ///   target_currencies: ["Euro"]
    /// store:
    ///   data_dir: out
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(!cfg.extractor.headless);
    /// assert_eq!(cfg.extractor.target_currencies, vec!["Euro".to_string()]);
    /// assert_eq!(cfg.store.data_dir, std::path::PathBuf::from("out"));
    /// assert_eq!(cfg.store.metadata_file, "metadata.json");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// `RATEWATCH__` environment overrides are applied on top of all files, and
    /// `${VAR}` placeholders are expanded before the typed structs are built.
    pub fn load(self) -> Result<RatewatchConfig, ConfigError> {
        // Environment is merged last so it overrides every file source.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("RATEWATCH")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("extractor.target_currencies"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: RatewatchConfig =
            serde_json::from_value(v).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
