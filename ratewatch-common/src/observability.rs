//! Logging setup shared by both subcommands.
//!
//! Events always go to a daily rolling file; a copy can be mirrored to
//! `stderr`. Call [`init_logging`] once near process start. Later calls do
//! nothing and return the path chosen by the first one.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Overrides the log directory when no explicit one is configured.
pub const LOG_DIR_ENV: &str = "RATEWATCH_LOG_DIR";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Encoding used for both the file and the `stderr` sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Used as the log file stem and the default directory name.
    pub app_name: &'static str,
    /// Explicit log directory; `~/` is expanded.
    pub log_dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: &'static str,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "ratewatch",
            log_dir: None,
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "info",
        }
    }
}

/// Install the global subscriber and return today's log file path.
///
/// Directory precedence: `config.log_dir`, then `RATEWATCH_LOG_DIR`, then
/// `~/.local/share/<app_name>`.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = LOG_PATH.get() {
        return Ok(path.clone());
    }

    let dir = resolve_log_dir(config.app_name, config.log_dir.as_deref());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let stem = format!("{}.log", config.app_name);
    let path = daily_file(&dir, &stem, Local::now().date_naive());
    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, &stem));
    let _ = LOG_GUARD.set(guard);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter));

    tracing_subscriber::registry()
        .with(sinks(config.format, config.emit_stderr, writer))
        .with(filter)
        .try_init()
        .context("tracing subscriber already installed")?;

    let _ = LOG_PATH.set(path.clone());
    Ok(path)
}

fn sinks(format: LogFormat, emit_stderr: bool, file: NonBlocking) -> Vec<BoxedLayer> {
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);
    layers.push(match format {
        LogFormat::Text => fmt::layer().with_writer(file).with_ansi(false).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(file).boxed(),
    });
    if emit_stderr {
        layers.push(match format {
            LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
            LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        });
    }
    layers
}

/// Name `tracing_appender::rolling::daily` gives the file for `date`.
fn daily_file(dir: &Path, stem: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{stem}.{}", date.format("%Y-%m-%d")))
}

fn resolve_log_dir(app_name: &str, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(LOG_DIR_ENV).map(PathBuf::from))
        .map(|dir| expand_home(&dir))
        .unwrap_or_else(|| default_data_dir(app_name))
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), home()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn default_data_dir(app_name: &str) -> PathBuf {
    match home() {
        Some(home) => home.join(".local").join("share").join(app_name),
        None => PathBuf::from(app_name),
    }
}

fn home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
