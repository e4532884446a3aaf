use anyhow::Result;
use clap::{Parser, Subcommand};
use ratewatch_common::observability::{LogConfig, init_logging};
use ratewatch_config::{LoggingConfig, RatewatchConfig, RatewatchConfigLoader};
use std::path::PathBuf;
use std::process::ExitCode;

mod install;
mod pipeline;

#[derive(Parser, Debug)]
#[command(name = "ratewatch", author, version, about = "CBUAE exchange-rate scraper", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file; built-in defaults apply when omitted
    #[arg(short, long, global = true, env = "RATEWATCH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape the rate table, write the data files and publish them
    Extract,
    /// Install a ChromeDriver matching the local browser
    InstallDriver,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Env overrides are applied on top of the file inside `load`.
    let mut loader = RatewatchConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    let cfg: RatewatchConfig = loader.load()?;

    let log_path = init_logging(log_config(&cfg.logging))?;
    tracing::debug!(log = %log_path.display(), "logging initialised");

    let code = match cli.command {
        Commands::Extract => {
            pipeline::run_extract(&cfg).await;
            ExitCode::SUCCESS
        }
        Commands::InstallDriver => install::run(&cfg).await,
    };
    Ok(code)
}

fn log_config(logging: &LoggingConfig) -> LogConfig {
    LogConfig {
        log_dir: logging.directory.clone(),
        emit_stderr: logging.emit_stderr,
        format: logging.format,
        ..LogConfig::default()
    }
}
