use ratewatch_config::RatewatchConfig;
use ratewatch_installer::Installer;
use std::process::ExitCode;
use tracing::{error, info, warn};

/// `ratewatch install-driver`: 0 on a verified install, 1 otherwise.
pub async fn run(cfg: &RatewatchConfig) -> ExitCode {
    let installer = match Installer::for_host(cfg.installer.clone()) {
        Ok(installer) => installer,
        Err(e) => {
            error!(target: "installer", error = %e, "Cannot install ChromeDriver on this host");
            log_manual_options();
            return ExitCode::FAILURE;
        }
    };

    tokio::select! {
        result = installer.install() => match result {
            Ok(outcome) => {
                info!(target: "installer", method = %outcome.method(), %outcome, "ChromeDriver installation completed successfully");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(target: "installer", error = %e, "ChromeDriver installation failed");
                log_manual_options();
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            warn!(target: "installer", "Installation cancelled by user");
            ExitCode::FAILURE
        }
    }
}

fn log_manual_options() {
    info!(target: "installer", "Manual installation options:");
    info!(target: "installer", "  Ubuntu/Debian: sudo apt install chromium-chromedriver");
    info!(target: "installer", "  macOS: brew install chromedriver");
    info!(target: "installer", "  Windows: download from https://chromedriver.chromium.org/");
}
