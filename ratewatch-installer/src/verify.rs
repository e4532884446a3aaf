use anyhow::{Result, ensure};
use async_trait::async_trait;
use ratewatch_config::InstallerConfig;
use ratewatch_drivers::browser::options::BrowserOptions;
use ratewatch_drivers::browser::service::DriverService;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Checks that an installed driver can actually drive a browser.
#[async_trait]
pub trait DriverVerifier: Send + Sync {
    /// `true` when a session could be opened with the driver at `driver`.
    /// Never fails; any error counts as `false`.
    async fn verify(&self, driver: &Path) -> bool;
}

/// Starts the driver on a local port and loads a known page headlessly.
///
/// The session must come from the child it started: a busy port or a
/// child that exits before the page loads fails verification.
#[derive(Debug, Clone)]
pub struct WebDriverVerifier {
    url: String,
    port: u16,
    startup_timeout: Duration,
}

impl WebDriverVerifier {
    pub fn new(config: &InstallerConfig) -> Self {
        Self {
            url: config.verify_url.clone(),
            port: config.verify_port,
            startup_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    async fn check(&self, driver: &Path) -> Result<String> {
        let mut service = DriverService::spawn(driver, self.port)?;
        let result = self.load_page(&mut service).await;
        service.shutdown().await;
        result
    }

    async fn load_page(&self, service: &mut DriverService) -> Result<String> {
        let mut session = service
            .connect(BrowserOptions::verification(), self.startup_timeout)
            .await?;

        let title = match session.goto(&self.url).await {
            Ok(page) => page.get_title().await,
            Err(e) => Err(e),
        };
        if let Err(e) = session.close().await {
            debug!(target: "installer.verify", error = %e, "session close failed");
        }

        let title = title?;
        service.ensure_running()?;
        ensure!(!title.trim().is_empty(), "page returned an empty title");
        Ok(title)
    }
}

#[async_trait]
impl DriverVerifier for WebDriverVerifier {
    async fn verify(&self, driver: &Path) -> bool {
        match self.check(driver).await {
            Ok(title) => {
                info!(target: "installer.verify", %title, "ChromeDriver verification successful");
                true
            }
            Err(e) => {
                warn!(target: "installer.verify", error = %format!("{e:#}"), "ChromeDriver verification failed");
                false
            }
        }
    }
}
