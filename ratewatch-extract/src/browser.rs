use anyhow::{Context, Result};
use async_trait::async_trait;
use ratewatch_config::ExtractorConfig;
use ratewatch_drivers::browser::driver::RateDriver;
use ratewatch_drivers::browser::options::BrowserOptions;
use ratewatch_drivers::browser::page::{RateElement, RatePage};
use ratewatch_drivers::browser::service::DriverService;
use std::time::Duration;
use tracing::{debug, info};

/// Narrow view of a browser session: just what the extractor needs.
#[async_trait]
pub trait PageFetcher: Send {
    /// Navigate to the exchange-rate page.
    async fn open(&mut self, url: &str) -> Result<()>;

    /// Click the disclaimer acknowledgement link if it appears within `timeout`.
    ///
    /// `Ok(false)` means the link never showed up.
    async fn dismiss_disclaimer(&mut self, link_text: &str, timeout: Duration) -> Result<bool>;

    /// Cell texts of every row of the first table on the page.
    ///
    /// Rows whose cells cannot be read are left out.
    async fn table_rows(&mut self, timeout: Duration) -> Result<Vec<Vec<String>>>;

    /// End the session. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// [`PageFetcher`] backed by a real WebDriver session.
pub struct WebDriverFetcher {
    driver: Option<RateDriver>,
    page: Option<RatePage>,
    /// Set when this fetcher started the driver process itself.
    service: Option<DriverService>,
    settle_delay: Duration,
}

impl WebDriverFetcher {
    /// Start a browser session as described by `config`.
    ///
    /// Uses the service at `webdriver_url` when one answers; otherwise
    /// launches `driver_binary` on a free port and owns it until [`close`].
    ///
    /// [`close`]: PageFetcher::close
    pub async fn connect(config: &ExtractorConfig) -> Result<Self> {
        let options = BrowserOptions {
            headless: config.headless,
            ..BrowserOptions::default()
        };

        let (driver, service) = match RateDriver::new(&config.webdriver_url, options.clone()).await {
            Ok(driver) => (driver, None),
            Err(e) => {
                debug!(target: "extract.driver", url = %config.webdriver_url, error = %e, "no running driver service");
                let mut service = DriverService::spawn(&config.driver_binary, 0)?;
                info!(target: "extract.driver", binary = %config.driver_binary.display(), port = service.port(), "Started ChromeDriver");
                match service.connect(options, config.wait_timeout()).await {
                    Ok(driver) => (driver, Some(service)),
                    Err(e) => {
                        service.shutdown().await;
                        return Err(e);
                    }
                }
            }
        };

        Ok(Self {
            driver: Some(driver),
            page: None,
            service,
            settle_delay: config.settle_delay(),
        })
    }

    fn page(&self) -> Result<&RatePage> {
        self.page.as_ref().context("no page opened yet")
    }
}

#[async_trait]
impl PageFetcher for WebDriverFetcher {
    async fn open(&mut self, url: &str) -> Result<()> {
        let driver = self.driver.as_mut().context("browser session already closed")?;
        let page = driver.goto(url).await?;
        page.settle(self.settle_delay).await;
        self.page = Some(page);
        Ok(())
    }

    async fn dismiss_disclaimer(&mut self, link_text: &str, timeout: Duration) -> Result<bool> {
        let page = self.page()?;
        let clicked = page.click_link_text(link_text, timeout).await?;
        if clicked {
            page.settle(self.settle_delay).await;
        }
        Ok(clicked)
    }

    async fn table_rows(&mut self, timeout: Duration) -> Result<Vec<Vec<String>>> {
        let page = self.page()?;
        let table = page
            .wait_for_element("table", timeout)
            .await
            .context("exchange-rate table not found")?;
        let rows = table.find_elements("tr").await?;

        let mut out = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            match read_cells(row).await {
                Ok(cells) => out.push(cells),
                Err(e) => {
                    debug!(target: "extract.row", row = index, error = %e, "skipping unreadable row");
                }
            }
        }
        Ok(out)
    }

    async fn close(&mut self) -> Result<()> {
        self.page = None;
        let closed = match self.driver.take() {
            Some(driver) => driver.close().await,
            None => Ok(()),
        };
        if let Some(service) = self.service.take() {
            service.shutdown().await;
        }
        closed
    }
}

async fn read_cells(row: &RateElement) -> Result<Vec<String>> {
    let cells = row.find_elements("td").await?;
    let mut texts = Vec::with_capacity(cells.len());
    for cell in &cells {
        texts.push(cell.get_inner_text().await?.trim().to_string());
    }
    Ok(texts)
}
