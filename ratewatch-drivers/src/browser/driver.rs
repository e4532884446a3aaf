use crate::browser::{
    options::{build_capabilities, BrowserOptions},
    page::RatePage,
};
use anyhow::{Context, Result};
use fantoccini::{Client, ClientBuilder};
use url::Url;

/// Thin wrapper around a `fantoccini` WebDriver client.
pub struct RateDriver {
    pub client: Client,
    pub options: BrowserOptions,
}

impl RateDriver {
    /// Create a new session on a running WebDriver service, e.g.
    /// `http://localhost:9515` for a local chromedriver.
    pub async fn new(webdriver_url: &str, options: BrowserOptions) -> Result<Self> {
        Url::parse(webdriver_url)
            .with_context(|| format!("invalid WebDriver URL: {webdriver_url}"))?;

        let client = ClientBuilder::native()
            .capabilities(build_capabilities(&options))
            .connect(webdriver_url)
            .await
            .with_context(|| format!("failed to start a session on {webdriver_url}"))?;

        tracing::debug!(target: "browser.session", %webdriver_url, headless = options.headless, "session started");

        Ok(Self { client, options })
    }

    /// Navigate to `url` and return a [`RatePage`] for it.
    pub async fn goto(&mut self, url: &str) -> Result<RatePage> {
        let page = RatePage::new(self.client.clone());
        page.goto(url).await?;
        Ok(page)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}
