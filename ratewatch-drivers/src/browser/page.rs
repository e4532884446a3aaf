use anyhow::Result;
use fantoccini::{elements::Element, Client, Locator};
use std::time::Duration;
use tracing::debug;

/// High‑level page wrapper providing navigation and bounded element waits.
pub struct RatePage {
    pub(crate) client: Client,
}

impl RatePage {
    /// Construct a page wrapper around an existing WebDriver client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Navigate to `url`.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.client.goto(url).await.map_err(anyhow::Error::from)?;
        debug!(target: "browser.page", %url, "navigated");
        Ok(())
    }

    /// Give client-side scripts time to render before the next query.
    pub async fn settle(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Return the page title.
    pub async fn get_title(&self) -> Result<String> {
        self.client.title().await.map_err(anyhow::Error::msg)
    }

    /// Wait up to `timeout` for a link with exactly `text` and click it.
    ///
    /// Returns `Ok(false)` when no such link shows up in time.
    pub async fn click_link_text(&self, text: &str, timeout: Duration) -> Result<bool> {
        let link = match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::LinkText(text))
            .await
        {
            Ok(link) => link,
            Err(e) => {
                debug!(target: "browser.page", link_text = %text, error = %e, "link not found");
                return Ok(false);
            }
        };
        link.click().await?;
        Ok(true)
    }

    /// Wait up to `timeout` for the first element matching a CSS selector.
    pub async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<RateElement> {
        let element = self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await?;
        Ok(RateElement::new(element))
    }
}

// =========================
// RateElement Definition
// =========================

#[derive(Clone)]
/// Wrapper for DOM elements that provides typed helpers consistent with [`RatePage`].
pub struct RateElement {
    pub element: Element,
}

impl RateElement {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    /// Find zero or more child elements by CSS selector.
    pub async fn find_elements(&self, selector: &str) -> Result<Vec<RateElement>> {
        let elements = self.element.find_all(Locator::Css(selector)).await?;
        Ok(elements.into_iter().map(RateElement::new).collect())
    }

    /// Return the element's visible text.
    pub async fn get_inner_text(&self) -> Result<String> {
        self.element.text().await.map_err(anyhow::Error::from)
    }
}
