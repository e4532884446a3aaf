use serde_json::json;
use std::collections::HashMap;
use webdriver::capabilities::Capabilities;

/// Desktop Chrome user agent sent with every scraping session.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
/// Launch options for a Chrome session.
pub struct BrowserOptions {
    pub headless: bool,
    pub user_agent: Option<String>,
    pub disable_extensions: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            disable_extensions: false,
        }
    }
}

impl BrowserOptions {
    /// Options for a throwaway session that only checks the driver works.
    pub fn verification() -> Self {
        Self {
            headless: true,
            user_agent: None,
            disable_extensions: true,
        }
    }
}

/// Construct Chrome command‑line arguments for the given options.
pub fn build_chrome_arguments(opts: &BrowserOptions) -> Vec<String> {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
    ];
    if opts.headless {
        args.push("--headless".to_string());
    }
    if opts.disable_extensions {
        args.push("--disable-extensions".to_string());
    }
    if let Some(ua) = &opts.user_agent {
        args.push(format!("--user-agent={ua}"));
    }
    args
}

/// Wrap the arguments into `goog:chromeOptions` capabilities.
pub fn build_capabilities(opts: &BrowserOptions) -> Capabilities {
    let mut caps = Capabilities::new();
    let mut chrome_opts = HashMap::new();
    chrome_opts.insert("args".to_string(), json!(build_chrome_arguments(opts)));
    caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));
    caps
}
