//! Minimal HTTP client with structured logging for the driver installer.
//!
//! - GET helpers for JSON documents, plain text and raw bytes
//! - Per-request timeout and extra headers via [`RequestOpts`]
//! - One attempt per request; callers decide what to fall back to
//! - Optional *raw* response logging via `RATEWATCH_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), ratewatch_http::HttpError> {
//! let client = ratewatch_http::HttpClient::new()?;
//! let version = client
//!     .get_text(
//!         "https://chromedriver.storage.googleapis.com/LATEST_RELEASE",
//!         ratewatch_http::RequestOpts::default(),
//!     )
//!     .await?;
//! # let _ = version;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), decode failures and final
//! errors. Raw bodies go to target `http.raw` when `RATEWATCH_HTTP_RAW=1`.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use thiserror::Error;

const RAW_ENV: &str = "RATEWATCH_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}")]
    Api { status: StatusCode, message: String },
}

// ==============================
// Request Options
// ==============================

/// Per-request tuning knobs for the HTTP client.
///
/// ```
/// use ratewatch_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts::with_timeout(Duration::from_secs(60));
/// assert_eq!(opts.timeout.unwrap().as_secs(), 60);
/// assert!(opts.headers.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts {
    pub timeout: Option<Duration>,
    pub headers: Option<HeaderMap>,
}

impl RequestOpts {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Default::default()
        }
    }
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client with a 30 second default timeout.
    ///
    /// ```no_run
    /// use ratewatch_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new()?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(30));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            default_timeout: Duration::from_secs(30),
        })
    }

    /// Override the default timeout returned by [`HttpClient::new`].
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// GET and decode a JSON document.
    pub async fn get_json<T>(&self, url: &str, opts: RequestOpts) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let bytes = self.get_bytes(url, opts).await?;
        serde_json::from_slice::<T>(&bytes).map_err(|e| {
            let snippet = snip_body(&bytes);
            tracing::warn!(
                serde_line=%e.line(),
                serde_col=%e.column(),
                serde_err=%e.to_string(),
                body_snippet=%snippet,
                "http.response.decode_error"
            );
            HttpError::Decode(e.to_string(), snippet)
        })
    }

    /// GET a UTF-8 body with surrounding whitespace trimmed.
    pub async fn get_text(&self, url: &str, opts: RequestOpts) -> Result<String, HttpError> {
        let bytes = self.get_bytes(url, opts).await?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|e| HttpError::Decode(e.to_string(), snip_body(&bytes)))?;
        Ok(text.trim().to_string())
    }

    /// GET the raw response body. Non-2xx statuses become [`HttpError::Api`].
    pub async fn get_bytes(&self, url: &str, opts: RequestOpts) -> Result<Bytes, HttpError> {
        let url = Url::parse(url).map_err(|e| HttpError::Url(e.to_string()))?;
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut rb = self.inner.get(url.clone()).timeout(timeout);
        if let Some(hdrs) = &opts.headers {
            rb = rb.headers(hdrs.clone());
        }

        let host_path = format!("{}{}", url.host_str().unwrap_or("-"), url.path());
        tracing::debug!(
            host_path=%host_path,
            timeout_ms=timeout.as_millis() as u64,
            "http.request.start"
        );

        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            tracing::warn!(host_path=%host_path, message=%err, "http.network_error.send");
            HttpError::Network(err.to_string())
        })?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|err| {
            tracing::warn!(host_path=%host_path, message=%err, "http.network_error.body");
            HttpError::Network(err.to_string())
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        tracing::debug!(
            host_path=%host_path,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            "http.response.headers"
        );

        if raw_enabled() {
            let mut body_snip = bytes.to_vec();
            let truncated = body_snip.len() > RAW_MAX_BODY;
            if truncated {
                body_snip.truncate(RAW_MAX_BODY);
            }
            let text = String::from_utf8_lossy(&body_snip);
            tracing::info!(
                target: "http.raw",
                host_path=%host_path,
                status=%status,
                duration_ms=dur_ms,
                body=%text,
                truncated
            );
        }

        if status.is_success() {
            return Ok(bytes);
        }

        let message = extract_error_message(&bytes);
        tracing::warn!(
            host_path=%host_path,
            %status,
            message=%message,
            "http.error"
        );
        Err(HttpError::Api { status, message })
    }
}

// ==============================
// Helpers
// ==============================

/// First non-empty `message`/`detail`/`error` field of a JSON body, else a
/// snippet of the raw body (storage endpoints answer with XML).
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct Msg {
        message: String,
        detail: String,
        error: String,
    }

    serde_json::from_slice::<Msg>(body)
        .ok()
        .and_then(|m| [m.message, m.detail, m.error].into_iter().find(|s| !s.is_empty()))
        .unwrap_or_else(|| snip_body(body))
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        let mut cut = 500;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}
