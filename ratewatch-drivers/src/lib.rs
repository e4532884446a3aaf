//! Driver layer for browser automation.
//!
//! This crate exposes the WebDriver session and page/element helpers used by
//! the rate extractor and by the driver installer's verification step.
//!
//! - [`browser::driver::RateDriver`]: WebDriver client wrapper
//! - [`browser::page::RatePage`]: navigation, bounded waits and DOM helpers
//! - [`browser::options`]: Chrome command-line arguments and capabilities
//! - [`browser::service::DriverService`]: a chromedriver child process on a free port
pub mod browser;
