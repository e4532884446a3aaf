//! A chromedriver process owned by the caller.
//!
//! [`DriverService::spawn`] starts the binary on a port nobody else is
//! listening on, and [`DriverService::connect`] only returns a session while
//! that same child is still running. The child is killed on drop.

use crate::browser::{driver::RateDriver, options::BrowserOptions};
use anyhow::{bail, Context, Result};
use std::net::{Ipv4Addr, TcpListener};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct DriverService {
    binary: PathBuf,
    port: u16,
    child: Child,
}

impl DriverService {
    /// Start `binary --port=<port>`. A `port` of 0 picks a free one.
    ///
    /// Fails if an explicit port is already bound by another process.
    pub fn spawn(binary: &Path, port: u16) -> Result<Self> {
        let port = reserve_port(port)?;
        let child = Command::new(binary)
            .arg(format!("--port={port}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start {}", binary.display()))?;

        tracing::debug!(target: "browser.service", binary = %binary.display(), port, "driver process started");
        Ok(Self {
            binary: binary.to_path_buf(),
            port,
            child,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn webdriver_url(&self) -> String {
        format!("http://{}:{}", Ipv4Addr::LOCALHOST, self.port)
    }

    /// Error if the child has exited.
    pub fn ensure_running(&mut self) -> Result<()> {
        match self.child.try_wait()? {
            None => Ok(()),
            Some(status) => bail!("{} exited early ({status})", self.binary.display()),
        }
    }

    /// Open a session on this service, waiting up to `startup` for it to
    /// accept connections.
    pub async fn connect(&mut self, options: BrowserOptions, startup: Duration) -> Result<RateDriver> {
        let url = self.webdriver_url();
        let deadline = Instant::now() + startup;
        loop {
            self.ensure_running()?;
            match RateDriver::new(&url, options.clone()).await {
                Ok(driver) => {
                    self.ensure_running()?;
                    return Ok(driver);
                }
                Err(e) if Instant::now() < deadline => {
                    tracing::debug!(target: "browser.service", error = %e, "driver not ready");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(e) => return Err(e.context(format!("driver on port {} never became ready", self.port))),
            }
        }
    }

    /// Kill the child and reap it.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::debug!(target: "browser.service", error = %e, "driver process already gone");
        }
    }
}

/// Resolve `port` to one that is free right now; 0 asks the OS for one.
pub fn reserve_port(port: u16) -> Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
        .with_context(|| format!("port {port} is already in use"))?;
    Ok(listener.local_addr()?.port())
}
