//! ChromeDriver provisioning.
//!
//! [`Installer::install`] walks a fixed chain of methods and stops at the
//! first one whose result passes verification:
//!
//! 1. system package manager (`apt-get` / `brew`)
//! 2. manual download of a build matching the installed browser
//!
//! The host platform is resolved before anything else, so an unsupported
//! OS/architecture pair fails without touching the network.

pub mod command;
pub mod detect;
pub mod download;
pub mod install;
pub mod manifest;
pub mod platform;
pub mod verify;

use command::{CommandRunner, SystemRunner};
use detect::detect_browser_version;
use download::download_and_extract;
use install::{install_to_system, install_via_package_manager, system_targets, user_bin_dir};
use manifest::{VersionSource, resolve_driver_version};
use platform::{Os, Platform};
use ratewatch_config::InstallerConfig;
use ratewatch_http::{HttpClient, HttpError};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};
use verify::{DriverVerifier, WebDriverVerifier};

#[derive(Debug, Error)]
pub enum InstallError {
    #[error("unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },
    #[error("unable to determine ChromeDriver version: {0}")]
    VersionResolution(String),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("ChromeDriver executable not found in archive")]
    BinaryNotFound,
    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
    #[error("no package manager installation path on {0}")]
    NoPackageManager(Os),
    #[error("no writable install location")]
    NoInstallLocation,
    #[error("installed driver failed verification")]
    VerificationFailed,
    #[error("all installation methods failed")]
    Exhausted,
}

/// Installation methods, in the order they are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMethod {
    PackageManager,
    ManualDownload,
}

impl fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InstallMethod::PackageManager => "package_manager",
            InstallMethod::ManualDownload => "manual_download",
        })
    }
}

/// What a successful installation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Installed by the package manager; `version` is the `--version` line.
    PackageManager { version: String },
    /// Downloaded and copied to `path`.
    ManualDownload {
        version: String,
        source: VersionSource,
        path: PathBuf,
    },
}

impl InstallOutcome {
    pub fn method(&self) -> InstallMethod {
        match self {
            InstallOutcome::PackageManager { .. } => InstallMethod::PackageManager,
            InstallOutcome::ManualDownload { .. } => InstallMethod::ManualDownload,
        }
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallOutcome::PackageManager { version } => {
                write!(f, "installed via package manager ({version})")
            }
            InstallOutcome::ManualDownload { version, source, path } => write!(
                f,
                "downloaded ChromeDriver {version} ({source} version) to {}",
                path.display()
            ),
        }
    }
}

pub struct Installer {
    config: InstallerConfig,
    platform: Platform,
    http: HttpClient,
    runner: Box<dyn CommandRunner>,
    verifier: Box<dyn DriverVerifier>,
    system_targets: Vec<PathBuf>,
    user_bin: Option<PathBuf>,
}

impl Installer {
    /// Installer for the running host.
    pub fn for_host(config: InstallerConfig) -> Result<Self, InstallError> {
        let platform = Platform::detect()?;
        Self::new(config, platform)
    }

    /// Installer for an explicit OS/architecture pair.
    pub fn for_platform(config: InstallerConfig, os: &str, arch: &str) -> Result<Self, InstallError> {
        let platform = Platform::from_parts(os, arch)?;
        Self::new(config, platform)
    }

    pub fn new(config: InstallerConfig, platform: Platform) -> Result<Self, InstallError> {
        let http = HttpClient::new()?.with_timeout(config.request_timeout());
        let verifier = WebDriverVerifier::new(&config);
        Ok(Self {
            system_targets: system_targets(platform.os),
            user_bin: user_bin_dir(),
            runner: Box::new(SystemRunner),
            verifier: Box::new(verifier),
            http,
            config,
            platform,
        })
    }

    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn with_verifier(mut self, verifier: impl DriverVerifier + 'static) -> Self {
        self.verifier = Box::new(verifier);
        self
    }

    /// Replace the system directories and the user fallback directory.
    pub fn with_install_dirs(mut self, system_targets: Vec<PathBuf>, user_bin: Option<PathBuf>) -> Self {
        self.system_targets = system_targets;
        self.user_bin = user_bin;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Try each method in turn; the first verified success wins.
    pub async fn install(&self) -> Result<InstallOutcome, InstallError> {
        info!(
            target: "installer",
            os = %self.platform.os,
            platform = self.platform.tag,
            "Starting ChromeDriver installation"
        );

        for method in [InstallMethod::PackageManager, InstallMethod::ManualDownload] {
            info!(target: "installer.method", %method, "Trying installation method");
            let attempt = match method {
                InstallMethod::PackageManager => self.via_package_manager().await,
                InstallMethod::ManualDownload => self.via_manual_download().await,
            };
            match attempt {
                Ok(outcome) => {
                    info!(target: "installer.method", %method, %outcome, "Installation successful");
                    return Ok(outcome);
                }
                Err(e) => {
                    warn!(target: "installer.method.failed", %method, error = %e, "Installation method failed");
                }
            }
        }
        Err(InstallError::Exhausted)
    }

    async fn via_package_manager(&self) -> Result<InstallOutcome, InstallError> {
        let version = install_via_package_manager(self.runner.as_ref(), self.platform.os)?;
        let binary = PathBuf::from(self.platform.os.driver_binary_name());
        if !self.verifier.verify(&binary).await {
            return Err(InstallError::VerificationFailed);
        }
        Ok(InstallOutcome::PackageManager { version })
    }

    async fn via_manual_download(&self) -> Result<InstallOutcome, InstallError> {
        let browser = detect_browser_version(self.runner.as_ref(), self.platform.os);
        let resolved =
            resolve_driver_version(&self.http, &self.config, browser.as_deref(), self.platform.tag).await?;

        let temp_dir = tempfile::Builder::new().prefix("chromedriver_").tempdir()?;
        let binary = download_and_extract(
            &self.http,
            &resolved.build.url,
            self.config.download_timeout(),
            temp_dir.path(),
            self.platform.os,
        )
        .await?;
        let path = install_to_system(
            self.runner.as_ref(),
            &binary,
            self.platform.os,
            &self.system_targets,
            self.user_bin.as_deref(),
        )?;

        if !self.verifier.verify(&path).await {
            return Err(InstallError::VerificationFailed);
        }
        Ok(InstallOutcome::ManualDownload {
            version: resolved.build.version,
            source: resolved.source,
            path,
        })
    }
}
