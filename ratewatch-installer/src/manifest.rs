//! Driver version resolution.
//!
//! The Chrome-for-Testing manifest is consulted first; the legacy
//! `LATEST_RELEASE` endpoint is the last resort.
use crate::InstallError;
use ratewatch_config::InstallerConfig;
use ratewatch_http::{HttpClient, RequestOpts};
use serde::Deserialize;
use std::fmt;
use tracing::{info, warn};

/// `known-good-versions-with-downloads.json`, reduced to what we read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub versions: Vec<ManifestVersion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManifestVersion {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub downloads: Downloads,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Downloads {
    #[serde(default)]
    pub chromedriver: Vec<PlatformDownload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformDownload {
    pub platform: String,
    pub url: String,
}

impl ManifestVersion {
    fn download_for(&self, platform: &str) -> Option<&PlatformDownload> {
        self.downloads.chromedriver.iter().find(|d| d.platform == platform)
    }

    fn build_for(&self, platform: &str) -> Option<DriverBuild> {
        self.download_for(platform).map(|d| DriverBuild {
            version: self.version.clone(),
            url: d.url.clone(),
        })
    }
}

/// A concrete driver build: version plus archive URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverBuild {
    pub version: String,
    pub url: String,
}

/// Where a resolved version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    Manifest,
    Legacy,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VersionSource::Manifest => "manifest",
            VersionSource::Legacy => "legacy",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDriver {
    pub build: DriverBuild,
    pub source: VersionSource,
}

/// Pick a build for `platform` from the manifest.
///
/// With a known browser version, versions are scanned newest first for one
/// sharing the browser's major version and offering a download for the
/// platform. Otherwise, or when nothing matches, the newest entry is used
/// if it has the platform.
pub fn resolve_from_manifest(
    manifest: &Manifest,
    browser_version: Option<&str>,
    platform: &str,
) -> Option<DriverBuild> {
    if let Some(major) = browser_version.and_then(|v| v.split('.').next()) {
        let prefix = format!("{major}.");
        let matched = manifest
            .versions
            .iter()
            .rev()
            .filter(|v| v.version.starts_with(&prefix))
            .find_map(|v| v.build_for(platform));
        if matched.is_some() {
            return matched;
        }
    }
    manifest.versions.last()?.build_for(platform)
}

/// Legacy archive URL for `version`.
pub fn legacy_download_url(base: &str, version: &str, platform: &str) -> String {
    format!(
        "{}/{version}/chromedriver_{platform}.zip",
        base.trim_end_matches('/')
    )
}

/// Resolve a driver build: manifest API first, then the legacy endpoint.
pub async fn resolve_driver_version(
    http: &HttpClient,
    config: &InstallerConfig,
    browser_version: Option<&str>,
    platform: &str,
) -> Result<ResolvedDriver, InstallError> {
    let opts = RequestOpts::with_timeout(config.request_timeout());

    match http.get_json::<Manifest>(&config.manifest_url, opts.clone()).await {
        Ok(manifest) => {
            if let Some(build) = resolve_from_manifest(&manifest, browser_version, platform) {
                info!(target: "installer.resolve", version = %build.version, "Found compatible version");
                return Ok(ResolvedDriver {
                    build,
                    source: VersionSource::Manifest,
                });
            }
            warn!(target: "installer.resolve", %platform, "No manifest build for platform");
        }
        Err(e) => warn!(target: "installer.resolve", error = %e, "Manifest API unavailable"),
    }

    let version = http
        .get_text(&config.legacy_url, opts)
        .await
        .map_err(|e| InstallError::VersionResolution(e.to_string()))?;
    if version.is_empty() {
        return Err(InstallError::VersionResolution(
            "legacy endpoint returned an empty version".into(),
        ));
    }
    info!(target: "installer.resolve", %version, "Using legacy version");
    Ok(ResolvedDriver {
        build: DriverBuild {
            url: legacy_download_url(&config.legacy_download_base, &version, platform),
            version,
        },
        source: VersionSource::Legacy,
    })
}
