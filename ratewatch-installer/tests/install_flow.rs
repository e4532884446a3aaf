use async_trait::async_trait;
use ratewatch_config::InstallerConfig;
use ratewatch_installer::command::{CommandOutput, CommandRunner};
use ratewatch_installer::manifest::VersionSource;
use ratewatch_installer::verify::DriverVerifier;
use ratewatch_installer::{InstallError, InstallMethod, InstallOutcome, Installer};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;

/// Answers `program args...` lines from a script; anything else is "not installed".
#[derive(Clone, Default)]
struct ScriptedRunner {
    script: Vec<(&'static str, bool, &'static str)>,
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let line = format!("{program} {}", args.join(" "));
        match self.script.iter().find(|(cmd, _, _)| line == *cmd) {
            Some((_, success, stdout)) => Ok(CommandOutput {
                success: *success,
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
            None => Err(io::Error::new(io::ErrorKind::NotFound, line)),
        }
    }
}

#[derive(Clone)]
struct FixedVerifier {
    answer: bool,
    seen: Arc<Mutex<Vec<PathBuf>>>,
}

impl FixedVerifier {
    fn new(answer: bool) -> Self {
        Self {
            answer,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl DriverVerifier for FixedVerifier {
    async fn verify(&self, driver: &Path) -> bool {
        self.seen.lock().unwrap().push(driver.to_path_buf());
        self.answer
    }
}

fn config_for(server: &MockServer) -> InstallerConfig {
    InstallerConfig {
        manifest_url: format!("{}/known-good-versions-with-downloads.json", server.uri()),
        legacy_url: format!("{}/LATEST_RELEASE", server.uri()),
        legacy_download_base: server.uri(),
        request_timeout_secs: 5,
        download_timeout_secs: 5,
        ..InstallerConfig::default()
    }
}

fn driver_zip() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
    writer
        .start_file("chromedriver-linux64/chromedriver", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"#!/bin/sh\necho ChromeDriver\n").unwrap();
    writer.finish().unwrap().into_inner()
}

fn apt_failing() -> ScriptedRunner {
    ScriptedRunner {
        script: vec![
            ("sudo apt-get update", false, ""),
            ("google-chrome --version", true, "Google Chrome 120.0.6099.109\n"),
        ],
    }
}

#[tokio::test]
async fn unsupported_platform_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = Installer::for_platform(config_for(&server), "plan9", "mips")
        .err()
        .expect("platform must be rejected");
    assert!(matches!(err, InstallError::UnsupportedPlatform { ref os, .. } if os == "plan9"));
}

#[tokio::test]
async fn package_manager_wins_when_verified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let runner = ScriptedRunner {
        script: vec![
            ("sudo apt-get update", true, ""),
            ("sudo apt-get install -y chromium-browser chromium-chromedriver", true, ""),
            ("chromedriver --version", true, "ChromeDriver 120.0.6099.71\n"),
        ],
    };
    let verifier = FixedVerifier::new(true);
    let installer = Installer::for_platform(config_for(&server), "linux", "x86_64")
        .unwrap()
        .with_runner(runner)
        .with_verifier(verifier.clone());

    let outcome = installer.install().await.unwrap();
    assert_eq!(
        outcome,
        InstallOutcome::PackageManager {
            version: "ChromeDriver 120.0.6099.71".into()
        }
    );
    assert_eq!(*verifier.seen.lock().unwrap(), vec![PathBuf::from("chromedriver")]);
}

#[tokio::test]
async fn manual_download_from_manifest() {
    let server = MockServer::start().await;
    let archive_url = format!("{}/cft/120.0.6099.71/linux64/chromedriver-linux64.zip", server.uri());
    Mock::given(method("GET"))
        .and(path("/known-good-versions-with-downloads.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "timestamp": "2024-01-01T00:00:00.000Z",
            "versions": [
                { "version": "119.0.6045.105", "revision": "1204232",
                  "downloads": { "chromedriver": [
                    { "platform": "linux64", "url": format!("{}/cft/119/linux64.zip", server.uri()) }
                  ] } },
                { "version": "120.0.6099.71", "revision": "1217362",
                  "downloads": { "chrome": [], "chromedriver": [
                    { "platform": "linux64", "url": archive_url },
                    { "platform": "win64", "url": "https://unused.test/win64.zip" }
                  ] } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cft/120.0.6099.71/linux64/chromedriver-linux64.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(driver_zip()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/LATEST_RELEASE"))
        .respond_with(ResponseTemplate::new(200).set_body_string("114.0.5735.90"))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let user_bin = home.path().join(".local/bin");
    let verifier = FixedVerifier::new(true);
    let installer = Installer::for_platform(config_for(&server), "linux", "x86_64")
        .unwrap()
        .with_runner(apt_failing())
        .with_verifier(verifier.clone())
        .with_install_dirs(Vec::new(), Some(user_bin.clone()));

    let outcome = installer.install().await.unwrap();
    assert_eq!(outcome.method(), InstallMethod::ManualDownload);
    assert_eq!(
        outcome,
        InstallOutcome::ManualDownload {
            version: "120.0.6099.71".into(),
            source: VersionSource::Manifest,
            path: user_bin.join("chromedriver"),
        }
    );
    assert!(user_bin.join("chromedriver").exists());
    assert_eq!(*verifier.seen.lock().unwrap(), vec![user_bin.join("chromedriver")]);
}

#[tokio::test]
async fn legacy_endpoint_when_manifest_is_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/known-good-versions-with-downloads.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/LATEST_RELEASE"))
        .respond_with(ResponseTemplate::new(200).set_body_string("114.0.5735.90\n"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/114.0.5735.90/chromedriver_linux64.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(driver_zip()))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let installer = Installer::for_platform(config_for(&server), "linux", "x86_64")
        .unwrap()
        .with_runner(apt_failing())
        .with_verifier(FixedVerifier::new(true))
        .with_install_dirs(Vec::new(), Some(home.path().to_path_buf()));

    match installer.install().await.unwrap() {
        InstallOutcome::ManualDownload { version, source, .. } => {
            assert_eq!(version, "114.0.5735.90");
            assert_eq!(source, VersionSource::Legacy);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn failed_verification_everywhere_is_exhaustion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/known-good-versions-with-downloads.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/LATEST_RELEASE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let runner = ScriptedRunner {
        script: vec![
            ("sudo apt-get update", true, ""),
            ("sudo apt-get install -y chromium-browser chromium-chromedriver", true, ""),
            ("chromedriver --version", true, "ChromeDriver 120.0.6099.71\n"),
        ],
    };
    let verifier = FixedVerifier::new(false);
    let installer = Installer::for_platform(config_for(&server), "linux", "x86_64")
        .unwrap()
        .with_runner(runner)
        .with_verifier(verifier.clone())
        .with_install_dirs(Vec::new(), None);

    let err = installer.install().await.unwrap_err();
    assert!(matches!(err, InstallError::Exhausted));
    assert_eq!(verifier.seen.lock().unwrap().len(), 1);
}
