use crate::InstallError;
use crate::platform::Os;
use ratewatch_http::{HttpClient, RequestOpts};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use zip::ZipArchive;

/// Download the driver archive into `temp_dir`, unpack it and return the
/// path of the executable inside.
pub async fn download_and_extract(
    http: &HttpClient,
    url: &str,
    timeout: Duration,
    temp_dir: &Path,
    os: Os,
) -> Result<PathBuf, InstallError> {
    info!(target: "installer.download", %url, "Downloading ChromeDriver");
    let bytes = http.get_bytes(url, RequestOpts::with_timeout(timeout)).await?;

    let zip_path = temp_dir.join("chromedriver.zip");
    fs::write(&zip_path, &bytes)?;

    let extract_dir = temp_dir.join("extracted");
    unzip(&zip_path, &extract_dir)?;

    let binary = find_file(&extract_dir, os.driver_binary_name())?
        .ok_or(InstallError::BinaryNotFound)?;
    if os != Os::Windows {
        make_executable(&binary)?;
    }
    debug!(target: "installer.download", path = %binary.display(), "archive unpacked");
    Ok(binary)
}

/// Unpack `zip_file` under `to_dir`, skipping entries that would escape it.
pub fn unzip(zip_file: &Path, to_dir: &Path) -> Result<(), InstallError> {
    let mut archive = ZipArchive::new(File::open(zip_file)?)?;
    fs::create_dir_all(to_dir)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(relative) = entry.enclosed_name() else {
            debug!(target: "installer.download", name = %entry.name(), "skipping unsafe entry");
            continue;
        };
        let out_path = to_dir.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
    }
    Ok(())
}

/// Depth-first search for a file called `name` under `dir`.
pub fn find_file(dir: &Path, name: &str) -> io::Result<Option<PathBuf>> {
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            subdirs.push(path);
        } else if entry.file_name() == name {
            return Ok(Some(path));
        }
    }
    for sub in subdirs {
        if let Some(found) = find_file(&sub, name)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

#[cfg(unix)]
pub(crate) fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
pub(crate) fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zip::write::SimpleFileOptions;

    fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn finds_binary_in_nested_folder() {
        let server = MockServer::start().await;
        let body = archive(&[
            ("chromedriver-linux64/LICENSE.chromedriver", b"license"),
            ("chromedriver-linux64/chromedriver", b"#!/bin/sh\n"),
        ]);
        Mock::given(method("GET"))
            .and(path("/120.0.6099.71/chromedriver-linux64.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let http = HttpClient::new().unwrap();
        let url = format!("{}/120.0.6099.71/chromedriver-linux64.zip", server.uri());
        let binary = download_and_extract(&http, &url, Duration::from_secs(5), tmp.path(), Os::Linux)
            .await
            .unwrap();

        assert!(binary.ends_with("chromedriver-linux64/chromedriver"));
        assert!(tmp.path().join("chromedriver.zip").exists());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&binary).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn archive_without_binary_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(archive(&[("README", b"hi")])))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let http = HttpClient::new().unwrap();
        let err = download_and_extract(&http, &server.uri(), Duration::from_secs(5), tmp.path(), Os::Linux)
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::BinaryNotFound));
    }

    #[tokio::test]
    async fn windows_looks_for_exe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(archive(&[
                ("chromedriver", b"wrong"),
                ("chromedriver-win64/chromedriver.exe", b"MZ"),
            ])))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let http = HttpClient::new().unwrap();
        let binary = download_and_extract(&http, &server.uri(), Duration::from_secs(5), tmp.path(), Os::Windows)
            .await
            .unwrap();
        assert_eq!(binary.file_name().unwrap(), "chromedriver.exe");
    }

    #[tokio::test]
    async fn http_failure_is_propagated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let http = HttpClient::new().unwrap();
        let err = download_and_extract(&http, &server.uri(), Duration::from_secs(5), tmp.path(), Os::Linux)
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::Http(_)));
    }
}
