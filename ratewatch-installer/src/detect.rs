use crate::command::CommandRunner;
use crate::platform::Os;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info};

/// Upper bound for one `--version` probe.
pub const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Browser executables probed with `--version`, in order.
pub fn browser_commands(os: Os) -> &'static [&'static str] {
    match os {
        Os::Linux => &["google-chrome", "chromium-browser", "chromium"],
        Os::MacOs => &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ],
        Os::Windows => &["chrome.exe", "chromium.exe"],
    }
}

/// Version of the first installed browser that answers `--version`.
pub fn detect_browser_version(runner: &dyn CommandRunner, os: Os) -> Option<String> {
    for program in browser_commands(os) {
        match runner.run_with_timeout(program, &["--version"], VERSION_PROBE_TIMEOUT) {
            Ok(out) if out.success => {
                if let Some(version) = version_from_output(&out.stdout) {
                    info!(target: "installer.browser", %program, %version, "Detected browser version");
                    return Some(version);
                }
            }
            Ok(out) => debug!(target: "installer.browser", %program, stderr = %out.stderr.trim(), "probe failed"),
            Err(e) => debug!(target: "installer.browser", %program, error = %e, "probe failed"),
        }
    }
    info!(target: "installer.browser", "Browser version not detected, will use latest stable");
    None
}

/// Pull the version number out of `--version` output.
///
/// Prefers the last dotted number, so trailing words such as Chromium's
/// `snap` suffix are ignored; otherwise falls back to the last token.
pub fn version_from_output(stdout: &str) -> Option<String> {
    let line = stdout.trim();
    let re = Regex::new(r"\d+(?:\.\d+)+").ok()?;
    if let Some(m) = re.find_iter(line).last() {
        return Some(m.as_str().to_string());
    }
    line.split_whitespace().last().map(str::to_string)
}
