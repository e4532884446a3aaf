use crate::InstallError;
use crate::command::{CommandRunner, run_checked};
use crate::download::make_executable;
use crate::platform::Os;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const APT_STEPS: &[&[&str]] = &[
    &["sudo", "apt-get", "update"],
    &["sudo", "apt-get", "install", "-y", "chromium-browser", "chromium-chromedriver"],
];
const BREW_STEPS: &[&[&str]] = &[&["brew", "install", "chromedriver"]];

/// System directories tried in order before the user fallback.
pub fn system_targets(os: Os) -> Vec<PathBuf> {
    match os {
        Os::Linux => vec!["/usr/local/bin".into(), "/usr/bin".into()],
        Os::MacOs => vec!["/usr/local/bin".into(), "/opt/homebrew/bin".into()],
        Os::Windows => env::var_os("PROGRAMFILES")
            .map(|p| PathBuf::from(p).join("ChromeDriver"))
            .into_iter()
            .collect(),
    }
}

/// `~/.local/bin`, when a home directory is known.
pub fn user_bin_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".local").join("bin"))
}

/// Copy `binary` into the first usable system directory, falling back to
/// `user_bin`. Returns the installed path.
pub fn install_to_system(
    runner: &dyn CommandRunner,
    binary: &Path,
    os: Os,
    targets: &[PathBuf],
    user_bin: Option<&Path>,
) -> Result<PathBuf, InstallError> {
    let name = os.driver_binary_name();
    for dir in targets {
        match install_into(runner, binary, os, dir, name) {
            Ok(Some(path)) => {
                info!(target: "installer.install", path = %path.display(), "ChromeDriver installed");
                return Ok(path);
            }
            Ok(None) => debug!(target: "installer.install", dir = %dir.display(), "directory missing, skipped"),
            Err(e) => debug!(target: "installer.install", dir = %dir.display(), error = %e, "install failed"),
        }
    }

    let user_bin = user_bin.ok_or(InstallError::NoInstallLocation)?;
    fs::create_dir_all(user_bin)?;
    let target = user_bin.join(name);
    fs::copy(binary, &target)?;
    if os != Os::Windows {
        make_executable(&target)?;
    }
    info!(target: "installer.install", path = %target.display(), "ChromeDriver installed to user directory");
    warn!(target: "installer.install", dir = %user_bin.display(), "Make sure this directory is in your PATH");
    Ok(target)
}

fn install_into(
    runner: &dyn CommandRunner,
    binary: &Path,
    os: Os,
    dir: &Path,
    name: &str,
) -> Result<Option<PathBuf>, InstallError> {
    if !dir.exists() {
        if os != Os::Windows {
            return Ok(None);
        }
        fs::create_dir_all(dir)?;
    }
    let target = dir.join(name);
    if os == Os::Windows {
        fs::copy(binary, &target)?;
    } else {
        let src = binary.to_string_lossy();
        let dst = target.to_string_lossy();
        run_checked(runner, "sudo", &["cp", src.as_ref(), dst.as_ref()])?;
        run_checked(runner, "sudo", &["chmod", "+x", dst.as_ref()])?;
    }
    Ok(Some(target))
}

/// Install through the system package manager and return the version
/// reported by `chromedriver --version`.
pub fn install_via_package_manager(runner: &dyn CommandRunner, os: Os) -> Result<String, InstallError> {
    let steps = match os {
        Os::Linux => APT_STEPS,
        Os::MacOs => BREW_STEPS,
        Os::Windows => return Err(InstallError::NoPackageManager(os)),
    };
    for step in steps {
        info!(target: "installer.package", command = %step.join(" "), "Running");
        run_checked(runner, step[0], &step[1..])?;
    }
    let out = run_checked(runner, "chromedriver", &["--version"])?;
    let version = out.stdout.trim().to_string();
    info!(target: "installer.package", %version, "Package manager installation successful");
    Ok(version)
}
