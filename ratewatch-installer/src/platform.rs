use crate::InstallError;
use std::fmt;

/// Operating systems the installer knows how to provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

impl Os {
    pub fn parse(os: &str) -> Option<Self> {
        match os.to_ascii_lowercase().as_str() {
            "linux" => Some(Os::Linux),
            "macos" | "darwin" => Some(Os::MacOs),
            "windows" => Some(Os::Windows),
            _ => None,
        }
    }

    /// File name of the driver executable on this OS.
    pub fn driver_binary_name(self) -> &'static str {
        match self {
            Os::Windows => "chromedriver.exe",
            Os::Linux | Os::MacOs => "chromedriver",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Os::Linux => "linux",
            Os::MacOs => "macos",
            Os::Windows => "windows",
        })
    }
}

/// Host OS plus the provider's platform tag (`linux64`, `mac-arm64`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub tag: &'static str,
}

impl Platform {
    /// Platform of the running process.
    pub fn detect() -> Result<Self, InstallError> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn from_parts(os: &str, arch: &str) -> Result<Self, InstallError> {
        let tag = platform_identifier(os, arch)?;
        let os = Os::parse(os).ok_or_else(|| unsupported(os, arch))?;
        Ok(Self { os, tag })
    }
}

/// Map an OS/architecture pair to the driver provider's platform tag.
///
/// ```
/// use ratewatch_installer::platform::platform_identifier;
///
/// assert_eq!(platform_identifier("linux", "x86_64").unwrap(), "linux64");
/// assert_eq!(platform_identifier("macos", "aarch64").unwrap(), "mac-arm64");
/// assert!(platform_identifier("freebsd", "x86_64").is_err());
/// ```
pub fn platform_identifier(os: &str, arch: &str) -> Result<&'static str, InstallError> {
    let tag = match (Os::parse(os), arch.to_ascii_lowercase().as_str()) {
        (Some(Os::Linux), "x86_64" | "amd64") => "linux64",
        (Some(Os::Linux), "i386" | "i686" | "x86") => "linux32",
        (Some(Os::MacOs), "x86_64") => "mac-x64",
        (Some(Os::MacOs), "arm64" | "aarch64") => "mac-arm64",
        (Some(Os::Windows), "x86_64" | "amd64") => "win64",
        (Some(Os::Windows), "i386" | "x86") => "win32",
        _ => return Err(unsupported(os, arch)),
    };
    Ok(tag)
}

fn unsupported(os: &str, arch: &str) -> InstallError {
    InstallError::UnsupportedPlatform {
        os: os.to_string(),
        arch: arch.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pairs_map_to_tags() {
        let cases = [
            ("linux", "x86_64", "linux64"),
            ("Linux", "AMD64", "linux64"),
            ("linux", "i686", "linux32"),
            ("darwin", "x86_64", "mac-x64"),
            ("macos", "arm64", "mac-arm64"),
            ("windows", "amd64", "win64"),
            ("windows", "x86", "win32"),
        ];
        for (os, arch, tag) in cases {
            assert_eq!(platform_identifier(os, arch).unwrap(), tag, "{os}/{arch}");
        }
    }

    #[test]
    fn unknown_pairs_fail_fast() {
        for (os, arch) in [("linux", "aarch64"), ("windows", "arm64"), ("freebsd", "x86_64")] {
            let err = platform_identifier(os, arch).unwrap_err();
            assert!(matches!(err, InstallError::UnsupportedPlatform { .. }), "{os}/{arch}");
        }
    }

    #[test]
    fn platform_keeps_os_and_tag() {
        let p = Platform::from_parts("darwin", "aarch64").unwrap();
        assert_eq!(p.os, Os::MacOs);
        assert_eq!(p.tag, "mac-arm64");
        assert_eq!(p.os.driver_binary_name(), "chromedriver");
        assert_eq!(Os::Windows.driver_binary_name(), "chromedriver.exe");
    }
}
