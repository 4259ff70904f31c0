//! Tool status types representing detection results.

use semver::Version;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Metadata for a tool found on the system.
#[derive(Debug, Clone)]
pub struct InstalledMetadata {
    /// Path to the executable.
    pub path: PathBuf,

    /// Parsed semantic version, when `--version` produced one.
    pub version: Option<Version>,

    /// First line of the `--version` output, kept for display when the
    /// output carries no semantic version.
    pub raw_version: Option<String>,

    /// When detection ran.
    pub last_verified: SystemTime,
}

impl InstalledMetadata {
    /// Best available version string for log lines.
    pub fn version_label(&self) -> String {
        match (&self.version, &self.raw_version) {
            (Some(version), _) => version.to_string(),
            (None, Some(raw)) => raw.clone(),
            (None, None) => "unknown".to_string(),
        }
    }
}

/// Typed error variants for version detection failures.
///
/// A tool whose version cannot be read is still present; these errors only
/// explain why [`InstalledMetadata::version`] is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DetectionError {
    /// `--version` exited non-zero or could not be started.
    CommandFailed,

    /// The output contained no semantic version.
    VersionParseFailed,
}

impl DetectionError {
    /// Human-readable description of the error.
    ///
    /// ```rust
    /// use setgo::DetectionError;
    ///
    /// assert_eq!(DetectionError::VersionParseFailed.description(), "Failed to parse version");
    /// ```
    pub fn description(&self) -> &'static str {
        match self {
            Self::CommandFailed => "Version command failed",
            Self::VersionParseFailed => "Failed to parse version",
        }
    }
}

/// Result of tool detection.
#[derive(Debug, Clone)]
pub enum ToolStatus {
    /// Tool found on the system.
    Installed(InstalledMetadata),

    /// Tool not found on `PATH` or any fallback location.
    NotInstalled,
}

impl ToolStatus {
    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed(_))
    }

    /// Path to the executable, if found.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Installed(meta) => Some(&meta.path),
            Self::NotInstalled => None,
        }
    }

    /// Parsed version, if found and parseable.
    pub fn version(&self) -> Option<&Version> {
        match self {
            Self::Installed(meta) => meta.version.as_ref(),
            Self::NotInstalled => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(version: Option<&str>, raw: Option<&str>) -> InstalledMetadata {
        InstalledMetadata {
            path: PathBuf::from("/usr/bin/python3"),
            version: version.map(|v| Version::parse(v).unwrap()),
            raw_version: raw.map(str::to_string),
            last_verified: SystemTime::now(),
        }
    }

    #[test]
    fn test_installed_status() {
        let status = ToolStatus::Installed(metadata(Some("3.12.1"), Some("Python 3.12.1")));
        assert!(status.is_installed());
        assert_eq!(status.path(), Some(Path::new("/usr/bin/python3")));
        assert_eq!(status.version(), Some(&Version::new(3, 12, 1)));
    }

    #[test]
    fn test_not_installed_status() {
        let status = ToolStatus::NotInstalled;
        assert!(!status.is_installed());
        assert!(status.path().is_none());
        assert!(status.version().is_none());
    }

    #[test]
    fn test_version_label_fallbacks() {
        assert_eq!(metadata(Some("1.95.0"), None).version_label(), "1.95.0");
        assert_eq!(metadata(None, Some("Python 3.12")).version_label(), "Python 3.12");
        assert_eq!(metadata(None, None).version_label(), "unknown");
    }

    #[test]
    fn test_detection_error_descriptions() {
        assert_eq!(
            DetectionError::CommandFailed.description(),
            "Version command failed"
        );
        assert_eq!(
            DetectionError::VersionParseFailed.description(),
            "Failed to parse version"
        );
    }
}
