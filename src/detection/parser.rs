//! Version output parsing with regex extraction.

use crate::DetectionError;
use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

static SEMVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("Invalid regex pattern"));

static VERSION_FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Version:\s*(\S+)").expect("Invalid regex pattern"));

/// Parse a semantic version from CLI output.
///
/// - `Python 3.12.1` -> 3.12.1
/// - `1.95.3\nf1a4fb10\nx64` (VS Code) -> 1.95.3
pub(crate) fn parse_version(output: &str) -> Result<Version, DetectionError> {
    let caps = SEMVER_RE
        .captures(output)
        .ok_or(DetectionError::VersionParseFailed)?;
    Version::parse(&caps[0]).map_err(|_| DetectionError::VersionParseFailed)
}

/// Extract the `Version:` field from `pip show` output.
///
/// Returned as-is: pip versions are PEP 440, not semver (`2.2.0rc1`, `24.0`).
pub(crate) fn parse_version_field(output: &str) -> Option<String> {
    VERSION_FIELD_RE
        .captures(output)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_python_version() {
        assert_eq!(
            parse_version("Python 3.12.1").unwrap(),
            Version::new(3, 12, 1)
        );
    }

    #[test]
    fn test_parse_vscode_version() {
        let output = "1.95.3\nf1a4fb101478ce6ec82fe9627c43efbf9e98c813\nx64";
        assert_eq!(parse_version(output).unwrap(), Version::new(1, 95, 3));
    }

    #[test]
    fn test_parse_version_incomplete() {
        assert!(matches!(
            parse_version("Python 3.12"),
            Err(DetectionError::VersionParseFailed)
        ));
    }

    #[test]
    fn test_parse_version_field() {
        let output = "Name: numpy\nVersion: 2.1.3\nSummary: Fundamental package for array computing";
        assert_eq!(parse_version_field(output).as_deref(), Some("2.1.3"));
    }

    #[test]
    fn test_parse_version_field_keeps_pep440() {
        let output = "Name: pandas\nVersion: 2.2.0rc1\n";
        assert_eq!(parse_version_field(output).as_deref(), Some("2.2.0rc1"));
    }

    #[test]
    fn test_parse_version_field_must_start_line() {
        assert_eq!(parse_version_field("Requires-Version: 3"), None);
        assert_eq!(parse_version_field("WARNING: Package(s) not found: nope"), None);
    }
}
