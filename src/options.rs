//! Bootstrap options configuration.
//!
//! [`BootstrapOptions`] collects every tunable of a run. The binary fills it
//! from command-line flags and `SETGO_*` environment variables; library
//! users can build it directly or deserialize it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for an installation run.
///
/// # Example
///
/// ```rust
/// use setgo::BootstrapOptions;
/// use std::time::Duration;
///
/// // Non-interactive run: no pacing, runtime and editor only.
/// let opts = BootstrapOptions {
///     install_libraries: false,
///     install_extensions: false,
///     step_delay: Duration::ZERO,
///     ..Default::default()
/// };
/// assert_eq!(opts.command_timeout, Duration::from_secs(30 * 60));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapOptions {
    /// Run the Python library stage.
    ///
    /// Default: `true`
    pub install_libraries: bool,

    /// Run the VS Code extension stage.
    ///
    /// Default: `true`
    pub install_extensions: bool,

    /// Pause after each progress step so the percentage moves visibly.
    ///
    /// Default: 50 milliseconds. Zero disables pacing.
    pub step_delay: Duration,

    /// Upper bound for any single external command. The child is killed
    /// when it expires.
    ///
    /// Default: 30 minutes
    pub command_timeout: Duration,

    /// `host:port` the connectivity probe connects to.
    ///
    /// Default: `8.8.8.8:53`
    pub probe_address: String,

    /// Timeout of the connectivity probe.
    ///
    /// Default: 3 seconds
    pub probe_timeout: Duration,

    /// Single-instance lock file.
    ///
    /// Default: `setgo.lock` in the system temp directory
    pub lock_path: PathBuf,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            install_libraries: true,
            install_extensions: true,
            step_delay: Duration::from_millis(50),
            command_timeout: Duration::from_secs(30 * 60),
            probe_address: "8.8.8.8:53".to_string(),
            probe_timeout: Duration::from_secs(3),
            lock_path: std::env::temp_dir().join("setgo.lock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = BootstrapOptions::default();
        assert!(opts.install_libraries);
        assert!(opts.install_extensions);
        assert_eq!(opts.step_delay, Duration::from_millis(50));
        assert_eq!(opts.probe_address, "8.8.8.8:53");
        assert!(opts.lock_path.ends_with("setgo.lock"));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let opts: BootstrapOptions =
            serde_json::from_str(r#"{ "install_extensions": false }"#).unwrap();
        assert!(!opts.install_extensions);
        assert!(opts.install_libraries);
        assert_eq!(opts.probe_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_serde_roundtrip() {
        let opts = BootstrapOptions {
            step_delay: Duration::ZERO,
            probe_address: "1.1.1.1:443".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&opts).unwrap();
        let back: BootstrapOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, opts);
    }
}
