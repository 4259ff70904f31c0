//! Type definitions shared by the installer components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an install command writes to.
///
/// `System` commands are the ones that need elevated rights; on platforms
/// with secret-based elevation they are run through `sudo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallLocation {
    /// User-owned prefix (Homebrew, pip user site, editor extensions).
    UserLocal,
    /// System-wide (apt, Chocolatey).
    System,
}

/// A fully resolved package manager invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallCommand {
    /// Program followed by its arguments. Never contains credentials.
    pub argv: Vec<String>,

    /// Where the command installs to.
    pub location: InstallLocation,

    /// Human-readable description (e.g. "Install Python via brew").
    pub description: String,
}

impl InstallCommand {
    pub fn needs_elevation(&self) -> bool {
        self.location == InstallLocation::System
    }

    /// The command as a single display string.
    pub fn raw_command(&self) -> String {
        self.argv.join(" ")
    }
}

/// Password used to authorize privileged changes through `sudo`.
///
/// The value is never printed: `Debug` is redacted and there is no
/// `Display`. It only leaves the process through a child's stdin.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ElevationSecret(String);

impl ElevationSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ElevationSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ElevationSecret(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = ElevationSecret::new("hunter2");
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("hunter2"));
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_needs_elevation() {
        let mut cmd = InstallCommand {
            argv: vec!["apt-get".into(), "install".into(), "-y".into(), "code".into()],
            location: InstallLocation::System,
            description: "Install VS Code via apt-get".into(),
        };
        assert!(cmd.needs_elevation());
        assert_eq!(cmd.raw_command(), "apt-get install -y code");

        cmd.location = InstallLocation::UserLocal;
        assert!(!cmd.needs_elevation());
    }
}
