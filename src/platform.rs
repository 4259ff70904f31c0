//! Host platform strategy.
//!
//! Every OS-specific decision the installer makes lives here: which package
//! manager installs the runtime and the editor, how privileges are obtained,
//! and where tools hide when they are not on `PATH`. The platform is
//! resolved once at startup with [`Platform::current`] and passed down.

use crate::detection::ToolLocator;
use crate::install::{InstallCommand, InstallLocation};
use crate::ToolKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The operating system family the installer runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
pub enum Platform {
    /// macOS, using Homebrew.
    MacOs,
    /// Debian-family Linux, using apt.
    Linux,
    /// Windows, using Chocolatey.
    Windows,
    /// Anything else. Detection still works; installation is skipped.
    Unsupported,
}

/// How a platform obtains the rights to modify the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationMechanism {
    /// The whole process is relaunched through the native elevation prompt.
    Relaunch,
    /// A password is piped into `sudo` for each privileged command.
    Secret,
    /// Nothing is installed, so nothing needs elevating.
    None,
}

/// Result of asking a platform how to install a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallRoute {
    /// Run this command.
    Command(InstallCommand),
    /// The platform's package manager could not be found.
    ManagerMissing {
        /// Executable name of the missing manager.
        manager: &'static str,
    },
    /// The platform has no automated install path.
    Unsupported,
}

impl Platform {
    /// The platform this binary is running on.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an OS identifier (as in `std::env::consts::OS`) to a platform.
    ///
    /// ```rust
    /// use setgo::Platform;
    ///
    /// assert_eq!(Platform::from_os("macos"), Platform::MacOs);
    /// assert_eq!(Platform::from_os("freebsd"), Platform::Unsupported);
    /// ```
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Self::MacOs,
            "linux" => Self::Linux,
            "windows" => Self::Windows,
            _ => Self::Unsupported,
        }
    }

    /// Human-readable name for log lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MacOs => "macOS",
            Self::Linux => "Linux",
            Self::Windows => "Windows",
            Self::Unsupported => "unsupported platform",
        }
    }

    pub fn elevation_mechanism(&self) -> ElevationMechanism {
        match self {
            Self::Windows => ElevationMechanism::Relaunch,
            Self::MacOs | Self::Linux => ElevationMechanism::Secret,
            Self::Unsupported => ElevationMechanism::None,
        }
    }

    /// Executable name of the system package manager, if the platform has one.
    pub fn package_manager(&self) -> Option<&'static str> {
        match self {
            Self::MacOs => Some("brew"),
            Self::Linux => Some("apt-get"),
            Self::Windows => Some("choco"),
            Self::Unsupported => None,
        }
    }

    /// Absolute locations probed when `name` is not on `PATH`.
    ///
    /// Homebrew lives in a different prefix on Apple Silicon and Intel, and
    /// neither is guaranteed to be on the `PATH` of a GUI-launched process.
    /// A per-user VS Code install on Windows only exists under
    /// `%LOCALAPPDATA%`, so that entry depends on the environment.
    pub fn fallback_paths(&self, name: &str) -> Vec<PathBuf> {
        let fixed: &[&str] = match (self, name) {
            (Self::MacOs, "brew") => &["/opt/homebrew/bin/brew", "/usr/local/bin/brew"],
            (Self::Linux, "brew") => &["/home/linuxbrew/.linuxbrew/bin/brew"],
            (Self::MacOs, "python3") => &["/opt/homebrew/bin/python3", "/usr/local/bin/python3"],
            (Self::MacOs, "code") => &[
                "/Applications/Visual Studio Code.app/Contents/Resources/app/bin/code",
                "/usr/local/bin/code",
            ],
            (Self::Windows, "choco") => &[r"C:\ProgramData\chocolatey\bin\choco.exe"],
            (Self::Windows, "code") => {
                return std::env::var_os("LOCALAPPDATA")
                    .map(|local| windows_user_code(Path::new(&local)))
                    .into_iter()
                    .chain([PathBuf::from(
                        r"C:\Program Files\Microsoft VS Code\bin\code.cmd",
                    )])
                    .collect();
            }
            _ => &[],
        };
        fixed.iter().map(PathBuf::from).collect()
    }

    /// Resolve the command that installs `kind` on this platform.
    pub fn install_route<L>(&self, kind: ToolKind, locator: &L) -> InstallRoute
    where
        L: ToolLocator + ?Sized,
    {
        let Some(manager) = self.package_manager() else {
            return InstallRoute::Unsupported;
        };
        let Some(manager_path) = locator.locate(manager) else {
            return InstallRoute::ManagerMissing { manager };
        };
        let program = manager_path.to_string_lossy().into_owned();

        let (args, location): (&[&str], _) = match (self, kind) {
            (Self::MacOs, ToolKind::Runtime) => (&["install", "python"], InstallLocation::UserLocal),
            (Self::MacOs, ToolKind::Editor) => (
                &["install", "--cask", "visual-studio-code"],
                InstallLocation::UserLocal,
            ),
            (Self::Linux, ToolKind::Runtime) => (
                &["install", "-y", "python3", "python3-pip"],
                InstallLocation::System,
            ),
            (Self::Linux, ToolKind::Editor) => (&["install", "-y", "code"], InstallLocation::System),
            (Self::Windows, ToolKind::Runtime) => (&["install", "python", "-y"], InstallLocation::System),
            (Self::Windows, ToolKind::Editor) => (&["install", "vscode", "-y"], InstallLocation::System),
            (Self::Unsupported, _) => return InstallRoute::Unsupported,
        };

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(program);
        argv.extend(args.iter().map(|arg| arg.to_string()));

        InstallRoute::Command(InstallCommand {
            argv,
            location,
            description: format!("Install {} via {}", kind.display_name(), manager),
        })
    }
}

/// `code.cmd` of a per-user VS Code install under `local_app_data`.
fn windows_user_code(local_app_data: &Path) -> PathBuf {
    local_app_data
        .join("Programs")
        .join("Microsoft VS Code")
        .join("bin")
        .join("code.cmd")
}
