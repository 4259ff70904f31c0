//! # setgo
//!
//! Bootstraps a Python development environment: Python, VS Code, a fixed set
//! of Python libraries and a fixed set of editor extensions.
//!
//! Tools that are already present are reported and left alone. Missing ones
//! are installed through the host's package manager (Homebrew on macOS, apt
//! on Linux, Chocolatey on Windows).
//!
//! ## Features
//!
//! - `detect()` / `survey()` for read-only detection of Python and VS Code
//! - `Orchestrator` runs an `InstallationPlan` on a background task,
//!   streaming `RunEvent`s (log lines, progress, one terminal outcome)
//! - Cooperative and prompt cancellation through `RunHandle::cancel()`
//! - Pre-flight connectivity and privilege checks before anything changes
//! - `InstanceLock` so that only one installer runs at a time
//!
//! ## Example
//!
//! ```rust,no_run
//! use setgo::{survey, PathLocator, Platform, SystemRunner};
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let platform = Platform::current();
//!     let runner = SystemRunner::new(Duration::from_secs(10));
//!     let tools = survey(platform, &PathLocator::new(platform), &runner).await;
//!     for (kind, status) in tools {
//!         println!("{}: installed={}", kind.display_name(), status.is_installed());
//!     }
//! }
//! ```

mod detect;
mod detection;
mod instance;
mod options;
mod platform;
mod tool_kind;
mod tool_status;

pub mod install;

pub use detect::{detect, survey};
pub use detection::{PathLocator, ToolLocator};
pub use instance::{InstanceLock, LockError};
pub use options::BootstrapOptions;
pub use platform::{ElevationMechanism, InstallRoute, Platform};
pub use tool_kind::ToolKind;
pub use tool_status::{DetectionError, InstalledMetadata, ToolStatus};

pub use install::{
    check_connectivity, distribute, elevate, relaunch_command, Cancellation, CommandResult,
    CommandRunner, Elevation, ElevationSecret, ExecutionContext, InstallCommand, InstallLocation,
    InstallationPlan, NetworkProbe, Orchestrator, Outcome, PreflightError, ProgressState,
    ProgressTracker, RunEvent, RunHandle, Stage, StageAction, StageKind, SystemRunner, TcpProbe,
    EDITOR_EXTENSIONS, PYTHON_LIBRARIES,
};
