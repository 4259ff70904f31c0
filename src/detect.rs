//! Tool detection functions.

use crate::detection::{parse_version, ToolLocator};
use crate::install::CommandRunner;
use crate::{DetectionError, InstalledMetadata, Platform, ToolKind, ToolStatus};
use futures::future::join_all;
use std::collections::HashMap;
use std::time::SystemTime;
use tracing::debug;

/// Detect a single tool.
///
/// 1. Locate the executable on `PATH` or the platform's fallback paths
/// 2. Run `{executable} --version` through `runner`
/// 3. Parse a semantic version out of the output
///
/// Presence is decided by step 1 alone. A tool whose version cannot be read
/// is still `Installed`, with `version: None`.
///
/// # Example
///
/// ```rust,no_run
/// use setgo::{detect, PathLocator, Platform, SystemRunner, ToolKind};
/// use std::time::Duration;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let platform = Platform::current();
///     let runner = SystemRunner::new(Duration::from_secs(10));
///     let status = detect(ToolKind::Runtime, platform, &PathLocator::new(platform), &runner).await;
///     println!("Python installed: {}", status.is_installed());
/// }
/// ```
pub async fn detect<R, L>(kind: ToolKind, platform: Platform, locator: &L, runner: &R) -> ToolStatus
where
    R: CommandRunner,
    L: ToolLocator + ?Sized,
{
    let Some(path) = locator.locate(kind.executable_name(platform)) else {
        return ToolStatus::NotInstalled;
    };

    let argv = vec![path.to_string_lossy().into_owned(), "--version".to_string()];
    let result = runner.run(&argv, None, true).await;

    let raw_version = result
        .stdout
        .as_deref()
        .and_then(|out| out.lines().next())
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty());

    let version = if result.succeeded {
        raw_version
            .as_deref()
            .ok_or(DetectionError::VersionParseFailed)
            .and_then(parse_version)
    } else {
        Err(DetectionError::CommandFailed)
    };

    if let Err(err) = &version {
        debug!(tool = kind.display_name(), path = %path.display(), "{}", err.description());
    }

    ToolStatus::Installed(InstalledMetadata {
        path,
        version: version.ok(),
        raw_version,
        last_verified: SystemTime::now(),
    })
}

/// Detect every [`ToolKind`] concurrently.
///
/// Used for a read-only status report; nothing is installed.
pub async fn survey<R, L>(
    platform: Platform,
    locator: &L,
    runner: &R,
) -> HashMap<ToolKind, ToolStatus>
where
    R: CommandRunner,
    L: ToolLocator + ?Sized,
{
    let futures: Vec<_> = ToolKind::all()
        .map(|kind| async move { (kind, detect(kind, platform, locator, runner).await) })
        .collect();

    join_all(futures).await.into_iter().collect()
}
