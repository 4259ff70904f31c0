//! PATH-based executable lookup with fallback locations.

use crate::Platform;
use std::path::PathBuf;

/// Resolves a tool name to an executable path.
///
/// Absence is a normal answer: detection stages use it to decide whether
/// anything needs installing.
pub trait ToolLocator: Send + Sync {
    fn locate(&self, name: &str) -> Option<PathBuf>;
}

/// The real locator: `PATH` first, then the platform's fallback paths.
#[derive(Debug, Clone, Copy)]
pub struct PathLocator {
    platform: Platform,
}

impl PathLocator {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

impl ToolLocator for PathLocator {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        find_executable(name, &self.platform.fallback_paths(name))
    }
}

/// Find an executable by name.
///
/// The `which` crate handles `PATH`, `PATHEXT` and symlinks; `fallbacks` are
/// absolute paths probed in order when that fails.
fn find_executable(name: &str, fallbacks: &[PathBuf]) -> Option<PathBuf> {
    if let Ok(path) = which::which(name) {
        return Some(path);
    }

    fallbacks.iter().find(|path| path.is_file()).cloned()
}
