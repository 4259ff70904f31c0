//! Tool kind enum identifying the programs the bootstrapper manages.

use crate::Platform;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// A tool that is detected and, if missing, installed by a detection stage.
///
/// # Example
///
/// ```rust
/// use setgo::{Platform, ToolKind};
///
/// for kind in ToolKind::all() {
///     println!("{}: {}", kind.display_name(), kind.executable_name(Platform::Linux));
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
pub enum ToolKind {
    /// The Python runtime.
    Runtime,
    /// The Visual Studio Code editor.
    Editor,
}

impl ToolKind {
    /// The executable name to search for on this platform.
    ///
    /// ```rust
    /// use setgo::{Platform, ToolKind};
    ///
    /// assert_eq!(ToolKind::Runtime.executable_name(Platform::MacOs), "python3");
    /// assert_eq!(ToolKind::Runtime.executable_name(Platform::Windows), "python");
    /// assert_eq!(ToolKind::Editor.executable_name(Platform::Linux), "code");
    /// ```
    pub fn executable_name(&self, platform: Platform) -> &'static str {
        match (self, platform) {
            (Self::Runtime, Platform::Windows) => "python",
            (Self::Runtime, _) => "python3",
            (Self::Editor, _) => "code",
        }
    }

    /// Human-readable name used in log lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Runtime => "Python",
            Self::Editor => "VS Code",
        }
    }

    /// Iterator over all tool kinds, in installation order.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }
}
