//! Detection implementation submodule.
//!
//! - `ToolLocator` / `PathLocator`: PATH-based executable lookup with
//!   per-platform fallbacks
//! - `parse_version`: regex-based version extraction from CLI output
//! - `parse_version_field`: the `Version:` line of `pip show`

mod parser;
mod path_finder;

pub(crate) use parser::{parse_version, parse_version_field};
pub use path_finder::{PathLocator, ToolLocator};
