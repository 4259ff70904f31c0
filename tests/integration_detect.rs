//! Integration tests for tool detection.
//!
//! These tests check detection against the real system. They are designed
//! to pass regardless of whether Python or VS Code are installed.

use setgo::{detect, survey, PathLocator, Platform, SystemRunner, ToolKind, ToolLocator, ToolStatus};
use std::time::Duration;

fn runner() -> SystemRunner {
    SystemRunner::new(Duration::from_secs(30))
}

#[tokio::test]
async fn test_survey_returns_valid_statuses() {
    let platform = Platform::current();
    let results = survey(platform, &PathLocator::new(platform), &runner()).await;

    // Should have results for both tools
    assert_eq!(results.len(), 2);

    for (kind, status) in &results {
        match status {
            ToolStatus::Installed(meta) => {
                assert!(
                    meta.path.exists(),
                    "{} path should exist: {:?}",
                    kind.display_name(),
                    meta.path
                );
                println!(
                    "{}: {} at {:?}",
                    kind.display_name(),
                    meta.version_label(),
                    meta.path
                );
            }
            ToolStatus::NotInstalled => {
                println!("{}: not installed", kind.display_name());
            }
        }
    }
}

#[tokio::test]
async fn test_detect_matches_locator() {
    let platform = Platform::current();
    let locator = PathLocator::new(platform);

    for kind in ToolKind::all() {
        let status = detect(kind, platform, &locator, &runner()).await;
        let located = locator.locate(kind.executable_name(platform));
        assert_eq!(status.is_installed(), located.is_some());
        assert_eq!(status.path(), located.as_deref());
    }
}

#[test]
fn test_locator_misses_unknown_tool() {
    let locator = PathLocator::new(Platform::current());
    assert!(locator.locate("definitely_not_a_real_tool_12345").is_none());
}

#[cfg(unix)]
#[test]
fn test_locator_finds_shell() {
    let locator = PathLocator::new(Platform::current());
    let path = locator.locate("sh").expect("sh should be on PATH");
    assert!(path.is_file());
}
