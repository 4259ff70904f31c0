//! Stage bodies: detect-and-install for a tool, and the two item sets.
//!
//! No stage fails a run. A failed package manager call is logged and the
//! stage moves on; only pre-flight checks can abort.

use super::plan::{distribute, Stage, StageAction};
use super::progress::EventSender;
use super::{Cancellation, CommandRunner, ElevationSecret, ProgressTracker, RunEvent};
use crate::detection::{parse_version_field, ToolLocator};
use crate::platform::InstallRoute;
use crate::{detect, Platform, ToolKind, ToolStatus};
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

/// Ticks of a detection stage's weight consumed while its install runs.
pub(crate) const INSTALL_TICKS: u32 = 5;

pub(crate) const BANNER: &str = "--------------------";

/// Per-item results of a set stage.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct SetSummary {
    pub installed: Vec<String>,
    pub already_installed: Vec<String>,
    pub failed: Vec<String>,
}

impl fmt::Display for SetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Installed: {}", join_or_none(&self.installed))?;
        writeln!(f, "Already installed: {}", join_or_none(&self.already_installed))?;
        write!(f, "Failed: {}", join_or_none(&self.failed))
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// Borrowed view of everything a stage needs while it runs.
pub(crate) struct Session<'a, R, L: ?Sized> {
    pub platform: Platform,
    pub runner: &'a R,
    pub locator: &'a L,
    pub secret: Option<&'a ElevationSecret>,
    pub cancel: &'a Cancellation,
    pub tracker: &'a mut ProgressTracker,
    pub events: &'a EventSender,
}

impl<R, L> Session<'_, R, L>
where
    R: CommandRunner,
    L: ToolLocator + ?Sized,
{
    /// Run one stage, then advance the tracker to the stage's ceiling.
    pub async fn run_stage(&mut self, stage: &Stage) {
        info!(stage = stage.name, weight = stage.weight, "stage started");

        let consumed = match &stage.action {
            StageAction::DetectAndInstallRuntime => {
                self.detect_and_install(ToolKind::Runtime, stage.weight).await
            }
            StageAction::DetectAndInstallEditor => {
                self.detect_and_install(ToolKind::Editor, stage.weight).await
            }
            StageAction::InstallLibrarySet(items) => self.install_libraries(items, stage.weight).await,
            StageAction::InstallExtensionSet(items) => {
                self.install_extensions(items, stage.weight).await
            }
        };

        if self.cancel.is_cancelled() {
            return;
        }
        self.tracker.advance(stage.weight.saturating_sub(consumed)).await;
        info!(stage = stage.name, "stage finished");
    }

    fn log(&self, line: impl Into<String>) {
        let _ = self.events.send(RunEvent::Log(line.into()));
    }

    /// Detect `kind`; install it through the platform's package manager when
    /// absent. Returns the ticks already consumed.
    async fn detect_and_install(&mut self, kind: ToolKind, weight: u32) -> u32 {
        let name = kind.display_name();
        self.log(format!("Checking {} installation...", name));

        let status = detect(kind, self.platform, self.locator, self.runner).await;
        if let ToolStatus::Installed(meta) = &status {
            info!(tool = name, path = %meta.path.display(), "already installed");
            self.log(format!(
                "{} is already installed.\nInstalled version: {}",
                name,
                meta.version_label()
            ));
            return 0;
        }

        let command = match self.platform.install_route(kind, self.locator) {
            InstallRoute::Command(command) => command,
            InstallRoute::ManagerMissing { manager } => {
                warn!(tool = name, manager, "package manager not found");
                self.log(format!(
                    "Error: {} was not found, so {} cannot be installed automatically.",
                    manager, name
                ));
                return 0;
            }
            InstallRoute::Unsupported => {
                self.log(format!(
                    "Error: Unsupported OS for automated {} installation.",
                    name
                ));
                return 0;
            }
        };

        self.log(format!("Installing {}...", name));
        info!(command = %command.raw_command(), elevated = command.needs_elevation(), "{}", command.description);

        let secret = if command.needs_elevation() {
            self.secret
        } else {
            None
        };
        let result = self.runner.run(&command.argv, secret, true).await;

        if result.succeeded {
            self.log(format!("{} installed successfully.", name));
        } else {
            self.log(format!(
                "Failed to install {}: {}",
                name,
                result.detail_or("the package manager reported an error")
            ));
        }

        let ticks = INSTALL_TICKS.min(weight);
        self.tracker.advance(ticks).await;
        ticks
    }

    async fn install_libraries(&mut self, items: &[String], weight: u32) -> u32 {
        self.log(BANNER);
        self.log("Installing Python libraries...");
        self.log(BANNER);

        if self.platform == Platform::Unsupported {
            self.log("Error: Unsupported OS for automated Python libraries installation.");
            return 0;
        }
        let Some(python) = self
            .locator
            .locate(ToolKind::Runtime.executable_name(self.platform))
        else {
            self.log("Error: Python was not found, skipping Python libraries.");
            return 0;
        };
        let python = python.to_string_lossy().into_owned();
        let pip = |args: &[&str]| -> Vec<String> {
            [python.as_str(), "-m", "pip"]
                .iter()
                .chain(args)
                .map(|arg| arg.to_string())
                .collect()
        };

        let upgrade = self
            .runner
            .run(&pip(&["install", "--upgrade", "pip"]), None, true)
            .await;
        if !upgrade.succeeded {
            self.log(format!(
                "Warning: could not upgrade pip: {}",
                upgrade.detail_or("unknown error")
            ));
        }

        let mut summary = SetSummary::default();
        let mut versions: Vec<(String, String)> = Vec::new();
        let mut consumed = 0;

        for (item, share) in items.iter().zip(distribute(weight, items.len())) {
            if self.cancel.is_cancelled() {
                return consumed;
            }

            let shown = self.runner.run(&pip(&["show", item.as_str()]), None, true).await;
            if shown.succeeded {
                summary.already_installed.push(item.clone());
                if let Some(version) = shown.stdout.as_deref().and_then(parse_version_field) {
                    versions.push((item.clone(), version));
                }
            } else {
                let installed = self.runner.run(&pip(&["install", item.as_str()]), None, true).await;
                if installed.succeeded {
                    summary.installed.push(item.clone());
                    let shown = self.runner.run(&pip(&["show", item.as_str()]), None, true).await;
                    if let Some(version) = shown.stdout.as_deref().and_then(parse_version_field) {
                        versions.push((item.clone(), version));
                    }
                } else {
                    warn!(library = %item, "pip install failed");
                    self.log(format!(
                        "Failed to install {}: {}",
                        item,
                        installed.detail_or("pip reported an error")
                    ));
                    summary.failed.push(item.clone());
                }
            }

            self.tracker.advance(share).await;
            consumed += share;
        }

        let versions = if versions.is_empty() {
            "None".to_string()
        } else {
            versions
                .iter()
                .map(|(name, version)| format!("{}: {}", name, version))
                .collect::<Vec<_>>()
                .join("\n")
        };
        self.log(format!(
            "Python libraries installation completed.\n{}\nInstalled versions:\n{}",
            summary, versions
        ));
        consumed
    }

    async fn install_extensions(&mut self, items: &[String], weight: u32) -> u32 {
        self.log(BANNER);
        self.log("Installing VS Code extensions...");
        self.log(BANNER);

        if self.platform == Platform::Unsupported {
            self.log("Error: Unsupported OS for automated VS Code extensions installation.");
            return 0;
        }
        let Some(code) = self
            .locator
            .locate(ToolKind::Editor.executable_name(self.platform))
        else {
            self.log("Error: VS Code was not found, skipping VS Code extensions.");
            return 0;
        };
        let code = code.to_string_lossy().into_owned();

        let listed = self
            .runner
            .run(&[code.clone(), "--list-extensions".to_string()], None, true)
            .await;
        // Marketplace identifiers are case-insensitive.
        let present: HashSet<String> = listed
            .stdout
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(|line| line.trim().to_ascii_lowercase())
            .filter(|line| !line.is_empty())
            .collect();

        let mut summary = SetSummary::default();
        let mut consumed = 0;

        for (item, share) in items.iter().zip(distribute(weight, items.len())) {
            if self.cancel.is_cancelled() {
                return consumed;
            }

            if present.contains(&item.to_ascii_lowercase()) {
                summary.already_installed.push(item.clone());
            } else {
                let argv = [
                    code.clone(),
                    "--install-extension".to_string(),
                    item.clone(),
                    "--force".to_string(),
                ];
                let result = self.runner.run(&argv, None, true).await;
                if result.succeeded {
                    summary.installed.push(item.clone());
                } else {
                    warn!(extension = %item, "extension install failed");
                    self.log(format!(
                        "Failed to install {}: {}",
                        item,
                        result.detail_or("the editor reported an error")
                    ));
                    summary.failed.push(item.clone());
                }
            }

            self.tracker.advance(share).await;
            consumed += share;
        }

        self.log(format!("VS Code extensions installation completed.\n{}", summary));
        consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lists_every_bucket() {
        let summary = SetSummary {
            installed: vec!["a".into(), "b".into()],
            already_installed: vec![],
            failed: vec!["c".into()],
        };
        assert_eq!(
            summary.to_string(),
            "Installed: a, b\nAlready installed: None\nFailed: c"
        );
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(
            SetSummary::default().to_string(),
            "Installed: None\nAlready installed: None\nFailed: None"
        );
    }
}
