//! Pre-flight checks run before any stage modifies the system.
//!
//! Two checks, in order: a connectivity probe ([`NetworkProbe`]) and the
//! privilege check ([`elevate`]). Either failing aborts the run.

use super::{CommandRunner, ElevationSecret, PreflightError};
use crate::platform::{ElevationMechanism, Platform};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Answers whether the network is reachable.
pub trait NetworkProbe: Send + Sync + 'static {
    fn is_reachable(&self) -> impl Future<Output = bool> + Send;

    /// Address shown to the user when the probe fails.
    fn address(&self) -> &str;
}

/// Probes connectivity with a short-timeout TCP connect.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }
}

impl NetworkProbe for TcpProbe {
    async fn is_reachable(&self) -> bool {
        match timeout(self.timeout, TcpStream::connect(self.address.as_str())).await {
            Ok(Ok(_)) => true,
            Ok(Err(err)) => {
                debug!(address = %self.address, error = %err, "connectivity probe failed");
                false
            }
            Err(_) => {
                debug!(address = %self.address, "connectivity probe timed out");
                false
            }
        }
    }

    fn address(&self) -> &str {
        &self.address
    }
}

/// Run the connectivity probe.
pub async fn check_connectivity<P: NetworkProbe>(probe: &P) -> Result<(), PreflightError> {
    if probe.is_reachable().await {
        Ok(())
    } else {
        Err(PreflightError::Offline {
            address: probe.address().to_string(),
            fix: "Check your internet connection and try again".to_string(),
        })
    }
}

/// Privileges obtained by [`elevate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elevation {
    /// Nothing will be installed on this platform.
    NotRequired,
    /// The process itself already runs with administrator rights.
    AlreadyElevated,
    /// A validated `sudo` password, threaded into every privileged command.
    Secret(ElevationSecret),
}

impl Elevation {
    /// The secret to hand to privileged commands, if any.
    pub fn secret(&self) -> Option<&ElevationSecret> {
        match self {
            Self::Secret(secret) => Some(secret),
            Self::NotRequired | Self::AlreadyElevated => None,
        }
    }
}

/// Verify that privileged commands will be able to run.
///
/// - Relaunch platforms: `net session` succeeds only in an elevated process;
///   otherwise [`PreflightError::RelaunchRequired`] tells the caller to
///   restart through the elevation prompt.
/// - Secret platforms: the secret must be present and accepted by
///   `sudo` running `true`, which has no side effects.
pub async fn elevate<R: CommandRunner>(
    platform: Platform,
    runner: &R,
    secret: Option<ElevationSecret>,
) -> Result<Elevation, PreflightError> {
    match platform.elevation_mechanism() {
        ElevationMechanism::None => Ok(Elevation::NotRequired),
        ElevationMechanism::Relaunch => {
            let probe = runner.run(&argv(&["net", "session"]), None, true).await;
            if probe.succeeded {
                Ok(Elevation::AlreadyElevated)
            } else {
                Err(PreflightError::RelaunchRequired {
                    fix: "Accept the administrator prompt to continue".to_string(),
                })
            }
        }
        ElevationMechanism::Secret => {
            let secret = secret.filter(|secret| !secret.is_empty()).ok_or_else(|| {
                PreflightError::ElevationDenied {
                    message: "no system password was provided".to_string(),
                    fix: "Enter the password you use for sudo".to_string(),
                }
            })?;

            let probe = runner.run(&argv(&["true"]), Some(&secret), true).await;
            if probe.succeeded {
                Ok(Elevation::Secret(secret))
            } else {
                Err(PreflightError::ElevationDenied {
                    message: probe.detail_or("sudo rejected the password").to_string(),
                    fix: "Check the password and make sure your account may use sudo"
                        .to_string(),
                })
            }
        }
    }
}

/// Command that restarts `exe` through the Windows elevation prompt.
///
/// ```rust
/// use setgo::relaunch_command;
/// use std::path::Path;
///
/// let argv = relaunch_command(Path::new(r"C:\Tools\setgo.exe"), &["--no-extensions".to_string()]);
/// assert_eq!(argv[0], "powershell");
/// assert!(argv.last().unwrap().contains("-Verb RunAs"));
/// ```
pub fn relaunch_command(exe: &Path, args: &[String]) -> Vec<String> {
    let mut script = format!(
        "Start-Process -FilePath {}",
        ps_quote(&exe.to_string_lossy())
    );
    if !args.is_empty() {
        let quoted: Vec<String> = args.iter().map(|arg| ps_quote(arg)).collect();
        script.push_str(" -ArgumentList ");
        script.push_str(&quoted.join(","));
    }
    script.push_str(" -Verb RunAs");

    argv(&["powershell", "-NoProfile", "-NonInteractive", "-Command", script.as_str()])
}

fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}
