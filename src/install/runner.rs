//! External command execution.
//!
//! [`CommandRunner`] is the only way the installer touches a child process.
//! Failures never propagate as errors: a command that cannot start, exits
//! non-zero or times out is reported as a [`CommandResult`] with
//! `succeeded: false`, and the caller decides what that means.

use super::ElevationSecret;
use std::future::Future;
use std::io;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Outcome of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// Captured stdout with trailing whitespace trimmed. `None` when output
    /// was not captured.
    pub stdout: Option<String>,

    /// Whether the command ran and exited with status 0.
    pub succeeded: bool,

    /// Trimmed stderr, or the reason the command could not run. `None` for
    /// a failed command whose output was not captured.
    pub error_detail: Option<String>,
}

impl CommandResult {
    pub fn success(stdout: Option<String>) -> Self {
        Self {
            stdout,
            succeeded: true,
            error_detail: None,
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            stdout: None,
            succeeded: false,
            error_detail: Some(detail.into()),
        }
    }

    pub(crate) fn from_output(output: Output, captured: bool) -> Self {
        let stdout = captured
            .then(|| String::from_utf8_lossy(&output.stdout).trim_end().to_string());

        if output.status.success() {
            return Self::success(stdout);
        }

        let error_detail = captured
            .then(|| String::from_utf8_lossy(&output.stderr).trim().to_string())
            .filter(|detail| !detail.is_empty());

        Self {
            stdout,
            succeeded: false,
            error_detail,
        }
    }

    /// `error_detail`, or `fallback` when there is none.
    pub fn detail_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.error_detail.as_deref().unwrap_or(fallback)
    }
}

/// Runs external commands.
///
/// `secret` is `Some` only for commands that need elevation on a platform
/// with secret-based elevation; implementations must deliver it on stdin,
/// never in `argv`. When `capture` is false, output is discarded.
pub trait CommandRunner: Send + Sync + 'static {
    fn run(
        &self,
        argv: &[String],
        secret: Option<&ElevationSecret>,
        capture: bool,
    ) -> impl Future<Output = CommandResult> + Send;
}

/// The real runner, backed by `tokio::process`.
///
/// Every command is bounded by a timeout. Dropping the future (on timeout or
/// cancellation) terminates the child together with everything it spawned.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        argv: &[String],
        secret: Option<&ElevationSecret>,
        capture: bool,
    ) -> CommandResult {
        let Some((program, args)) = argv.split_first() else {
            return CommandResult::failure("empty command");
        };

        let mut command = build_command(program, args, secret.is_some(), capture);
        debug!(command = %argv.join(" "), elevated = secret.is_some(), "spawning");

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!(program = %program, error = %err, "command failed to start");
                return CommandResult::failure(format!("failed to start {}: {}", program, err));
            }
        };
        let mut group = ProcessGroup::new(child.id());

        if let Some(secret) = secret {
            if let Err(err) = feed_secret(&mut child, secret).await {
                debug!(error = %err, "could not write to sudo stdin");
            }
        }

        match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                group.release();
                let result = CommandResult::from_output(output, capture);
                if !result.succeeded {
                    warn!(program = %program, "command exited with failure");
                }
                result
            }
            Ok(Err(err)) => {
                group.release();
                CommandResult::failure(err.to_string())
            }
            Err(_) => {
                warn!(program = %program, timeout = ?self.timeout, "command timed out");
                CommandResult::failure(format!("timed out after {:?}", self.timeout))
            }
        }
    }
}

/// Build the command for `program args`.
///
/// Elevated commands go through `sudo -S -k -p "" --`: the password is read
/// from stdin (piped here, written by [`feed_secret`]) and never appears in
/// the argument list. On unix the child leads its own process group so the
/// whole tree can be signalled; elsewhere it is killed on drop.
fn build_command(program: &str, args: &[String], elevated: bool, capture: bool) -> Command {
    let mut command = if elevated {
        let mut command = Command::new("sudo");
        command.args(["-S", "-k", "-p", "", "--"]).arg(program);
        command
    } else {
        Command::new(program)
    };

    command
        .args(args)
        .kill_on_drop(cfg!(not(unix)))
        .stdin(if elevated { Stdio::piped() } else { Stdio::null() })
        .stdout(output_stream(capture))
        .stderr(output_stream(capture));
    #[cfg(unix)]
    command.process_group(0);
    hide_console_window(&mut command);
    command
}

/// Write the secret and a newline to the child's stdin, then close it.
async fn feed_secret(child: &mut Child, secret: &ElevationSecret) -> io::Result<()> {
    let Some(mut stdin) = child.stdin.take() else {
        return Ok(());
    };
    stdin.write_all(secret.expose().as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.shutdown().await
}

/// Time between SIGTERM and SIGKILL when a process group is torn down.
#[cfg(unix)]
const KILL_GRACE: Duration = Duration::from_secs(2);

/// Tears down a child's process group when dropped, unless the child was
/// reaped first.
///
/// Dropping the run future (timeout or cancellation) lands here. Children of
/// `sudo` run as root and only `sudo` may signal them, so the group gets
/// SIGTERM, which `sudo` relays, and SIGKILL after [`KILL_GRACE`].
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn release(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            terminate_process_group(pgid);
        }
    }
}

#[cfg(unix)]
fn terminate_process_group(pgid: u32) {
    let Ok(pgid) = i32::try_from(pgid) else {
        return;
    };
    if pgid <= 0 {
        return;
    }
    debug!(pgid, "terminating process group");
    unsafe {
        libc::kill(-pgid, libc::SIGTERM);
    }
    std::thread::spawn(move || {
        std::thread::sleep(KILL_GRACE);
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    });
}

#[cfg(not(unix))]
fn terminate_process_group(_pgid: u32) {}

fn output_stream(capture: bool) -> Stdio {
    if capture {
        Stdio::piped()
    } else {
        Stdio::null()
    }
}

#[cfg(windows)]
fn hide_console_window(command: &mut Command) {
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_console_window(_command: &mut Command) {}
