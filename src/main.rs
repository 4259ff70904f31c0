//! setgo CLI entry point.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use setgo::{
    relaunch_command, survey, BootstrapOptions, CommandRunner, ElevationMechanism,
    ElevationSecret, ExecutionContext, InstallationPlan, InstanceLock, Orchestrator, Outcome,
    PathLocator, Platform, PreflightError, RunEvent, SystemRunner, TcpProbe, ToolStatus,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const EXIT_CANCELED: u8 = 130;

#[derive(Debug, Parser)]
#[command(name = "setgo", version, about = "Set up Python, VS Code, common libraries and editor extensions")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Skip the Python library stage
    #[arg(long, env = "SETGO_NO_LIBRARIES")]
    no_libraries: bool,

    /// Skip the VS Code extension stage
    #[arg(long, env = "SETGO_NO_EXTENSIONS")]
    no_extensions: bool,

    /// Read the sudo password from the first line of stdin instead of prompting
    #[arg(long)]
    password_stdin: bool,

    /// Pause after each progress step, in milliseconds
    #[arg(long, env = "SETGO_STEP_DELAY_MS", default_value_t = 50)]
    step_delay_ms: u64,

    /// Kill any package manager call that runs longer than this, in seconds
    #[arg(long, env = "SETGO_COMMAND_TIMEOUT_SECS", default_value_t = 30 * 60)]
    command_timeout_secs: u64,

    /// host:port used to check for a network connection
    #[arg(long, env = "SETGO_PROBE_ADDRESS", default_value = "8.8.8.8:53")]
    probe_address: String,

    /// Single-instance lock file
    #[arg(long, env = "SETGO_LOCK_PATH")]
    lock_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Report whether Python and VS Code are installed, without changing anything
    Check,
}

impl Cli {
    fn options(&self) -> BootstrapOptions {
        let defaults = BootstrapOptions::default();
        BootstrapOptions {
            install_libraries: !self.no_libraries,
            install_extensions: !self.no_extensions,
            step_delay: Duration::from_millis(self.step_delay_ms),
            command_timeout: Duration::from_secs(self.command_timeout_secs),
            probe_address: self.probe_address.clone(),
            lock_path: self.lock_path.clone().unwrap_or(defaults.lock_path),
            ..defaults
        }
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("setgo=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("setgo=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("setgo starting with args: {:?}", cli);

    let result = match cli.command {
        Some(Command::Check) => check(&cli).await,
        None => install(&cli).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn check(cli: &Cli) -> Result<ExitCode> {
    let options = cli.options();
    let platform = Platform::current();
    let runner = SystemRunner::new(options.command_timeout);

    let statuses = survey(platform, &PathLocator::new(platform), &runner).await;
    let mut statuses: Vec<_> = statuses.into_iter().collect();
    statuses.sort_by_key(|(kind, _)| *kind as u8);

    println!("Platform: {}", platform.display_name());
    for (kind, status) in statuses {
        match status {
            ToolStatus::Installed(meta) => println!(
                "{}: installed ({}) at {}",
                kind.display_name(),
                meta.version_label(),
                meta.path.display()
            ),
            ToolStatus::NotInstalled => println!("{}: not installed", kind.display_name()),
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn install(cli: &Cli) -> Result<ExitCode> {
    let options = cli.options();
    let lock = match InstanceLock::acquire(&options.lock_path) {
        Ok(lock) => lock,
        Err(err) => {
            eprintln!("Error: {}\n{}", err, err.fix_suggestion());
            return Ok(ExitCode::FAILURE);
        }
    };

    let platform = Platform::current();
    let secret = match platform.elevation_mechanism() {
        ElevationMechanism::Secret => Some(read_secret(cli.password_stdin)?),
        ElevationMechanism::Relaunch | ElevationMechanism::None => None,
    };

    let orchestrator = Orchestrator::new(
        platform,
        SystemRunner::new(options.command_timeout),
        PathLocator::new(platform),
        TcpProbe::new(options.probe_address.clone(), options.probe_timeout),
        options.clone(),
    );
    let ctx = ExecutionContext::new(secret, &options);
    let mut run = orchestrator.start(InstallationPlan::standard(), ctx);

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}%")
            .context("invalid progress bar template")?
            .progress_chars("=> "),
    );

    let cancel = run.canceller();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut cancel_requested = false;

    let outcome = loop {
        tokio::select! {
            event = run.next_event() => match event {
                Some(RunEvent::Log(line)) => bar.println(line),
                Some(RunEvent::Progress(pct)) => bar.set_position(u64::from(pct)),
                Some(RunEvent::Finished(outcome)) => break Some(outcome),
                None => break None,
            },
            _ = &mut ctrl_c, if !cancel_requested => {
                cancel_requested = true;
                bar.println("Canceling...");
                cancel.cancel();
            }
        }
    };
    bar.finish_and_clear();

    match outcome {
        Some(Outcome::Completed) => Ok(ExitCode::SUCCESS),
        Some(Outcome::Canceled) => Ok(ExitCode::from(EXIT_CANCELED)),
        Some(Outcome::Aborted(PreflightError::RelaunchRequired { .. })) => {
            // The elevated copy takes the lock itself.
            drop(lock);
            relaunch_elevated(&options).await
        }
        Some(Outcome::Aborted(_)) => Ok(ExitCode::FAILURE),
        None => anyhow::bail!("installation task ended without reporting an outcome"),
    }
}

fn read_secret(from_stdin: bool) -> Result<ElevationSecret> {
    if from_stdin {
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read password from stdin")?;
        let secret = line.trim_end_matches(['\r', '\n']);
        return Ok(ElevationSecret::new(secret));
    }

    let secret = Password::new()
        .with_prompt("Password (used for sudo)")
        .allow_empty_password(true)
        .interact()
        .context("failed to read password")?;
    Ok(ElevationSecret::new(secret))
}

async fn relaunch_elevated(options: &BootstrapOptions) -> Result<ExitCode> {
    let exe = std::env::current_exe().context("cannot locate the running executable")?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let argv = relaunch_command(&exe, &args);

    println!("Restarting with administrator rights...");
    let result = SystemRunner::new(options.command_timeout)
        .run(&argv, None, true)
        .await;
    if result.succeeded {
        Ok(ExitCode::SUCCESS)
    } else {
        anyhow::bail!(
            "could not restart with administrator rights: {}",
            result.detail_or("the elevation prompt was declined")
        )
    }
}
