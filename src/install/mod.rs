//! Installation: running package managers, elevation, progress and the
//! orchestrated run.
//!
//! The entry point is [`Orchestrator::start`], which executes an
//! [`InstallationPlan`] on a background task and hands back a [`RunHandle`]
//! for events and cancellation.
//!
//! # Example
//!
//! ```rust,no_run
//! use setgo::{
//!     BootstrapOptions, ElevationSecret, ExecutionContext, InstallationPlan, Orchestrator,
//!     Outcome, PathLocator, Platform, RunEvent, SystemRunner, TcpProbe,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = BootstrapOptions {
//!         install_extensions: false,
//!         ..Default::default()
//!     };
//!     let platform = Platform::current();
//!     let orchestrator = Orchestrator::new(
//!         platform,
//!         SystemRunner::new(options.command_timeout),
//!         PathLocator::new(platform),
//!         TcpProbe::new(options.probe_address.clone(), options.probe_timeout),
//!         options.clone(),
//!     );
//!
//!     let ctx = ExecutionContext::new(Some(ElevationSecret::new("sudo password")), &options);
//!     let events = orchestrator.start(InstallationPlan::standard(), ctx).collect().await;
//!
//!     match events.last() {
//!         Some(RunEvent::Finished(Outcome::Aborted(err))) => {
//!             println!("Aborted: {}. Fix: {}", err, err.fix_suggestion());
//!         }
//!         Some(RunEvent::Finished(outcome)) => println!("{:?}", outcome),
//!         _ => {}
//!     }
//! }
//! ```

mod context;
mod errors;
mod orchestrator;
mod plan;
mod preflight;
mod progress;
mod runner;
mod stages;
mod types;

pub use context::{Cancellation, ExecutionContext};
pub use errors::PreflightError;
pub use orchestrator::{Orchestrator, RunHandle};
pub use plan::{
    distribute, InstallationPlan, Stage, StageAction, StageKind, EDITOR_EXTENSIONS,
    EDITOR_WEIGHT, EXTENSIONS_WEIGHT, LIBRARIES_WEIGHT, PYTHON_LIBRARIES, RUNTIME_WEIGHT,
};
pub use preflight::{check_connectivity, elevate, relaunch_command, Elevation, NetworkProbe, TcpProbe};
pub use progress::{Outcome, ProgressState, ProgressTracker, RunEvent};
pub use runner::{CommandResult, CommandRunner, SystemRunner};
pub use types::{ElevationSecret, InstallCommand, InstallLocation};
