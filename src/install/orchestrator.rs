//! Drives an [`InstallationPlan`] on a background task.
//!
//! [`Orchestrator::start`] returns at once with a [`RunHandle`]. The task
//! runs the pre-flight checks, then every enabled stage in order, and reports
//! through the handle's event stream. The last event of every run is a
//! single [`RunEvent::Finished`].

use super::preflight::{check_connectivity, elevate, NetworkProbe};
use super::progress::EventSender;
use super::stages::{Session, BANNER};
use super::{
    Cancellation, CommandRunner, ExecutionContext, InstallationPlan, Outcome, PreflightError,
    ProgressTracker, RunEvent,
};
use crate::detection::ToolLocator;
use crate::{BootstrapOptions, Platform};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{info, warn};

struct Shared<R, L, P> {
    platform: Platform,
    runner: R,
    locator: L,
    probe: P,
    options: BootstrapOptions,
}

/// Runs installation plans against one platform and set of collaborators.
///
/// # Example
///
/// ```rust,no_run
/// use setgo::{
///     BootstrapOptions, ExecutionContext, InstallationPlan, Orchestrator, PathLocator,
///     Platform, RunEvent, SystemRunner, TcpProbe,
/// };
///
/// #[tokio::main]
/// async fn main() {
///     let options = BootstrapOptions::default();
///     let platform = Platform::current();
///     let orchestrator = Orchestrator::new(
///         platform,
///         SystemRunner::new(options.command_timeout),
///         PathLocator::new(platform),
///         TcpProbe::new(options.probe_address.clone(), options.probe_timeout),
///         options.clone(),
///     );
///
///     let ctx = ExecutionContext::new(None, &options);
///     let mut run = orchestrator.start(InstallationPlan::standard(), ctx);
///     while let Some(event) = run.next_event().await {
///         match event {
///             RunEvent::Log(line) => println!("{}", line),
///             RunEvent::Progress(pct) => println!("{}%", pct),
///             RunEvent::Finished(outcome) => println!("done: {:?}", outcome),
///         }
///     }
/// }
/// ```
pub struct Orchestrator<R, L, P> {
    shared: Arc<Shared<R, L, P>>,
}

impl<R, L, P> Clone for Orchestrator<R, L, P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R, L, P> Orchestrator<R, L, P>
where
    R: CommandRunner,
    L: ToolLocator + 'static,
    P: NetworkProbe,
{
    pub fn new(platform: Platform, runner: R, locator: L, probe: P, options: BootstrapOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                platform,
                runner,
                locator,
                probe,
                options,
            }),
        }
    }

    /// Start a run on the current tokio runtime. Never blocks.
    ///
    /// The optional stages of `plan` are switched by `ctx`. Runs do not
    /// guard against each other; start one at a time.
    pub fn start(&self, plan: InstallationPlan, ctx: ExecutionContext) -> RunHandle {
        let (tx, rx) = unbounded_channel();
        let cancel = ctx.cancellation();
        let shared = Arc::clone(&self.shared);

        let task = tokio::spawn(async move {
            run(&*shared, plan, ctx, tx).await;
        });

        RunHandle {
            events: rx,
            cancel,
            task,
        }
    }
}

/// The caller's side of a run.
///
/// Dropping the handle does not stop the run; call [`cancel`](Self::cancel)
/// first.
#[derive(Debug)]
pub struct RunHandle {
    events: UnboundedReceiver<RunEvent>,
    cancel: Cancellation,
    task: JoinHandle<()>,
}

impl RunHandle {
    /// Request cancellation. Idempotent; a no-op once the run has finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A cancel handle that can be moved to another task or thread.
    pub fn canceller(&self) -> Cancellation {
        self.cancel.clone()
    }

    /// Next event in emission order. `None` once the run is over and every
    /// event has been read.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events.recv().await
    }

    /// Next event if one is already queued, for callers that poll from a
    /// UI tick instead of awaiting.
    pub fn try_next_event(&mut self) -> Option<RunEvent> {
        self.events.try_recv().ok()
    }

    /// Whether the run task has exited. Queued events may still be unread.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Read events up to and including the terminal one.
    pub async fn collect(mut self) -> Vec<RunEvent> {
        let mut out = Vec::new();
        while let Some(event) = self.events.recv().await {
            let terminal = event.is_terminal();
            out.push(event);
            if terminal {
                break;
            }
        }
        out
    }
}

async fn run<R, L, P>(
    shared: &Shared<R, L, P>,
    plan: InstallationPlan,
    ctx: ExecutionContext,
    events: EventSender,
) where
    R: CommandRunner,
    L: ToolLocator,
    P: NetworkProbe,
{
    let plan = plan.with_optional(ctx.install_libraries, ctx.install_extensions);
    let mut tracker = ProgressTracker::new(
        plan.total_weight(),
        shared.options.step_delay,
        events.clone(),
    );
    info!(
        platform = shared.platform.display_name(),
        stages = plan.enabled_stages().count(),
        total_steps = plan.total_weight(),
        "run started"
    );

    // Dropping the losing future kills any command it was waiting on.
    let outcome = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => Outcome::Canceled,
        outcome = execute(shared, &plan, &ctx, &mut tracker, &events) => outcome,
    };

    if outcome == Outcome::Canceled {
        info!("run canceled");
        log(&events, BANNER);
        log(&events, "Installation Canceled!");
        log(&events, BANNER);
        tracker.reset();
    }

    let _ = events.send(RunEvent::Finished(outcome));
}

async fn execute<R, L, P>(
    shared: &Shared<R, L, P>,
    plan: &InstallationPlan,
    ctx: &ExecutionContext,
    tracker: &mut ProgressTracker,
    events: &EventSender,
) -> Outcome
where
    R: CommandRunner,
    L: ToolLocator,
    P: NetworkProbe,
{
    log(events, BANNER);
    log(events, "Starting installation...");
    log(events, BANNER);

    log(events, "Checking network connection...");
    if let Err(err) = check_connectivity(&shared.probe).await {
        return abort(events, err);
    }

    log(events, "Checking privileges...");
    let elevation = match elevate(shared.platform, &shared.runner, ctx.secret.clone()).await {
        Ok(elevation) => elevation,
        Err(err) => return abort(events, err),
    };

    let mut session = Session {
        platform: shared.platform,
        runner: &shared.runner,
        locator: &shared.locator,
        secret: elevation.secret(),
        cancel: &ctx.cancel,
        tracker,
        events,
    };

    for stage in plan.enabled_stages() {
        if ctx.cancel.is_cancelled() {
            return Outcome::Canceled;
        }
        session.run_stage(stage).await;
    }
    if ctx.cancel.is_cancelled() {
        return Outcome::Canceled;
    }

    log(events, BANNER);
    log(
        events,
        "Installation completed! You can now safely close this program.",
    );
    log(events, BANNER);
    session.tracker.finish();
    info!("run completed");
    Outcome::Completed
}

fn abort(events: &EventSender, err: PreflightError) -> Outcome {
    warn!(error = %err, "pre-flight check failed");
    log(events, format!("Error: {}", err));
    log(events, err.fix_suggestion());
    Outcome::Aborted(err)
}

fn log(events: &EventSender, line: impl Into<String>) {
    let _ = events.send(RunEvent::Log(line.into()));
}
