//! Progress accounting and the event stream of a run.
//!
//! A run reports to its caller through [`RunEvent`]s: log lines, percentage
//! updates, and exactly one terminal [`RunEvent::Finished`]. The
//! [`ProgressTracker`] turns a fixed budget of steps into percentages.

use super::PreflightError;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every enabled stage ran.
    Completed,
    /// The caller cancelled the run.
    Canceled,
    /// A pre-flight check failed; no stage ran.
    Aborted(PreflightError),
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// One event delivered from a run to its caller, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A line of narration. May contain embedded newlines.
    Log(String),
    /// Overall completion, 0 to 100.
    Progress(u8),
    /// The run is over. Always the last event.
    Finished(Outcome),
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

pub(crate) type EventSender = UnboundedSender<RunEvent>;

/// Step counters for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    pub total_steps: u32,
    pub current_step: u32,
}

impl ProgressState {
    /// `min(floor(current / total * 100), 100)`. An empty budget is complete.
    ///
    /// ```rust
    /// use setgo::ProgressState;
    ///
    /// let state = ProgressState { total_steps: 3, current_step: 2 };
    /// assert_eq!(state.percentage(), 66);
    ///
    /// let overrun = ProgressState { total_steps: 50, current_step: 60 };
    /// assert_eq!(overrun.percentage(), 100);
    /// ```
    pub fn percentage(&self) -> u8 {
        if self.total_steps == 0 {
            return 100;
        }
        let pct = u64::from(self.current_step) * 100 / u64::from(self.total_steps);
        pct.min(100) as u8
    }
}

/// Converts discrete steps into percentage events.
///
/// A percentage is emitted only when it changes, and each unit step is
/// followed by `delay` so the bar moves visibly. A zero delay turns the
/// pacing off.
#[derive(Debug)]
pub struct ProgressTracker {
    state: ProgressState,
    last_emitted: Option<u8>,
    delay: Duration,
    events: EventSender,
}

impl ProgressTracker {
    pub(crate) fn new(total_steps: u32, delay: Duration, events: EventSender) -> Self {
        Self {
            state: ProgressState {
                total_steps,
                current_step: 0,
            },
            last_emitted: None,
            delay,
            events,
        }
    }

    pub fn state(&self) -> ProgressState {
        self.state
    }

    /// Consume `steps` steps, one at a time.
    pub async fn advance(&mut self, steps: u32) {
        for _ in 0..steps {
            self.state.current_step = self.state.current_step.saturating_add(1);
            self.emit(self.state.percentage());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }

    /// Force 100%. Emits only if 100 was not already the last value.
    pub fn finish(&mut self) {
        self.state.current_step = self.state.current_step.max(self.state.total_steps);
        self.emit(100);
    }

    /// Report 0% after cancellation. Always emitted.
    pub fn reset(&mut self) {
        self.last_emitted = Some(0);
        let _ = self.events.send(RunEvent::Progress(0));
    }

    fn emit(&mut self, pct: u8) {
        if self.last_emitted == Some(pct) {
            return;
        }
        self.last_emitted = Some(pct);
        let _ = self.events.send(RunEvent::Progress(pct));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn tracker(total: u32) -> (ProgressTracker, UnboundedReceiver<RunEvent>) {
        let (tx, rx) = unbounded_channel();
        (ProgressTracker::new(total, Duration::ZERO, tx), rx)
    }

    fn progress(rx: &mut UnboundedReceiver<RunEvent>) -> Vec<u8> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let RunEvent::Progress(pct) = event {
                out.push(pct);
            }
        }
        out
    }

    #[test]
    fn test_percentage_formula_and_monotonicity() {
        for total in 1..=150u32 {
            let mut previous = 0;
            for current in 0..=total {
                let pct = ProgressState {
                    total_steps: total,
                    current_step: current,
                }
                .percentage();
                let scaled = current * 100;
                let floor = u32::from(pct);
                assert!(
                    floor * total <= scaled && (floor + 1) * total > scaled,
                    "total={} current={} pct={}",
                    total,
                    current,
                    pct
                );
                assert!(pct >= previous);
                previous = pct;
            }
            assert_eq!(previous, 100);
        }
    }

    #[test]
    fn test_empty_budget_is_complete() {
        let state = ProgressState {
            total_steps: 0,
            current_step: 0,
        };
        assert_eq!(state.percentage(), 100);
    }

    #[tokio::test]
    async fn test_advance_emits_each_change() {
        let (mut tracker, mut rx) = tracker(4);
        tracker.advance(2).await;
        assert_eq!(progress(&mut rx), vec![25, 50]);
        assert_eq!(tracker.state().current_step, 2);
    }

    #[tokio::test]
    async fn test_advance_skips_unchanged_percentages() {
        let (mut tracker, mut rx) = tracker(300);
        tracker.advance(6).await;
        assert_eq!(progress(&mut rx), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_overrun_clamps_at_100() {
        let (mut tracker, mut rx) = tracker(2);
        tracker.advance(5).await;
        assert_eq!(progress(&mut rx), vec![50, 100]);
        assert_eq!(tracker.state().current_step, 5);
    }

    #[tokio::test]
    async fn test_finish_emits_100_once() {
        let (mut tracker, mut rx) = tracker(10);
        tracker.advance(10).await;
        tracker.finish();
        let events = progress(&mut rx);
        assert_eq!(events.iter().filter(|pct| **pct == 100).count(), 1);
        assert_eq!(events.last(), Some(&100));
    }

    #[tokio::test]
    async fn test_finish_catches_up_short_runs() {
        let (mut tracker, mut rx) = tracker(10);
        tracker.advance(3).await;
        tracker.finish();
        assert_eq!(progress(&mut rx), vec![10, 20, 30, 100]);
    }

    #[tokio::test]
    async fn test_reset_always_emits_zero() {
        let (mut tracker, mut rx) = tracker(100);
        tracker.reset();
        tracker.advance(40).await;
        tracker.reset();
        let events = progress(&mut rx);
        assert_eq!(events.first(), Some(&0));
        assert_eq!(events.last(), Some(&0));
    }

    #[test]
    fn test_outcome_and_event_helpers() {
        assert!(Outcome::Completed.is_completed());
        assert!(!Outcome::Canceled.is_completed());
        assert!(RunEvent::Finished(Outcome::Canceled).is_terminal());
        assert!(!RunEvent::Progress(3).is_terminal());
    }
}
