//! Per-run state handed to the orchestrator.

use super::ElevationSecret;
use crate::BootstrapOptions;
use std::sync::Arc;
use tokio::sync::watch;

/// A one-way cancel flag shared between the caller and a run.
///
/// Clones observe the same flag. Cancelling is idempotent and safe from any
/// thread.
#[derive(Debug, Clone)]
pub struct Cancellation {
    flag: Arc<watch::Sender<bool>>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.flag.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything one run needs from its caller. Not shared across runs.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub(crate) secret: Option<ElevationSecret>,
    pub(crate) install_libraries: bool,
    pub(crate) install_extensions: bool,
    pub(crate) cancel: Cancellation,
}

impl ExecutionContext {
    /// Build a context from the configured optional-stage switches.
    ///
    /// `secret` may be `None` on platforms that elevate by relaunching.
    pub fn new(secret: Option<ElevationSecret>, options: &BootstrapOptions) -> Self {
        Self {
            secret,
            install_libraries: options.install_libraries,
            install_extensions: options.install_extensions,
            cancel: Cancellation::new(),
        }
    }

    pub fn with_libraries(mut self, enabled: bool) -> Self {
        self.install_libraries = enabled;
        self
    }

    pub fn with_extensions(mut self, enabled: bool) -> Self {
        self.install_extensions = enabled;
        self
    }

    /// Handle that cancels the run this context is used for.
    pub fn cancellation(&self) -> Cancellation {
        self.cancel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancel_is_shared_and_idempotent() {
        let cancel = Cancellation::new();
        let other = cancel.clone();
        assert!(!other.is_cancelled());
        cancel.cancel();
        cancel.cancel();
        assert!(other.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_cancel() {
        let cancel = Cancellation::new();
        let waiter = cancel.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("cancelled() should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_resolves_when_already_cancelled() {
        let cancel = Cancellation::new();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), cancel.cancelled())
            .await
            .expect("cancelled() should resolve immediately");
    }

    #[test]
    fn test_context_from_options() {
        let options = BootstrapOptions {
            install_libraries: false,
            ..Default::default()
        };
        let ctx = ExecutionContext::new(Some(ElevationSecret::new("pw")), &options);
        assert!(!ctx.install_libraries);
        assert!(ctx.install_extensions);
        assert!(format!("{:?}", ctx).contains("<redacted>"));

        let ctx = ctx.with_libraries(true).with_extensions(false);
        assert!(ctx.install_libraries);
        assert!(!ctx.install_extensions);
    }
}
