// src/engine/opts.rs

use std::fmt;
use std::sync::Arc;

use tracing::Dispatch;

use crate::dag::Stats;
use crate::engine::cancel::CancelToken;

/// Callback receiving a snapshot of the run after every state change.
///
/// It runs on the coordinator, so a slow reporter delays task launches.
pub type ProgressReporter = Arc<dyn Fn(Stats) + Send + Sync>;

/// Options for a single [`Flow::run`](crate::dag::Flow::run).
///
/// Everything is optional:
/// - `logger`: where the run's `tracing` events go. Defaults to discarding
///   them.
/// - `progress_reporter`: no reporting by default.
/// - `cancel`: a token that is never triggered by default.
#[derive(Clone, Default)]
pub struct Opts {
    pub logger: Option<Dispatch>,
    pub progress_reporter: Option<ProgressReporter>,
    pub cancel: Option<CancelToken>,
}

impl Opts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logger(mut self, logger: Dispatch) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Send the run's events to whatever subscriber is the default at the
    /// time of this call.
    pub fn with_current_logger(self) -> Self {
        let current = tracing::dispatcher::get_default(|d| d.clone());
        self.with_logger(current)
    }

    pub fn with_progress_reporter<F>(mut self, reporter: F) -> Self
    where
        F: Fn(Stats) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(reporter));
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl fmt::Debug for Opts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opts")
            .field("logger", &self.logger.is_some())
            .field("progress_reporter", &self.progress_reporter.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}
