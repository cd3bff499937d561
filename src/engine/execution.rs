// src/engine/execution.rs

//! The coordinator that drives one run of a [`Flow`].
//!
//! Every task invocation runs in its own Tokio task and reports back over a
//! single mpsc channel. The coordinator is the only place that touches
//! [`Stats`] and the trigger counters, so neither needs a lock.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use anyhow::anyhow;
use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::instrument::WithSubscriber;
use tracing::{Dispatch, Instrument, debug, error, info, info_span, warn};

use crate::dag::{Flow, Stats, TaskId};
use crate::engine::cancel::{CancelCause, CancelToken};
use crate::engine::opts::{Opts, ProgressReporter};
use crate::engine::outcome::{FlowError, TaskError};

/// What a worker reports when its task function returns.
#[derive(Debug)]
struct NodeResult {
    task: TaskId,
    outcome: Result<(), TaskError>,
}

impl Flow {
    /// Run the flow to completion and return its outcome.
    ///
    /// Independent tasks run concurrently; a task starts once all of its
    /// predecessors succeeded. A failure only holds back the failed task's
    /// descendants. Once the cancel token is observed no further tasks are
    /// started, but tasks already running are awaited.
    ///
    /// Must be called within a Tokio runtime. Each call keeps its own state,
    /// so the same flow may be run concurrently.
    pub async fn run(&self, opts: Opts) -> Result<(), FlowError> {
        let logger = opts.logger.unwrap_or_else(Dispatch::none);
        let cancel = opts.cancel.unwrap_or_default();
        // The span must belong to the run's subscriber, not the caller's.
        let span = tracing::dispatcher::with_default(&logger, || {
            info_span!("flow", flow = %self.name())
        });

        Execution::new(self, opts.progress_reporter)
            .run(cancel)
            .instrument(span)
            .with_subscriber(logger)
            .await
    }
}

struct Execution<'a> {
    flow: &'a Flow,

    stats: Stats,
    task_errors: Vec<TaskError>,

    progress_reporter: Option<ProgressReporter>,

    done_tx: mpsc::Sender<NodeResult>,
    done_rx: mpsc::Receiver<NodeResult>,
    trigger_counts: HashMap<TaskId, usize>,
}

impl<'a> Execution<'a> {
    fn new(flow: &'a Flow, progress_reporter: Option<ProgressReporter>) -> Self {
        // Each task reports exactly once per run, so sends never wait.
        let (done_tx, done_rx) = mpsc::channel(flow.len().max(1));

        Self {
            flow,
            stats: Stats::initial(flow.task_ids()),
            task_errors: Vec::new(),
            progress_reporter,
            done_tx,
            done_rx,
            trigger_counts: HashMap::new(),
        }
    }

    async fn run(mut self, cancel: CancelToken) -> Result<(), FlowError> {
        info!(tasks = self.flow.len(), "starting flow");
        self.report_progress();

        let mut cancel_cause: Option<CancelCause> = None;

        for id in self.flow.root_ids() {
            match cancel.err() {
                Ok(()) => {
                    self.run_node(&cancel, id);
                    self.report_progress();
                }
                Err(cause) => {
                    cancel_cause = Some(cause);
                    break;
                }
            }
        }

        while !self.stats.running.is_empty() {
            let Some(result) = self.done_rx.recv().await else {
                // Unreachable while `self` holds a sender.
                warn!("result channel closed with tasks still running");
                break;
            };

            let observed = cancel.err();
            if let Err(cause) = &observed {
                if cancel_cause.is_none() {
                    info!(%cause, "cancellation observed; no further tasks will be started");
                }
                cancel_cause.get_or_insert_with(|| cause.clone());
            }

            match result.outcome {
                Err(err) => {
                    self.stats.mark_failed(&result.task);
                    self.task_errors.push(err);
                    self.report_progress();
                }
                Ok(()) => {
                    self.stats.mark_succeeded(&result.task);
                    self.report_progress();
                    if observed.is_ok() {
                        self.process_triggers(&cancel, &result.task);
                    }
                }
            }
        }

        info!(
            succeeded = self.stats.succeeded.len(),
            failed = self.stats.failed.len(),
            pending = self.stats.pending.len(),
            "finished flow"
        );
        self.result(cancel_cause)
    }

    /// Move a task to running and start its function on a new Tokio task.
    fn run_node(&mut self, cancel: &CancelToken, id: TaskId) {
        let flow = self.flow;
        let Some(node) = flow.node(id.as_str()) else {
            warn!(task = %id, "task missing from flow; not starting it");
            return;
        };

        self.stats.mark_running(&id);

        let func = node.func().clone();
        let token = cancel.clone();
        let done_tx = self.done_tx.clone();
        let span = info_span!("task", task = %id);

        tokio::spawn(
            async move {
                let start = Instant::now();
                debug!("task started");

                // Call inside the future so a panic while building it is caught too.
                let res = AssertUnwindSafe(async move { func.call(token).await })
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| Err(anyhow!("task panicked: {}", panic_message(&*panic))));

                debug!(elapsed = ?start.elapsed(), "task finished");

                let outcome = match res {
                    Ok(()) => {
                        info!("task succeeded");
                        Ok(())
                    }
                    Err(err) => {
                        error!(error = %format!("{err:#}"), "task failed");
                        Err(TaskError::new(id.clone(), err))
                    }
                };

                if done_tx.send(NodeResult { task: id, outcome }).await.is_err() {
                    warn!("coordinator gone; dropping task result");
                }
            }
            .instrument(span)
            .with_current_subscriber(),
        );
    }

    /// Count one more succeeded predecessor for every target of `id` and start
    /// the targets whose predecessors have now all succeeded.
    fn process_triggers(&mut self, cancel: &CancelToken, id: &TaskId) {
        let flow = self.flow;
        let Some(targets) = flow.targets_of(id.as_str()) else {
            return;
        };

        for target in targets {
            let count = self.trigger_counts.entry(target.clone()).or_insert(0);
            *count += 1;

            if Some(*count) == flow.required_of(target.as_str()) {
                debug!(task = %target, "all predecessors succeeded");
                self.run_node(cancel, target.clone());
                self.report_progress();
            }
        }
    }

    fn report_progress(&self) {
        if let Some(reporter) = &self.progress_reporter {
            reporter(self.stats.clone());
        }
    }

    fn result(self, cancel_cause: Option<CancelCause>) -> Result<(), FlowError> {
        let name = self.flow.name().to_string();

        if let Some(cause) = cancel_cause {
            return Err(FlowError::Canceled {
                name,
                cause,
                task_errors: self.task_errors,
            });
        }

        if !self.task_errors.is_empty() {
            return Err(FlowError::Failed {
                name,
                task_errors: self.task_errors,
            });
        }

        Ok(())
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
