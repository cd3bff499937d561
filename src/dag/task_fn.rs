// src/dag/task_fn.rs

//! Task functions and combinators over them.
//!
//! A [`TaskFn`] is the payload of a task: an async function that receives the
//! run's [`CancelToken`] and returns `Ok(())` or the reason it failed. The
//! combinators wrap one or more functions into a new one, so conditional
//! steps, deadlines and retries can be expressed without touching the
//! graph.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::{BoxFuture, join_all};
use futures::FutureExt;
use thiserror::Error;
use tracing::debug;

use crate::engine::{CancelCause, CancelToken};

/// Boxed future returned by a [`TaskFn`].
pub type TaskFuture = BoxFuture<'static, Result<()>>;

/// The work function of a task.
#[derive(Clone)]
pub struct TaskFn(Arc<dyn Fn(CancelToken) -> TaskFuture + Send + Sync>);

impl fmt::Debug for TaskFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TaskFn(..)")
    }
}

impl TaskFn {
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(CancelToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self(Arc::new(move |token| func(token).boxed()))
    }

    /// A function that succeeds immediately.
    pub fn noop() -> Self {
        Self::new(|_| async { Ok(()) })
    }

    /// Invoke the function. The returned future does nothing until polled.
    pub fn call(&self, token: CancelToken) -> TaskFuture {
        (self.0)(token)
    }

    /// Replace the function with [`TaskFn::noop`] when `skip` is true.
    pub fn skip_if(self, skip: bool) -> Self {
        if skip { Self::noop() } else { self }
    }

    /// Keep the function only when `condition` is true.
    pub fn do_if(self, condition: bool) -> Self {
        self.skip_if(!condition)
    }

    /// Run under a child token that is cancelled with
    /// [`CancelCause::DeadlineExceeded`] after `timeout`.
    ///
    /// Cancellation stays cooperative: the inner function is not dropped when
    /// the deadline passes, it is expected to observe the token and return.
    pub fn timeout(self, timeout: Duration) -> Self {
        Self::new(move |token: CancelToken| {
            let inner = self.clone();
            async move {
                let child = token.child();
                let fut = inner.call(child.clone());
                tokio::pin!(fut);

                tokio::select! {
                    res = &mut fut => res,
                    _ = tokio::time::sleep(timeout) => {
                        debug!(?timeout, "task function deadline reached");
                        child.cancel_with(CancelCause::DeadlineExceeded);
                        fut.await
                    }
                }
            }
        })
    }

    /// Call the function repeatedly until it succeeds, waiting `interval`
    /// between attempts, for at most `timeout`.
    ///
    /// Each attempt sees a token that is cancelled when the timeout passes or
    /// the parent token is cancelled. When retries stop, the last error is
    /// returned.
    pub fn retry_until_timeout(self, interval: Duration, timeout: Duration) -> Self {
        Self::new(move |token: CancelToken| {
            let inner = self.clone();
            async move {
                let child = token.child();
                child.cancel_after(timeout);
                let res = retry_loop(&inner, &child, interval).await;
                // Stops the deadline timer.
                child.cancel();
                res
            }
        })
    }

    /// Run the functions one after another, stopping at the first error.
    ///
    /// If the token is cancelled between two steps, the remaining steps are
    /// skipped and the cancel cause is returned.
    pub fn sequential(funcs: impl IntoIterator<Item = TaskFn>) -> Self {
        let funcs: Arc<[TaskFn]> = funcs.into_iter().collect();
        Self::new(move |token: CancelToken| {
            let funcs = Arc::clone(&funcs);
            async move {
                for (idx, func) in funcs.iter().enumerate() {
                    token
                        .err()
                        .with_context(|| format!("sequential step {idx} not started"))?;
                    func.call(token.clone()).await?;
                }
                Ok(())
            }
        })
    }

    /// Run the functions concurrently and wait for all of them.
    ///
    /// Every failure is collected into a [`ParallelError`].
    pub fn parallel(funcs: impl IntoIterator<Item = TaskFn>) -> Self {
        let funcs: Arc<[TaskFn]> = funcs.into_iter().collect();
        Self::new(move |token: CancelToken| {
            let funcs = Arc::clone(&funcs);
            async move {
                let results = join_all(funcs.iter().map(|f| f.call(token.clone()))).await;
                let errors: Vec<anyhow::Error> =
                    results.into_iter().filter_map(Result::err).collect();

                if errors.is_empty() {
                    Ok(())
                } else {
                    Err(ParallelError { errors }.into())
                }
            }
        })
    }
}

async fn retry_loop(func: &TaskFn, token: &CancelToken, interval: Duration) -> Result<()> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let err = match func.call(token.clone()).await {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        debug!(attempt, error = %format!("{err:#}"), "attempt failed; retrying");

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = token.canceled() => {
                let cause = token.cause().unwrap_or(CancelCause::Canceled);
                return Err(err).with_context(|| {
                    format!("retry stopped after {attempt} attempt(s): {cause}")
                });
            }
        }
    }
}

/// Failures of the functions combined by [`TaskFn::parallel`].
#[derive(Debug, Error)]
#[error("{} of the parallel functions failed: {}", .errors.len(), join_errors(.errors))]
pub struct ParallelError {
    pub errors: Vec<anyhow::Error>,
}

fn join_errors(errors: &[anyhow::Error]) -> String {
    errors
        .iter()
        .map(|e| format!("{e:#}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::bail;

    use super::*;

    fn counting(counter: Arc<AtomicUsize>, fail_until: usize) -> TaskFn {
        TaskFn::new(move |_| {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < fail_until {
                    bail!("attempt {n} failed");
                }
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn skip_if_replaces_with_noop() {
        let failing = TaskFn::new(|_| async { bail!("boom") });
        assert!(failing.clone().skip_if(true).call(CancelToken::new()).await.is_ok());
        assert!(failing.do_if(true).call(CancelToken::new()).await.is_err());
    }

    #[tokio::test]
    async fn timeout_cancels_child_token_only() {
        let parent = CancelToken::new();
        let func = TaskFn::new(|token: CancelToken| async move {
            token.canceled().await;
            Err(anyhow::Error::new(token.err().unwrap_err()))
        })
        .timeout(Duration::from_millis(20));

        let err = func.call(parent.clone()).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<CancelCause>(),
            Some(&CancelCause::DeadlineExceeded)
        );
        assert!(!parent.is_canceled());
    }

    #[tokio::test]
    async fn retry_until_timeout_retries_until_success() {
        let counter = Arc::new(AtomicUsize::new(0));
        let func = counting(Arc::clone(&counter), 3)
            .retry_until_timeout(Duration::from_millis(1), Duration::from_secs(5));

        func.call(CancelToken::new()).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_until_timeout_returns_last_error() {
        let counter = Arc::new(AtomicUsize::new(0));
        let func = counting(Arc::clone(&counter), usize::MAX)
            .retry_until_timeout(Duration::from_millis(5), Duration::from_millis(30));

        let err = func.call(CancelToken::new()).await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("retry stopped"), "{msg}");
        assert!(msg.contains("deadline exceeded"), "{msg}");
        assert!(counter.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn sequential_stops_at_first_error() {
        let counter = Arc::new(AtomicUsize::new(0));
        let func = TaskFn::sequential([
            counting(Arc::clone(&counter), 0),
            TaskFn::new(|_| async { bail!("second step broke") }),
            counting(Arc::clone(&counter), 0),
        ]);

        let err = func.call(CancelToken::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "second step broke");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sequential_does_not_start_when_canceled() {
        let counter = Arc::new(AtomicUsize::new(0));
        let token = CancelToken::new();
        token.cancel();

        let func = TaskFn::sequential([counting(Arc::clone(&counter), 0)]);
        assert!(func.call(token).await.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn parallel_collects_all_errors() {
        let counter = Arc::new(AtomicUsize::new(0));
        let func = TaskFn::parallel([
            TaskFn::new(|_| async { bail!("left") }),
            counting(Arc::clone(&counter), 0),
            TaskFn::new(|_| async { bail!("right") }),
        ]);

        let err = func.call(CancelToken::new()).await.unwrap_err();
        let parallel = err.downcast_ref::<ParallelError>().expect("ParallelError");
        assert_eq!(parallel.errors.len(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(err.to_string().starts_with("2 of the parallel functions failed"));
    }
}
