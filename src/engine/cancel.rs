// src/engine/cancel.rs

//! Cooperative cancellation with a recorded cause.
//!
//! [`CancelToken`] wraps a [`tokio_util::sync::CancellationToken`] and
//! remembers *why* it was cancelled, so a run can report the cause in its
//! outcome. Task functions receive a clone and are expected to watch it.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why a [`CancelToken`] was triggered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CancelCause {
    #[error("canceled")]
    Canceled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("{0}")]
    Other(String),
}

/// Cloneable cancellation handle. All clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    token: CancellationToken,
    cause: Arc<OnceLock<CancelCause>>,
    parent: Option<Box<CancelToken>>,
}

impl CancelToken {
    /// A token that is never triggered unless someone cancels it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel with [`CancelCause::Canceled`].
    pub fn cancel(&self) {
        self.cancel_with(CancelCause::Canceled);
    }

    /// Cancel with the given cause. Only the first cause is kept, and a token
    /// already cancelled through its parent keeps the parent's cause.
    pub fn cancel_with(&self, cause: CancelCause) {
        if self.token.is_cancelled() {
            return;
        }
        if self.cause.set(cause.clone()).is_ok() {
            debug!(%cause, "cancel token triggered");
        }
        self.token.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The cause, once cancelled.
    ///
    /// A child cancelled through its parent reports the parent's cause.
    pub fn cause(&self) -> Option<CancelCause> {
        if !self.token.is_cancelled() {
            return None;
        }

        if let Some(cause) = self.cause.get() {
            return Some(cause.clone());
        }

        Some(
            self.parent
                .as_ref()
                .and_then(|p| p.cause())
                .unwrap_or(CancelCause::Canceled),
        )
    }

    /// `Ok(())` while live, `Err(cause)` once cancelled.
    pub fn err(&self) -> Result<(), CancelCause> {
        match self.cause() {
            Some(cause) => Err(cause),
            None => Ok(()),
        }
    }

    /// Resolves when the token is cancelled.
    pub async fn canceled(&self) {
        self.token.cancelled().await;
    }

    /// A token that is cancelled together with `self`, but can also be
    /// cancelled on its own without affecting `self`.
    pub fn child(&self) -> CancelToken {
        CancelToken {
            token: self.token.child_token(),
            cause: Arc::new(OnceLock::new()),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Cancel with [`CancelCause::DeadlineExceeded`] once `after` elapses.
    ///
    /// Must be called from within a tokio runtime. The timer stops early if
    /// the token is cancelled for another reason.
    pub fn cancel_after(&self, after: Duration) {
        let this = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(after) => this.cancel_with(CancelCause::DeadlineExceeded),
                _ = this.canceled() => {}
            }
        });
    }
}
