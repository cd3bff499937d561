use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use taskflow::{CancelCause, CancelToken, TaskFn};

/// Something a fake task did, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Finished(String),
}

/// Shared log of task starts and finishes.
///
/// Task functions built from a journal record into it, so tests can assert
/// what ran and in which order.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Names of tasks that started, in start order.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Started(name) => Some(name),
                Event::Finished(_) => None,
            })
            .collect()
    }

    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    /// Records start and finish, yields once in between, then succeeds.
    pub fn succeed(&self, name: &str) -> TaskFn {
        self.finish_with(name, Duration::ZERO, None)
    }

    /// Like [`Journal::succeed`] but sleeps before finishing.
    pub fn succeed_after(&self, name: &str, delay: Duration) -> TaskFn {
        self.finish_with(name, delay, None)
    }

    /// Records start and finish, then fails with `msg`.
    pub fn fail(&self, name: &str, msg: &str) -> TaskFn {
        self.finish_with(name, Duration::ZERO, Some(msg.to_string()))
    }

    /// Blocks until the token is cancelled, then returns the cancel cause as
    /// its error.
    pub fn until_canceled(&self, name: &str) -> TaskFn {
        let journal = self.clone();
        let name = name.to_string();
        TaskFn::new(move |token: CancelToken| {
            let journal = journal.clone();
            let name = name.clone();
            async move {
                journal.record(Event::Started(name.clone()));
                token.canceled().await;
                journal.record(Event::Finished(name));
                Err(anyhow::Error::new(
                    token.cause().unwrap_or(CancelCause::Canceled),
                ))
            }
        })
    }

    fn finish_with(&self, name: &str, delay: Duration, failure: Option<String>) -> TaskFn {
        let journal = self.clone();
        let name = name.to_string();
        TaskFn::new(move |_token: CancelToken| {
            let journal = journal.clone();
            let name = name.clone();
            let failure = failure.clone();
            async move {
                journal.record(Event::Started(name.clone()));
                if delay.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(delay).await;
                }
                journal.record(Event::Finished(name));
                match failure {
                    Some(msg) => Err(anyhow!(msg)),
                    None => Ok(()),
                }
            }
        })
    }
}
