//! Shared helpers for taskflow's integration tests.
//!
//! - [`builders`]: flow file builders.
//! - [`fake_tasks`]: task functions that record what ran into a [`fake_tasks::Journal`].
//! - [`progress`]: a progress reporter that keeps every snapshot.
//! - [`logs`]: an in-memory log sink for checking what a run emitted.

pub mod builders;
pub mod fake_tasks;
pub mod logs;
pub mod progress;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

/// Upper bound for a single test future.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured by the harness and shown for failing tests only.
/// Flow runs discard their events unless the test passes
/// `Opts::new().with_current_logger()`. Filter with `TASKFLOW_LOG`, e.g.
/// `TASKFLOW_LOG=debug cargo test`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_env("TASKFLOW_LOG")
            .unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// Await `fut`, panicking if it takes longer than [`TEST_TIMEOUT`].
///
/// A hung flow run shows up as a failure instead of a stuck test binary.
pub async fn with_timeout<F: Future>(fut: F) -> F::Output {
    match tokio::time::timeout(TEST_TIMEOUT, fut).await {
        Ok(out) => out,
        Err(_) => panic!("test future did not finish within {TEST_TIMEOUT:?}"),
    }
}
