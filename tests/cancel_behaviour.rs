// tests/cancel_behaviour.rs

use std::error::Error;
use std::time::Duration;

use taskflow::{CancelCause, CancelToken, Flow, Opts, Task, TaskFn, was_canceled};
use taskflow_test_utils::fake_tasks::Journal;
use taskflow_test_utils::progress::ProgressRecorder;
use taskflow_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn running_task_finishes_after_cancel_and_is_reported() -> TestResult {
    init_tracing();

    let journal = Journal::new();
    let flow = Flow::from_tasks("blocking", [Task::new("E", journal.until_canceled("E"))])?;

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let progress = ProgressRecorder::new();
    let err = with_timeout(flow.run(progress.attach(Opts::new().with_cancel(cancel))))
        .await
        .unwrap_err();

    assert!(err.was_canceled());
    assert_eq!(err.cancel_cause(), Some(&CancelCause::Canceled));
    assert_eq!(err.task_errors().len(), 1);
    assert_eq!(err.task_errors()[0].task(), "E");
    assert_eq!(
        err.task_errors()[0].cause().downcast_ref::<CancelCause>(),
        Some(&CancelCause::Canceled)
    );

    let last = progress.last();
    assert_eq!(last.failed.names(), vec!["E"]);
    assert!(last.running.is_empty());
    progress.assert_consistent();
    Ok(())
}

#[tokio::test]
async fn cancelled_before_run_launches_nothing() -> TestResult {
    init_tracing();

    let journal = Journal::new();
    let flow = Flow::from_tasks(
        "pre-cancelled",
        [
            Task::new("a", journal.succeed("a")),
            Task::new("b", journal.succeed("b")),
            Task::new("c", journal.succeed("c")).after("a"),
        ],
    )?;

    let cancel = CancelToken::new();
    cancel.cancel();

    let progress = ProgressRecorder::new();
    let err = with_timeout(flow.run(progress.attach(Opts::new().with_cancel(cancel))))
        .await
        .unwrap_err();

    assert!(err.was_canceled());
    assert!(err.task_errors().is_empty());
    assert!(journal.events().is_empty());

    let last = progress.last();
    assert!(last.running.is_empty());
    assert!(last.succeeded.is_empty());
    assert_eq!(last.pending, last.all);
    Ok(())
}

#[tokio::test]
async fn cancel_stops_successors_but_not_running_tasks() -> TestResult {
    init_tracing();

    // slow and quick are roots; quick cancels the run, slow keeps going.
    let journal = Journal::new();
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let quick = TaskFn::new(move |_| {
        let trigger = trigger.clone();
        async move {
            trigger.cancel_with(CancelCause::Other("operator abort".into()));
            Ok(())
        }
    });

    let flow = Flow::from_tasks(
        "abort",
        [
            Task::new("quick", quick),
            Task::new("slow", journal.succeed_after("slow", Duration::from_millis(30))),
            Task::new("after-quick", journal.succeed("after-quick")).after("quick"),
            Task::new("after-slow", journal.succeed("after-slow")).after("slow"),
        ],
    )?;

    let progress = ProgressRecorder::new();
    let err = with_timeout(flow.run(progress.attach(Opts::new().with_cancel(cancel))))
        .await
        .unwrap_err();

    assert_eq!(
        err.cancel_cause(),
        Some(&CancelCause::Other("operator abort".into()))
    );
    assert!(err.task_errors().is_empty());
    assert_eq!(journal.started(), vec!["slow"]);

    let last = progress.last();
    assert_eq!(last.succeeded.names(), vec!["quick", "slow"]);
    assert_eq!(last.pending.names(), vec!["after-quick", "after-slow"]);
    Ok(())
}

#[tokio::test]
async fn deadline_cancels_the_run() -> TestResult {
    init_tracing();

    let journal = Journal::new();
    let flow = Flow::from_tasks(
        "deadline",
        [
            Task::new("wait", journal.until_canceled("wait")),
            Task::new("never", journal.succeed("never")).after("wait"),
        ],
    )?;

    let cancel = CancelToken::new();
    cancel.cancel_after(Duration::from_millis(20));

    let err = with_timeout(flow.run(Opts::new().with_cancel(cancel)))
        .await
        .unwrap_err();

    assert_eq!(err.cancel_cause(), Some(&CancelCause::DeadlineExceeded));
    assert!(err.to_string().contains("deadline exceeded"), "{err}");
    assert_eq!(journal.started(), vec!["wait"]);
    Ok(())
}

#[tokio::test]
async fn cancellation_survives_wrapping_in_anyhow() -> TestResult {
    init_tracing();

    let flow = Flow::from_tasks("wrapped", [Task::new("a", TaskFn::noop())])?;
    let cancel = CancelToken::new();
    cancel.cancel();

    let res: anyhow::Result<()> = async {
        flow.run(Opts::new().with_cancel(cancel)).await?;
        Ok(())
    }
    .await;

    let err = res.unwrap_err().context("running release pipeline");
    assert!(was_canceled(err.as_ref()));
    Ok(())
}

#[tokio::test]
async fn timeout_combinator_fails_only_its_task() -> TestResult {
    init_tracing();

    let journal = Journal::new();
    let flow = Flow::from_tasks(
        "task-timeout",
        [
            Task::new(
                "stuck",
                journal
                    .until_canceled("stuck")
                    .timeout(Duration::from_millis(20)),
            ),
            Task::new("fine", journal.succeed("fine")),
            Task::new("blocked", journal.succeed("blocked")).after("stuck"),
        ],
    )?;

    let err = with_timeout(flow.run(Opts::new())).await.unwrap_err();

    assert!(!err.was_canceled());
    let failed: Vec<&str> = err.failed_tasks().map(|t| t.as_str()).collect();
    assert_eq!(failed, vec!["stuck"]);
    assert_eq!(
        err.task_errors()[0].cause().downcast_ref::<CancelCause>(),
        Some(&CancelCause::DeadlineExceeded)
    );
    assert!(!journal.started().contains(&"blocked".to_string()));
    Ok(())
}
