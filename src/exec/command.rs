// src/exec/command.rs

//! Task functions that run a shell command.

use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::dag::{TaskFn, TaskId};
use crate::engine::{CancelCause, CancelToken};

/// A [`TaskFn`] that runs `cmd` through the platform shell.
///
/// - A zero exit status is success; anything else is an error naming the
///   exit code.
/// - stdout and stderr are forwarded to the log at debug level.
/// - If the token is cancelled first, the child is killed and the cancel
///   cause is returned.
pub fn command_task(task: impl Into<TaskId>, cmd: impl Into<String>) -> TaskFn {
    let task = task.into();
    let cmd = cmd.into();

    TaskFn::new(move |token: CancelToken| {
        let task = task.clone();
        let cmd = cmd.clone();
        async move { run_command(&task, &cmd, token).await }
    })
}

async fn run_command(task: &TaskId, cmd: &str, token: CancelToken) -> Result<()> {
    info!(task = %task, cmd = %cmd, "starting task process");

    // Build a shell command appropriate for the platform.
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", task))?;

    // Always consume output so pipe buffers don't fill.
    if let Some(stdout) = child.stdout.take() {
        forward_lines(task.clone(), "stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(task.clone(), "stderr", stderr);
    }

    tokio::select! {
        status_res = child.wait() => {
            let status = status_res
                .with_context(|| format!("waiting for process of task '{}'", task))?;

            info!(
                task = %task,
                exit_code = ?status.code(),
                success = status.success(),
                "task process exited"
            );

            if !status.success() {
                match status.code() {
                    Some(code) => bail!("command `{cmd}` exited with status {code}"),
                    None => bail!("command `{cmd}` was terminated by a signal"),
                }
            }
            Ok(())
        }

        _ = token.canceled() => {
            info!(task = %task, "cancellation requested; killing process");
            if let Err(e) = child.kill().await {
                warn!(task = %task, error = %e, "failed to kill child process on cancellation");
            }
            let cause = token.cause().unwrap_or(CancelCause::Canceled);
            Err::<(), _>(cause).with_context(|| format!("command `{cmd}` interrupted"))
        }
    }
}

fn forward_lines<R>(task: TaskId, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(task = %task, stream, "{}", line);
        }
    });
}
