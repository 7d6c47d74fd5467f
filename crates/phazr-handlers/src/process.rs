//! Subprocess execution with timeout enforcement
//!
//! Every child is spawned with piped output and `kill_on_drop`. When the
//! deadline passes the child is killed and waited on before the timeout is
//! reported, so no process outlives the call.

use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Captured output of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, -1 when terminated by a signal
    pub exit_code: i32,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to spawn command: {0}")]
    Spawn(std::io::Error),

    #[error("Failed to read command output: {0}")]
    Io(std::io::Error),

    #[error("Command timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),
}

/// Run `command` to completion, feeding `stdin` if given.
pub async fn run_command(
    mut command: Command,
    stdin: Option<Vec<u8>>,
    limit: Duration,
) -> Result<ProcessOutput, ProcessError> {
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(ProcessError::Spawn)?;

    let outcome = timeout(limit, collect_output(&mut child, stdin)).await;
    match outcome {
        Ok(result) => result,
        Err(_) => {
            // kill() also waits, which reaps the child
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill timed out command");
            }
            Err(ProcessError::Timeout(limit))
        }
    }
}

/// Build a `sh -c <script>` command
pub fn shell(script: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(script);
    command
}

async fn collect_output(
    child: &mut Child,
    stdin: Option<Vec<u8>>,
) -> Result<ProcessOutput, ProcessError> {
    let stdin_pipe = child.stdin.take();
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let write = async move {
        if let (Some(mut pipe), Some(input)) = (stdin_pipe, stdin) {
            if let Err(e) = pipe.write_all(&input).await {
                debug!(error = %e, "Child closed stdin early");
            }
        }
    };

    let (_, stdout, stderr) = tokio::join!(write, read_pipe(stdout_pipe), read_pipe(stderr_pipe));
    let stdout = stdout.map_err(ProcessError::Io)?;
    let stderr = stderr.map_err(ProcessError::Io)?;

    let status = child.wait().await.map_err(ProcessError::Io)?;

    Ok(ProcessOutput {
        stdout,
        stderr,
        exit_code: status.code().unwrap_or(-1),
    })
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let output = run_command(shell("echo hello; exit 3"), None, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.exit_code, 3);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_feeds_stdin() {
        let output = run_command(
            shell("cat"),
            Some(b"manifest".to_vec()),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(output.stdout, "manifest");
        assert!(output.success());
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let start = Instant::now();
        let err = run_command(shell("sleep 30"), None, Duration::from_secs(1))
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessError::Timeout(_)));
        assert_eq!(err.to_string(), "Command timed out after 1 seconds");
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let err = run_command(
            Command::new("/nonexistent/phazr-binary"),
            None,
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn(_)));
    }
}
