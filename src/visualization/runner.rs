//! Subprocess execution seam
//!
//! The trigger talks to the operating system only through [`ProcessRunner`],
//! so tests can record invocations instead of spawning interpreters.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Upper bound for a `--version` probe
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// A fully resolved subprocess call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

/// Captured result of a finished subprocess
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// Launches external programs
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Whether `program --version` runs and exits successfully
    async fn probe(&self, program: &str) -> bool;

    /// Run to completion, killing the child if the timeout elapses
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, RunError>;
}

/// [`ProcessRunner`] backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn probe(&self, program: &str) -> bool {
        let status = Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(PROBE_TIMEOUT, status).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                debug!("{} not available: {}", program, e);
                false
            }
            Err(_) => {
                debug!("{} --version did not answer in time", program);
                false
            }
        }
    }

    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, RunError> {
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunError::Launch {
                program: invocation.program.clone(),
                source,
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(invocation.timeout, child.wait_with_output())
            .await
            .map_err(|_| RunError::TimedOut(invocation.timeout))?
            .map_err(|source| RunError::Launch {
                program: invocation.program.clone(),
                source,
            })?;

        Ok(ProcessOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(dir: &TempDir, script: &str, timeout: Duration) -> Invocation {
        Invocation {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            working_dir: dir.path().to_path_buf(),
            timeout,
        }
    }

    #[tokio::test]
    async fn test_probe_unknown_program() {
        let runner = TokioProcessRunner;
        assert!(!runner.probe("galileo-no-such-interpreter").await);
    }

    #[tokio::test]
    async fn test_run_captures_output_in_working_dir() {
        let dir = TempDir::new().unwrap();
        let runner = TokioProcessRunner;

        let output = runner
            .run(&sh(&dir, "echo hello; touch marker", Duration::from_secs(10)))
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.stdout.trim(), "hello");
        assert!(dir.path().join("marker").exists());
    }

    #[tokio::test]
    async fn test_run_reports_nonzero_exit() {
        let dir = TempDir::new().unwrap();
        let output = TokioProcessRunner
            .run(&sh(&dir, "echo broken >&2; exit 3", Duration::from_secs(10)))
            .await
            .unwrap();

        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        assert!(output.stderr.contains("broken"));
    }

    #[tokio::test]
    async fn test_run_times_out() {
        let dir = TempDir::new().unwrap();
        let started = std::time::Instant::now();

        let err = TokioProcessRunner
            .run(&sh(&dir, "sleep 30", Duration::from_millis(200)))
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::TimedOut(_)));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_run_launch_failure() {
        let dir = TempDir::new().unwrap();
        let invocation = Invocation {
            program: "galileo-no-such-interpreter".to_string(),
            args: vec![],
            working_dir: dir.path().to_path_buf(),
            timeout: Duration::from_secs(1),
        };

        let err = TokioProcessRunner.run(&invocation).await.unwrap_err();
        assert!(matches!(err, RunError::Launch { .. }));
    }
}
