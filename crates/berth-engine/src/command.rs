//! Subprocess plumbing shared by the engine adapters

use crate::{EngineError, Result};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

fn render(program: &str, args: &[&str]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}

/// Run a command to completion, requiring a zero exit status.
///
/// Stdout and stderr are captured, not inherited; stderr is carried in
/// the error on failure.
pub async fn run_checked(program: &str, args: &[&str]) -> Result<()> {
    debug!("Running: {}", render(program, args));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| EngineError::Spawn {
            command: program.to_string(),
            source: e,
        })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(EngineError::Command {
            command: render(program, args),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run a command for its side effect, swallowing any failure.
///
/// Used for teardown paths where absence of the target is not an error.
pub async fn run_best_effort(program: &str, args: &[&str]) {
    if let Err(e) = run_checked(program, args).await {
        warn!("Ignoring failure of `{}`: {}", render(program, args), e);
    }
}

/// Run a command and report whether it exited successfully.
///
/// Spawn failures (missing binary) count as failure, never as an error.
pub async fn succeeds(program: &str, args: &[&str]) -> bool {
    run_checked(program, args).await.is_ok()
}

/// Run a command and capture its stdout as UTF-8 text.
pub async fn capture_stdout(program: &str, args: &[&str]) -> Result<String> {
    debug!("Capturing: {}", render(program, args));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| EngineError::Spawn {
            command: program.to_string(),
            source: e,
        })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        Err(EngineError::Command {
            command: render(program, args),
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run a shell pipeline through `sh -c` and capture its stdout.
pub async fn shell_capture(pipeline: &str) -> Result<String> {
    capture_stdout("sh", &["-c", pipeline]).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_checked_success() {
        assert!(run_checked("true", &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_run_checked_nonzero_exit() {
        let err = run_checked("false", &[]).await.unwrap_err();
        match err {
            EngineError::Command { status, .. } => assert_eq!(status, Some(1)),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_run_checked_missing_binary() {
        let err = run_checked("berth-no-such-binary", &[]).await.unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_succeeds_swallows_spawn_failure() {
        assert!(!succeeds("berth-no-such-binary", &[]).await);
        assert!(succeeds("true", &[]).await);
    }

    #[tokio::test]
    async fn test_shell_capture() {
        let out = shell_capture("printf '1,2' | tr ',' ' '").await.unwrap();
        assert_eq!(out, "1 2");
    }
}
