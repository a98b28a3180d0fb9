//! External command runner for the Blocks CLI collaborator.
//!
//! Opaque pass-through: run a shell command, capture exit code and streams,
//! report a success flag. Nothing here parses the CLI's own output.

use tokio::process::Command;

/// Captured outcome of one external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub returncode: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run a command through the shell and capture its streams.
///
/// Spawn failures fold into the same shape as a failed command rather than
/// surfacing as a separate error path.
pub async fn run_shell(command: &str) -> CommandOutput {
    match Command::new("sh").arg("-c").arg(command).output().await {
        Ok(output) => CommandOutput {
            success: output.status.success(),
            returncode: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        },
        Err(err) => CommandOutput {
            success: false,
            returncode: -1,
            stdout: String::new(),
            stderr: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let out = run_shell("echo hello").await;
        assert!(out.success);
        assert_eq!(out.returncode, 0);
        assert_eq!(out.stdout, "hello");
        assert_eq!(out.stderr, "");
    }

    #[tokio::test]
    async fn reports_failure_with_stderr() {
        let out = run_shell("echo oops >&2; exit 3").await;
        assert!(!out.success);
        assert_eq!(out.returncode, 3);
        assert_eq!(out.stderr, "oops");
    }

    #[tokio::test]
    async fn missing_binary_is_a_plain_failure() {
        let out = run_shell("definitely-not-a-real-binary-xyz --version").await;
        assert!(!out.success);
    }
}
