//! External process invocation

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

/// Captured result of a finished external command
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Short failure detail for error messages: stderr if the tool wrote
    /// any, otherwise stdout, otherwise a generic note.
    pub fn detail(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        "exited with non-zero status".to_string()
    }
}

/// Run a command to completion with captured output. Spawn failures (missing
/// binary, permissions) come back as the io error; a non-zero exit is not an
/// error here — callers decide what a failure means for their tool.
pub async fn run_command(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
) -> std::io::Result<CommandOutput> {
    debug!("Running: {} {}", program, args.join(" "));

    let mut command = Command::new(program);
    command.args(args);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = command.output().await?;
    Ok(CommandOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_prefers_stderr() {
        let output = CommandOutput {
            success: false,
            stdout: "some progress".to_string(),
            stderr: "fatal: repository not found\n".to_string(),
        };
        assert_eq!(output.detail(), "fatal: repository not found");
    }

    #[test]
    fn test_detail_falls_back_to_stdout() {
        let output = CommandOutput {
            success: false,
            stdout: "Error: bad Dockerfile\n".to_string(),
            stderr: String::new(),
        };
        assert_eq!(output.detail(), "Error: bad Dockerfile");
    }

    #[test]
    fn test_detail_handles_silent_failure() {
        let output = CommandOutput {
            success: false,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(output.detail(), "exited with non-zero status");
    }
}
