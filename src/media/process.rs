use std::path::Path;
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Why an external tool invocation did not succeed.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The binary could not be started at all (missing, not executable).
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    /// The process ran and exited unsuccessfully.
    #[error("{tool} exited with {status}: {}", last_line(.stderr))]
    Exit {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{tool} timed out after {}s", .after.as_secs())]
    TimedOut { tool: String, after: Duration },
    /// The process succeeded but produced output we could not use.
    #[error("unusable {tool} output: {message}")]
    Output { tool: String, message: String },
}

impl ToolError {
    pub fn output(tool: &str, message: impl Into<String>) -> Self {
        Self::Output {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

fn last_line(stderr: &str) -> &str {
    stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
        .unwrap_or("no error output")
}

/// Runs `program` to completion and returns its output on a zero exit.
///
/// The child is killed if the returned future is dropped, so an abandoned
/// request never leaves the tool running.
pub async fn run_tool(
    program: &str,
    args: &[String],
    timeout: Option<Duration>,
) -> Result<Output, ToolError> {
    debug!("Running {} {}", program, args.join(" "));

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::Launch {
            tool: program.to_string(),
            source,
        })?;

    let output = match timeout {
        Some(after) => tokio::time::timeout(after, child.wait_with_output())
            .await
            .map_err(|_| ToolError::TimedOut {
                tool: program.to_string(),
                after,
            })?,
        None => child.wait_with_output().await,
    }
    .map_err(|source| ToolError::Launch {
        tool: program.to_string(),
        source,
    })?;

    if !output.status.success() {
        return Err(ToolError::Exit {
            tool: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(output)
}

/// Runs `program <version_arg>` and returns the first line of its output.
pub async fn probe_version(program: &str, version_arg: &str) -> Result<String, ToolError> {
    let output = run_tool(
        program,
        &[version_arg.to_string()],
        Some(Duration::from_secs(10)),
    )
    .await?;

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or("unknown")
        .trim()
        .to_string())
}

/// A zero exit with no file on disk still counts as a failed download.
pub async fn ensure_written(tool: &str, path: &Path) -> Result<(), ToolError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ToolError::output(tool, format!("{} missing: {}", path.display(), e)))?;

    if metadata.len() == 0 {
        return Err(ToolError::output(
            tool,
            format!("{} is empty", path.display()),
        ));
    }

    Ok(())
}
