//! Synchronous subprocess execution for external collaborators (version
//! control, test runners, linters).
//!
//! Each call blocks until the child exits or the timeout elapses. Output is
//! drained on dedicated threads so a chatty child cannot fill its pipe and
//! deadlock; the wait itself runs on a waiter thread and is bounded with
//! `mpsc::recv_timeout`.

use crate::error::{DocketError, Result};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Output kept per step in reports; the tail is kept.
const MAX_OUTPUT: usize = 10 * 1024;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// One collaborator step in a report. A failing step never aborts the
/// report it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub name: String,
    pub passed: bool,
    pub output: String,
    pub duration_ms: u64,
}

/// Run `program args...` in `cwd`. `None` timeout waits indefinitely.
///
/// Spawn failures and timeouts are `ExternalTool` errors; a non-zero exit is
/// reported through `CommandOutput::success`.
pub fn run(
    program: &str,
    args: &[&str],
    cwd: &Path,
    timeout: Option<Duration>,
) -> Result<CommandOutput> {
    let tool_err = |message: String| DocketError::ExternalTool {
        tool: program.to_string(),
        message,
    };

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| tool_err(format!("failed to spawn: {e}")))?;

    let child_pid = child.id();
    let stdout_handle = child.stdout.take();
    let stderr_handle = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> String {
        let mut buf = String::new();
        if let Some(mut r) = stdout_handle {
            let _ = r.read_to_string(&mut buf);
        }
        buf
    });
    let stderr_thread = std::thread::spawn(move || -> String {
        let mut buf = String::new();
        if let Some(mut r) = stderr_handle {
            let _ = r.read_to_string(&mut buf);
        }
        buf
    });

    let wait_result = match timeout {
        None => child.wait(),
        Some(limit) => {
            let (tx, rx) = std::sync::mpsc::channel();
            std::thread::spawn(move || {
                let _ = tx.send(child.wait());
            });
            match rx.recv_timeout(limit) {
                Ok(result) => result,
                Err(_) => {
                    kill_process(child_pid);
                    tracing::warn!(program, pid = child_pid, "killed after timeout");
                    return Err(tool_err(format!("timed out after {}s", limit.as_secs())));
                }
            }
        }
    };

    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();
    let status = wait_result.map_err(|e| tool_err(format!("wait failed: {e}")))?;

    Ok(CommandOutput {
        success: status.success(),
        stdout,
        stderr,
    })
}

/// Run a shell command line as a named report step.
pub fn run_step(name: &str, command: &str, cwd: &Path, timeout: Option<Duration>) -> StepResult {
    let start = Instant::now();
    let (passed, output) = if command.trim().is_empty() {
        (false, "command is empty".to_string())
    } else {
        match run("sh", &["-c", command], cwd, timeout) {
            Ok(out) => (out.success, combine_output(&out.stdout, &out.stderr)),
            Err(e) => (false, e.to_string()),
        }
    };
    StepResult {
        name: name.to_string(),
        passed,
        output,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

/// Combine stdout/stderr and cap the result, keeping the tail.
fn combine_output(stdout: &str, stderr: &str) -> String {
    let output = if stderr.is_empty() {
        stdout.to_string()
    } else if stdout.is_empty() {
        stderr.to_string()
    } else {
        format!("{stdout}\n{stderr}")
    };
    let trimmed = output.trim();
    if trimmed.len() <= MAX_OUTPUT {
        return trimmed.to_string();
    }
    let mut cut = trimmed.len() - MAX_OUTPUT;
    while !trimmed.is_char_boundary(cut) {
        cut += 1;
    }
    trimmed[cut..].to_string()
}

/// Terminate a process by PID using SIGKILL. Best-effort.
fn kill_process(pid: u32) {
    let _ = Command::new("kill")
        .arg("-9")
        .arg(pid.to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}
