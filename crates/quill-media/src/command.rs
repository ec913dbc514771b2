//! External worker command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Default cap on captured stdout.
pub const DEFAULT_MAX_STDOUT_BYTES: usize = 16 * 1024 * 1024;

/// Default cap on captured stderr.
pub const DEFAULT_MAX_STDERR_BYTES: usize = 64 * 1024;

/// Builder for an external worker invocation.
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a file path as the final positional argument.
    pub fn path_arg(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_string_lossy().to_string();
        self.arg(path)
    }

    /// Run the worker from `dir`.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn build_args(&self) -> Vec<String> {
        self.args.clone()
    }

    /// Command line for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a successful worker run.
#[derive(Debug, Clone)]
pub struct WorkerOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub stderr_truncated: bool,
}

impl WorkerOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Runner for external worker processes.
///
/// Both streams are drained concurrently while the child runs so neither
/// pipe can fill and stall it. Each stream keeps at most its cap in memory
/// and discards the rest.
#[derive(Debug, Clone)]
pub struct WorkerRunner {
    timeout_secs: Option<u64>,
    max_stdout_bytes: usize,
    max_stderr_bytes: usize,
}

impl Default for WorkerRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerRunner {
    pub fn new() -> Self {
        Self {
            timeout_secs: None,
            max_stdout_bytes: DEFAULT_MAX_STDOUT_BYTES,
            max_stderr_bytes: DEFAULT_MAX_STDERR_BYTES,
        }
    }

    /// Set wall-clock timeout. `0` disables it.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = (secs > 0).then_some(secs);
        self
    }

    pub fn with_output_limits(mut self, max_stdout_bytes: usize, max_stderr_bytes: usize) -> Self {
        self.max_stdout_bytes = max_stdout_bytes;
        self.max_stderr_bytes = max_stderr_bytes;
        self
    }

    /// Run `cmd` to completion.
    ///
    /// Non-zero exit yields `WorkerFailed` carrying the exit code and the
    /// captured stderr. Stdout beyond its cap yields `OutputTooLarge`.
    pub async fn run(&self, cmd: &WorkerCommand) -> MediaResult<WorkerOutput> {
        check_program(cmd.program())?;
        debug!("Running worker: {}", cmd.display());

        let mut command = Command::new(cmd.program());
        command
            .args(cmd.build_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &cmd.current_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MediaError::WorkerNotFound(cmd.program().to_string())
            } else {
                MediaError::Io(e)
            }
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::internal("worker stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("worker stderr not captured"))?;

        let mut stdout_task = tokio::spawn(read_capped(stdout, self.max_stdout_bytes));
        let mut stderr_task = tokio::spawn(read_capped(stderr, self.max_stderr_bytes));

        // Exit and both pipe drains share one deadline: a background
        // grandchild can keep the pipes open after the worker exits.
        let collect = async {
            let status = child.wait().await?;
            let stdout = join_capture(&mut stdout_task).await?;
            let stderr = join_capture(&mut stderr_task).await?;
            Ok::<_, MediaError>((status, stdout, stderr))
        };

        let collected = match self.timeout_secs {
            Some(timeout_secs) => {
                let timed = tokio::time::timeout(Duration::from_secs(timeout_secs), collect).await;
                match timed {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            "Worker timed out after {} seconds, killing process",
                            timeout_secs
                        );
                        if let Err(e) = child.kill().await {
                            warn!("Failed to kill timed out worker: {}", e);
                        }
                        Err(MediaError::Timeout(timeout_secs))
                    }
                }
            }
            None => collect.await,
        };

        let (status, stdout, stderr) = match collected {
            Ok(collected) => collected,
            Err(e) => {
                stdout_task.abort();
                stderr_task.abort();
                return Err(e);
            }
        };

        let stderr_text = stderr.text();

        if !status.success() {
            return Err(MediaError::worker_failed(
                format!("{} exited with {}", cmd.program(), status),
                Some(stderr_text),
                status.code(),
            ));
        }

        if stdout.truncated() {
            return Err(MediaError::OutputTooLarge {
                limit: self.max_stdout_bytes,
            });
        }

        Ok(WorkerOutput {
            stdout: stdout.bytes,
            stderr: stderr_text,
            stderr_truncated: stderr.truncated(),
        })
    }
}

struct Captured {
    bytes: Vec<u8>,
    total: usize,
}

impl Captured {
    fn truncated(&self) -> bool {
        self.total > self.bytes.len()
    }

    fn text(&self) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        if self.truncated() {
            text.push_str(&format!(
                "\n... [truncated {} bytes]",
                self.total - self.bytes.len()
            ));
        }
        text
    }
}

async fn read_capped<R>(mut reader: R, limit: usize) -> std::io::Result<Captured>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    let mut total = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        total += n;
        let room = limit.saturating_sub(bytes.len());
        bytes.extend_from_slice(&chunk[..n.min(room)]);
    }

    Ok(Captured { bytes, total })
}

async fn join_capture(task: &mut JoinHandle<std::io::Result<Captured>>) -> MediaResult<Captured> {
    task.await
        .map_err(|e| MediaError::internal(format!("stream capture task failed: {}", e)))?
        .map_err(MediaError::from)
}

/// Check that a worker program resolves on PATH (or as a path).
pub fn check_program(program: &str) -> MediaResult<PathBuf> {
    which::which(program).map_err(|_| MediaError::WorkerNotFound(program.to_string()))
}
