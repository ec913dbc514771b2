//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use quill_queue::DEFAULT_JOB_TTL;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base directory for per-job scratch workspaces
    pub work_dir: PathBuf,
    /// Source download timeout
    pub download_timeout: Duration,
    /// Largest source asset accepted
    pub max_download_bytes: u64,
    /// Alignment worker program
    pub align_command: String,
    /// Arguments placed before the asset path
    pub align_args: Vec<String>,
    /// Alignment wall-clock limit in seconds (0 disables)
    pub align_timeout_secs: u64,
    /// Stdout cap for the alignment worker
    pub max_stdout_bytes: usize,
    /// Stderr cap for the alignment worker
    pub max_stderr_bytes: usize,
    /// Job record lifetime after its last update
    pub job_ttl: Duration,
    /// Batch entries run at once
    pub batch_max_concurrent: usize,
    /// Registry poll interval while waiting on another job
    pub batch_poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("quill"),
            download_timeout: Duration::from_secs(30),
            max_download_bytes: 1024 * 1024 * 1024, // 1 GiB
            align_command: "python3".to_string(),
            align_args: vec!["align.py".to_string()],
            align_timeout_secs: 30 * 60,
            max_stdout_bytes: quill_media::DEFAULT_MAX_STDOUT_BYTES,
            max_stderr_bytes: quill_media::DEFAULT_MAX_STDERR_BYTES,
            job_ttl: DEFAULT_JOB_TTL,
            batch_max_concurrent: 1,
            batch_poll_interval: Duration::from_secs(1),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            download_timeout: Duration::from_secs(
                env_parse("DOWNLOAD_TIMEOUT_SECS").unwrap_or(30),
            ),
            max_download_bytes: env_parse("MAX_DOWNLOAD_BYTES")
                .unwrap_or(defaults.max_download_bytes),
            align_command: std::env::var("ALIGN_COMMAND")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.align_command),
            align_args: std::env::var("ALIGN_ARGS")
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or(defaults.align_args),
            align_timeout_secs: env_parse("ALIGN_TIMEOUT_SECS")
                .unwrap_or(defaults.align_timeout_secs),
            max_stdout_bytes: env_parse("MAX_STDOUT_BYTES").unwrap_or(defaults.max_stdout_bytes),
            max_stderr_bytes: env_parse("MAX_STDERR_BYTES").unwrap_or(defaults.max_stderr_bytes),
            job_ttl: Duration::from_secs(
                env_parse("JOB_TTL_SECS").unwrap_or(defaults.job_ttl.as_secs()),
            ),
            batch_max_concurrent: env_parse("BATCH_MAX_CONCURRENT")
                .unwrap_or(defaults.batch_max_concurrent)
                .max(1),
            batch_poll_interval: Duration::from_millis(
                env_parse("BATCH_POLL_INTERVAL_MS").unwrap_or(1000),
            ),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}
