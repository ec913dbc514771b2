use async_trait::async_trait;
use tracing::debug;

use quill_media::{WorkerCommand, WorkerRunner};
use quill_models::{AlignmentResult, ComputeKind};

use super::{ComputeEngine, ComputeInput};
use crate::config::WorkerConfig;
use crate::error::{quote_output, WorkerError, WorkerResult};

/// Forced alignment through an external worker process.
///
/// The worker gets the asset path as its only positional argument, runs
/// inside the directory holding the asset, prints one JSON document on
/// stdout and logs on stderr.
#[derive(Debug, Clone)]
pub struct AlignmentEngine {
    program: String,
    args: Vec<String>,
    runner: WorkerRunner,
}

impl AlignmentEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>, runner: WorkerRunner) -> Self {
        Self {
            program: program.into(),
            args,
            runner,
        }
    }

    pub fn from_config(config: &WorkerConfig) -> Self {
        let runner = WorkerRunner::new()
            .with_timeout(config.align_timeout_secs)
            .with_output_limits(config.max_stdout_bytes, config.max_stderr_bytes);
        Self::new(config.align_command.clone(), config.align_args.clone(), runner)
    }
}

#[async_trait]
impl ComputeEngine for AlignmentEngine {
    fn kind(&self) -> ComputeKind {
        ComputeKind::Alignment
    }

    fn requires_asset(&self) -> bool {
        true
    }

    async fn compute(&self, input: ComputeInput<'_>) -> WorkerResult<serde_json::Value> {
        let asset = input
            .asset
            .ok_or_else(|| WorkerError::internal("alignment requires a downloaded asset"))?;

        let mut cmd = WorkerCommand::new(&self.program)
            .args(self.args.iter().cloned())
            .path_arg(asset);
        // Scratch files the worker writes land in the job workspace.
        if let Some(workspace) = asset.parent().filter(|p| !p.as_os_str().is_empty()) {
            cmd = cmd.current_dir(workspace);
        }
        let output = self.runner.run(&cmd).await?;

        if !output.stderr.is_empty() {
            debug!(
                truncated = output.stderr_truncated,
                "Alignment worker stderr:\n{}", output.stderr
            );
        }

        let stdout = output.stdout_lossy();
        let mut result = AlignmentResult::parse(&stdout).map_err(|e| {
            WorkerError::parse(format!("{}; output: {}", e, quote_output(&stdout)))
        })?;
        result.reference_text = input.aux_text.map(str::to_string);

        debug!(
            segments = result.segments.len(),
            timed_words = result.timed_word_count(),
            "Alignment parsed"
        );
        serde_json::to_value(&result).map_err(|e| WorkerError::internal(e.to_string()))
    }
}
