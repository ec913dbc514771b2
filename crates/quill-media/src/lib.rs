//! Local resources for one job.
//!
//! This crate provides:
//! - Scoped scratch workspaces removed on every exit path
//! - Bounded source downloads (timeout and size cap)
//! - External worker process runner with capped stream capture and a
//!   wall-clock timeout

pub mod command;
pub mod download;
pub mod error;
pub mod workspace;

pub use command::{
    check_program, WorkerCommand, WorkerOutput, WorkerRunner, DEFAULT_MAX_STDERR_BYTES,
    DEFAULT_MAX_STDOUT_BYTES,
};
pub use download::{source_file_name, Downloader};
pub use error::{MediaError, MediaResult};
pub use workspace::Workspace;
