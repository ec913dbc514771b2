//! Job tracking and batch scheduling.
//!
//! This crate provides:
//! - `JobRegistry`: process-local, TTL-expiring job records per compute kind
//! - `BatchQueue`: FIFO backlog drained by a single pump task
//!
//! Nothing here survives a restart. A job that was pending when the process
//! died leaves no trace; the next submission simply starts it again.

pub mod batch;
pub mod error;
pub mod registry;

pub use batch::{BatchQueue, BatchRunner};
pub use error::{QueueError, QueueResult};
pub use registry::{JobRegistry, StatusCounts, DEFAULT_JOB_TTL};
