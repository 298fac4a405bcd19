// src/types.rs

use std::fmt;

use thiserror::Error;

/// Index of a shard in its [`ShardList`](crate::shard::ShardList).
///
/// Ids are dense (`0..N`) and stable for the lifetime of a scheduler.
pub type ShardId = usize;

/// Scheduling status of a single shard.
///
/// A shard only ever moves forward: `Pending -> Running -> Completed|Error`,
/// or `Pending -> Error` when one of its dependencies failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShardStatus {
    /// Waiting for dependencies (or for a free concurrency slot).
    #[default]
    Pending,
    /// Submitted to the worker pool and not yet reported back.
    Running,
    /// Task finished successfully; its result slot is populated.
    Completed,
    /// Task failed, panicked, could not be submitted, or a dependency failed.
    Error,
}

impl ShardStatus {
    /// `Completed` and `Error` are terminal; no transition leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, ShardStatus::Completed | ShardStatus::Error)
    }
}

impl fmt::Display for ShardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShardStatus::Pending => "PENDING",
            ShardStatus::Running => "RUNNING",
            ShardStatus::Completed => "COMPLETED",
            ShardStatus::Error => "ERROR",
        };
        f.pad(s)
    }
}

/// Diagnostic detail for a shard that ended in [`ShardStatus::Error`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShardFailure {
    /// The task returned an error.
    #[error("task failed: {0}")]
    Failed(String),

    /// The task panicked while executing.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The worker pool refused the job.
    #[error("could not submit task to worker pool: {0}")]
    SubmitFailed(String),

    /// The job was dropped before it reported an outcome.
    #[error("task was dropped by the worker pool before reporting an outcome")]
    Abandoned,

    /// A (possibly transitive) dependency ended in `Error`, so this shard
    /// was never started.
    #[error("dependency shard {0} failed")]
    DependencyFailed(ShardId),
}

/// Snapshot of scheduler counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub total: usize,
    pub running: usize,
    /// Shards in either terminal state.
    pub completed: usize,
    /// Subset of `completed` that ended in `Error`.
    pub failed: usize,
}

impl Progress {
    pub fn succeeded(&self) -> usize {
        self.completed - self.failed
    }
}
