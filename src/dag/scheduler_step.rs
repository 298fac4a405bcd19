// src/dag/scheduler_step.rs

//! Step-by-step result types for the scheduler core.

use crate::types::{ShardId, ShardStatus};

/// Result of a single launch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchStep {
    /// Shards moved from `Pending` to `Running`, in ascending id order. The
    /// caller must submit exactly these to the worker pool.
    pub launched: Vec<ShardId>,
}

impl LaunchStep {
    pub fn len(&self) -> usize {
        self.launched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.launched.is_empty()
    }
}

/// Result of applying one completion token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionStep {
    pub shard: ShardId,
    /// Status the shard ended up in. `None` if the token was ignored because
    /// the shard was not running.
    pub status: Option<ShardStatus>,
    /// Pending dependents newly marked `Error` because this shard failed.
    pub newly_failed: Vec<ShardId>,
    /// Whether this step made every shard terminal.
    pub run_just_finished: bool,
}

impl CompletionStep {
    pub(crate) fn ignored(shard: ShardId) -> Self {
        Self {
            shard,
            status: None,
            newly_failed: Vec::new(),
            run_just_finished: false,
        }
    }
}
