// src/shard/task.rs

//! The executable side of a shard.

use std::sync::Arc;

use crate::types::ShardId;

/// Work bound to a shard.
///
/// A task reports failure by returning `Err`; the scheduler turns that (and
/// any panic) into an `Error` status for the shard. On success the returned
/// value becomes the shard's result and is handed to dependents through their
/// [`ShardContext`].
pub trait ShardTask<R>: Send + Sync {
    fn execute(&self, ctx: &ShardContext<R>) -> anyhow::Result<R>;
}

impl<R, F> ShardTask<R> for F
where
    F: Fn(&ShardContext<R>) -> anyhow::Result<R> + Send + Sync,
{
    fn execute(&self, ctx: &ShardContext<R>) -> anyhow::Result<R> {
        self(ctx)
    }
}

/// Everything a running task may know about its shard.
///
/// Built by the scheduler at launch time. By construction every dependency
/// listed here has already completed, so its result is always present.
#[derive(Debug)]
pub struct ShardContext<R> {
    id: ShardId,
    label: String,
    dependencies: Vec<(ShardId, Arc<R>)>,
}

impl<R> ShardContext<R> {
    pub fn new(id: ShardId, label: impl Into<String>, dependencies: Vec<(ShardId, Arc<R>)>) -> Self {
        Self {
            id,
            label: label.into(),
            dependencies,
        }
    }

    pub fn id(&self) -> ShardId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Result of the given dependency, or `None` if `id` is not one of this
    /// shard's dependencies.
    pub fn dependency_result(&self, id: ShardId) -> Option<&R> {
        self.dependencies
            .iter()
            .find(|(dep, _)| *dep == id)
            .map(|(_, result)| result.as_ref())
    }

    /// Results of all dependencies, in declaration order.
    pub fn dependency_results(&self) -> impl Iterator<Item = (ShardId, &R)> {
        self.dependencies
            .iter()
            .map(|(dep, result)| (*dep, result.as_ref()))
    }
}
