// src/shard/registry.rs

//! Ordered registry of shard descriptors.

use std::fmt;
use std::sync::Arc;

use crate::shard::task::{ShardContext, ShardTask};
use crate::types::ShardId;

/// A schedulable unit of work: a label, the shards it waits for, and a task.
pub struct Shard<R> {
    label: String,
    dependencies: Vec<ShardId>,
    task: Arc<dyn ShardTask<R>>,
}

impl<R> Shard<R> {
    pub fn new<T>(task: T) -> Self
    where
        T: ShardTask<R> + 'static,
    {
        Self::from_arc(Arc::new(task))
    }

    /// Build a shard from a closure. Unlike [`Shard::new`], this pins the
    /// closure signature so the context parameter needs no annotation.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&ShardContext<R>) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Self::new(f)
    }

    /// Build a shard around an already shared task (e.g. one task instance
    /// reused by several map shards).
    pub fn from_arc(task: Arc<dyn ShardTask<R>>) -> Self {
        Self {
            label: String::new(),
            dependencies: Vec::new(),
            task,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Add a single dependency.
    pub fn after(mut self, dep: ShardId) -> Self {
        if !self.dependencies.contains(&dep) {
            self.dependencies.push(dep);
        }
        self
    }

    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = ShardId>) -> Self {
        for dep in deps {
            self = self.after(dep);
        }
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn dependencies(&self) -> &[ShardId] {
        &self.dependencies
    }

    pub fn task(&self) -> &Arc<dyn ShardTask<R>> {
        &self.task
    }
}

impl<R> fmt::Debug for Shard<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shard")
            .field("label", &self.label)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Ordered, fixed-size collection of shards. A shard's position is its id.
///
/// The list does not check that dependencies form a DAG or even reference
/// existing shards; [`Scheduler::new`](crate::dag::Scheduler::new) does.
pub struct ShardList<R> {
    shards: Vec<Shard<R>>,
}

impl<R> ShardList<R> {
    pub fn new() -> Self {
        Self { shards: Vec::new() }
    }

    /// Append a shard and return its id. Unlabelled shards are named
    /// `shard-<id>`.
    pub fn push(&mut self, mut shard: Shard<R>) -> ShardId {
        let id = self.shards.len();
        if shard.label.is_empty() {
            shard.label = format!("shard-{id}");
        }
        self.shards.push(shard);
        id
    }

    pub fn get(&self, id: ShardId) -> Option<&Shard<R>> {
        self.shards.get(id)
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShardId, &Shard<R>)> {
        self.shards.iter().enumerate()
    }

    /// Label of `id`, or a placeholder for ids outside the list.
    pub fn label_of(&self, id: ShardId) -> &str {
        self.shards
            .get(id)
            .map(|s| s.label.as_str())
            .unwrap_or("<unknown>")
    }
}

impl<R> Default for ShardList<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for ShardList<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.shards.iter()).finish()
    }
}

impl<R> FromIterator<Shard<R>> for ShardList<R> {
    fn from_iter<I: IntoIterator<Item = Shard<R>>>(iter: I) -> Self {
        let mut list = ShardList::new();
        for shard in iter {
            list.push(shard);
        }
        list
    }
}
