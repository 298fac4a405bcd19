// src/dag/state_manager.rs

//! Per-shard state and the launch/completion state machine.
//!
//! This is the synchronous core of the scheduler: no channels, no threads,
//! no worker pool. [`Scheduler`](crate::dag::Scheduler) owns one of these on
//! the driving thread and feeds it completion tokens.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::graph::ShardGraph;
use crate::dag::scheduler_step::{CompletionStep, LaunchStep};
use crate::errors::{Result, ShardschedError};
use crate::types::{Progress, ShardFailure, ShardId, ShardStatus};

/// Status, result and counter bookkeeping for one execution of a shard graph.
#[derive(Debug)]
pub struct SchedulerState<R> {
    graph: ShardGraph,
    statuses: Vec<ShardStatus>,
    results: Vec<Option<Arc<R>>>,
    failures: Vec<Option<ShardFailure>>,
    max_concurrent: usize,
    num_running: usize,
    /// Shards in either terminal state.
    num_completed: usize,
    num_failed: usize,
    done: bool,
}

impl<R> SchedulerState<R> {
    pub fn new(graph: ShardGraph, max_concurrent: usize) -> Result<Self> {
        if max_concurrent == 0 {
            return Err(ShardschedError::InvalidConcurrency(max_concurrent));
        }

        let len = graph.len();
        Ok(Self {
            graph,
            statuses: vec![ShardStatus::Pending; len],
            results: (0..len).map(|_| None).collect(),
            failures: vec![None; len],
            max_concurrent,
            num_running: 0,
            num_completed: 0,
            num_failed: 0,
            // Nothing to wait for in an empty graph.
            done: len == 0,
        })
    }

    pub fn graph(&self) -> &ShardGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn status(&self, id: ShardId) -> Option<ShardStatus> {
        self.statuses.get(id).copied()
    }

    pub fn statuses(&self) -> &[ShardStatus] {
        &self.statuses
    }

    pub fn result(&self, id: ShardId) -> Option<&Arc<R>> {
        self.results.get(id)?.as_ref()
    }

    pub fn failure(&self, id: ShardId) -> Option<&ShardFailure> {
        self.failures.get(id)?.as_ref()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            total: self.len(),
            running: self.num_running,
            completed: self.num_completed,
            failed: self.num_failed,
        }
    }

    /// A pending shard is ready once every dependency is `Completed`. A
    /// dependency in `Error` never satisfies readiness.
    pub fn is_ready(&self, id: ShardId) -> bool {
        self.status(id) == Some(ShardStatus::Pending)
            && self
                .graph
                .dependencies_of(id)
                .iter()
                .all(|&dep| self.statuses[dep] == ShardStatus::Completed)
    }

    /// Results of `id`'s dependencies, for building its task context.
    ///
    /// Only meaningful once `id` is ready; dependencies without a result are
    /// skipped.
    pub fn dependency_results(&self, id: ShardId) -> Vec<(ShardId, Arc<R>)> {
        self.graph
            .dependencies_of(id)
            .iter()
            .filter_map(|&dep| self.results[dep].as_ref().map(|r| (dep, Arc::clone(r))))
            .collect()
    }

    /// Move every ready shard to `Running`, in ascending id order, until the
    /// concurrency cap is reached.
    pub fn launch_pass(&mut self) -> LaunchStep {
        let mut step = LaunchStep::default();

        if self.num_running >= self.max_concurrent {
            return step;
        }

        if self.num_completed + self.num_running >= self.len() {
            return step;
        }

        for id in 0..self.len() {
            if !self.is_ready(id) {
                continue;
            }

            self.statuses[id] = ShardStatus::Running;
            self.num_running += 1;
            step.launched.push(id);

            debug!(
                shard_id = id,
                running = self.num_running,
                max_concurrent = self.max_concurrent,
                "dependencies satisfied; marking Running"
            );

            if self.num_running >= self.max_concurrent {
                break;
            }
        }

        self.debug_check_counters();
        step
    }

    /// Apply the outcome reported for a running shard.
    ///
    /// On failure every pending shard that transitively depends on `id` is
    /// marked `Error` as well, so the run still reaches a state where all
    /// shards are terminal. Tokens for shards that are not `Running` are
    /// ignored.
    pub fn complete(&mut self, id: ShardId, outcome: std::result::Result<R, ShardFailure>) -> CompletionStep {
        match self.status(id) {
            Some(ShardStatus::Running) => {}
            Some(status) => {
                debug!(shard_id = id, %status, "ignoring completion for shard that is not running");
                return CompletionStep::ignored(id);
            }
            None => {
                warn!(shard_id = id, "completion for unknown shard; ignoring");
                return CompletionStep::ignored(id);
            }
        }

        self.num_running -= 1;
        let mut newly_failed = Vec::new();

        let status = match outcome {
            Ok(result) => {
                self.results[id] = Some(Arc::new(result));
                debug!(shard_id = id, "shard completed successfully");
                ShardStatus::Completed
            }
            Err(failure) => {
                warn!(
                    shard_id = id,
                    error = %failure,
                    "shard failed; failing pending dependents"
                );
                self.failures[id] = Some(failure);
                self.num_failed += 1;
                newly_failed = self.mark_dependents_failed(id);
                ShardStatus::Error
            }
        };

        self.statuses[id] = status;
        self.num_completed += 1;

        let run_just_finished = self.maybe_finish();
        self.debug_check_counters();

        CompletionStep {
            shard: id,
            status: Some(status),
            newly_failed,
            run_just_finished,
        }
    }

    /// Mark all pending transitive dependents of `failed` as `Error`.
    ///
    /// Dependents can never be `Running` here, since a running shard had all
    /// of its dependencies `Completed`.
    fn mark_dependents_failed(&mut self, failed: ShardId) -> Vec<ShardId> {
        let mut stack: Vec<ShardId> = self.graph.dependents_of(failed).to_vec();
        let mut newly_failed = Vec::new();

        while let Some(id) = stack.pop() {
            if self.statuses[id] != ShardStatus::Pending {
                continue;
            }

            debug!(
                shard_id = id,
                failed_dependency = failed,
                "marking dependent as Error due to upstream failure"
            );
            self.statuses[id] = ShardStatus::Error;
            self.failures[id] = Some(ShardFailure::DependencyFailed(failed));
            self.num_completed += 1;
            self.num_failed += 1;
            newly_failed.push(id);
            stack.extend(self.graph.dependents_of(id).iter().copied());
        }

        newly_failed.sort_unstable();
        newly_failed
    }

    fn maybe_finish(&mut self) -> bool {
        if self.done || self.num_completed != self.len() {
            return false;
        }

        self.done = true;
        info!(
            total = self.len(),
            failed = self.num_failed,
            "all shards terminal; run finished"
        );
        true
    }

    fn debug_check_counters(&self) {
        debug_assert!(self.num_running <= self.max_concurrent);
        debug_assert!(self.num_running + self.num_completed <= self.len());
    }
}
