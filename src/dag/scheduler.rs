// src/dag/scheduler.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::completion::{run_shard, Completion, CompletionHandle};
use crate::dag::graph::ShardGraph;
use crate::dag::state_manager::SchedulerState;
use crate::errors::Result;
use crate::exec::{Job, WorkerPool};
use crate::shard::{ShardContext, ShardList};
use crate::types::{Progress, ShardFailure, ShardId, ShardStatus};

/// Default concurrency cap used by job files that do not set one.
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 8;

/// Runs a shard graph on a worker pool with at most `max_concurrent` shards
/// in flight, and blocks until every shard is terminal.
///
/// The scheduler owns all per-shard state on the driving thread. Worker
/// threads only ever see their own task, a [`ShardContext`] and a
/// [`CompletionHandle`]; outcomes come back as [`Completion`] tokens over an
/// unbounded channel.
///
/// Per-shard outcomes are not returned from [`execute`](Self::execute);
/// inspect [`status`](Self::status), [`result`](Self::result) and
/// [`failure`](Self::failure) afterwards.
pub struct Scheduler<R, P> {
    shards: ShardList<R>,
    state: SchedulerState<R>,
    pool: P,
    completion_tx: mpsc::UnboundedSender<Completion<R>>,
    completion_rx: mpsc::UnboundedReceiver<Completion<R>>,
}

impl<R, P> fmt::Debug for Scheduler<R, P>
where
    R: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("shards", &self.shards)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<R, P> Scheduler<R, P>
where
    R: Send + Sync + 'static,
    P: WorkerPool,
{
    /// Validate the shard graph and set every shard to `Pending`.
    ///
    /// Fails if `max_concurrent` is zero, a dependency id is out of range, or
    /// the dependencies contain a cycle.
    pub fn new(shards: ShardList<R>, pool: P, max_concurrent: usize) -> Result<Self> {
        let graph = ShardGraph::build(shards.iter().map(|(_, s)| (s.label(), s.dependencies())))?;
        let state = SchedulerState::new(graph, max_concurrent)?;
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        Ok(Self {
            shards,
            state,
            pool,
            completion_tx,
            completion_rx,
        })
    }

    /// Run the whole graph, returning once every shard is `Completed` or
    /// `Error`.
    ///
    /// Task failures never escape this call. Shards behind a failed
    /// dependency are marked `Error` without running.
    ///
    /// # Panics
    ///
    /// Blocks the current thread, so it panics if called from within an
    /// asynchronous execution context. Use `tokio::task::spawn_blocking` to
    /// drive it from async code.
    pub fn execute(&mut self) {
        info!(
            shards = self.state.len(),
            max_concurrent = self.state.max_concurrent(),
            "starting shard execution"
        );

        loop {
            let progress = self.state.progress();
            debug!(
                completed = progress.completed,
                total = progress.total,
                running = progress.running,
                "running job"
            );

            if self.state.is_done() {
                break;
            }

            if self.launch_ready() > 0 {
                continue;
            }

            // Nothing launchable right now; wait for a worker to report.
            // `self` holds a sender, so the channel cannot close here.
            let Some(completion) = self.completion_rx.blocking_recv() else {
                unreachable!("scheduler keeps its own completion sender alive");
            };
            self.apply(completion);

            while let Ok(completion) = self.completion_rx.try_recv() {
                self.apply(completion);
            }
        }

        let progress = self.state.progress();
        info!(
            total = progress.total,
            succeeded = progress.succeeded(),
            failed = progress.failed,
            "shard execution finished"
        );
    }

    /// One launch pass: mark ready shards `Running` and submit them.
    fn launch_ready(&mut self) -> usize {
        let step = self.state.launch_pass();
        for &id in &step.launched {
            self.submit(id);
        }
        step.len()
    }

    fn submit(&mut self, id: ShardId) {
        let Some(shard) = self.shards.get(id) else {
            warn!(shard_id = id, "launched shard missing from registry");
            self.state.complete(id, Err(ShardFailure::Abandoned));
            return;
        };

        let task = Arc::clone(shard.task());
        let ctx = ShardContext::new(id, shard.label(), self.state.dependency_results(id));
        let handle = CompletionHandle::new(id, self.completion_tx.clone());

        info!(shard = %shard.label(), shard_id = id, "submitting shard to worker pool");

        let job: Job = Box::new(move || run_shard(task, ctx, handle));
        if let Err(err) = self.pool.submit(job) {
            warn!(
                shard = %self.shards.label_of(id),
                shard_id = id,
                error = %err,
                "worker pool rejected shard"
            );
            // The rejected job's handle also reports `Abandoned`. That token
            // is only processed after this failure is applied, so it is ignored.
            self.apply(Completion {
                shard: id,
                outcome: Err(ShardFailure::SubmitFailed(err.to_string())),
            });
        }
    }

    fn apply(&mut self, completion: Completion<R>) {
        let Completion { shard, outcome } = completion;
        let step = self.state.complete(shard, outcome);

        match step.status {
            Some(ShardStatus::Completed) => {
                info!(shard = %self.shards.label_of(shard), shard_id = shard, "shard completed");
            }
            Some(ShardStatus::Error) => {
                let reason = self
                    .state
                    .failure(shard)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                warn!(
                    shard = %self.shards.label_of(shard),
                    shard_id = shard,
                    error = %reason,
                    "shard failed"
                );
                for &dependent in &step.newly_failed {
                    warn!(
                        shard = %self.shards.label_of(dependent),
                        shard_id = dependent,
                        failed_dependency = shard,
                        "skipping shard because a dependency failed"
                    );
                }
            }
            _ => {}
        }
    }
}

impl<R, P> Scheduler<R, P> {
    pub fn shards(&self) -> &ShardList<R> {
        &self.shards
    }

    pub fn state(&self) -> &SchedulerState<R> {
        &self.state
    }

    pub fn max_concurrent(&self) -> usize {
        self.state.max_concurrent()
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    pub fn status(&self, id: ShardId) -> Option<ShardStatus> {
        self.state.status(id)
    }

    pub fn statuses(&self) -> &[ShardStatus] {
        self.state.statuses()
    }

    /// Result of a `Completed` shard.
    pub fn result(&self, id: ShardId) -> Option<&R> {
        self.state.result(id).map(Arc::as_ref)
    }

    /// Failure detail of a shard in `Error`.
    pub fn failure(&self, id: ShardId) -> Option<&ShardFailure> {
        self.state.failure(id)
    }

    pub fn progress(&self) -> Progress {
        self.state.progress()
    }
}
