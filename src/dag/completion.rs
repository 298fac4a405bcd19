// src/dag/completion.rs

//! Completion tokens sent from worker threads back to the driving thread.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::shard::{ShardContext, ShardTask};
use crate::types::{ShardFailure, ShardId};

/// Which shard finished, and how.
#[derive(Debug)]
pub struct Completion<R> {
    pub shard: ShardId,
    pub outcome: Result<R, ShardFailure>,
}

/// One-shot handle a submitted job uses to report its outcome.
///
/// If the handle is dropped without reporting (the pool discarded the job,
/// or the job unwound past it) it reports [`ShardFailure::Abandoned`], so
/// the driving thread is never left waiting on a shard that will not finish.
pub struct CompletionHandle<R> {
    shard: ShardId,
    tx: Option<mpsc::UnboundedSender<Completion<R>>>,
}

impl<R> CompletionHandle<R> {
    pub(crate) fn new(shard: ShardId, tx: mpsc::UnboundedSender<Completion<R>>) -> Self {
        Self { shard, tx: Some(tx) }
    }

    pub fn finish(mut self, outcome: Result<R, ShardFailure>) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: Result<R, ShardFailure>) {
        if let Some(tx) = self.tx.take() {
            let completion = Completion {
                shard: self.shard,
                outcome,
            };
            if tx.send(completion).is_err() {
                // The scheduler is gone; nobody is waiting for this shard.
                debug!(shard_id = self.shard, "completion receiver dropped");
            }
        }
    }
}

impl<R> Drop for CompletionHandle<R> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!(shard_id = self.shard, "shard job dropped without reporting an outcome");
            self.send(Err(ShardFailure::Abandoned));
        }
    }
}

/// Body of the job submitted to the worker pool for one shard.
///
/// Runs the task outside of any scheduler state, turning `Err` and panics
/// into a failure outcome.
pub(crate) fn run_shard<R>(
    task: Arc<dyn ShardTask<R>>,
    ctx: ShardContext<R>,
    handle: CompletionHandle<R>,
) {
    debug!(shard = %ctx.label(), shard_id = ctx.id(), "shard task started");

    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| task.execute(&ctx))) {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(err)) => Err(ShardFailure::Failed(format!("{err:#}"))),
        Err(payload) => Err(ShardFailure::Panicked(panic_message(payload.as_ref()))),
    };

    debug!(
        shard = %ctx.label(),
        shard_id = ctx.id(),
        success = outcome.is_ok(),
        "shard task finished"
    );

    handle.finish(outcome);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
