// src/exec/pool.rs

//! Pluggable worker pool abstraction.
//!
//! The scheduler hands each launched shard to a `WorkerPool` as a boxed
//! closure and never looks at how or where it runs.
//!
//! - `TokioPool` is the default implementation used by `shardsched`. It runs
//!   jobs on the Tokio blocking thread pool of a runtime handle.
//! - Tests can provide their own `WorkerPool` (inline, thread-per-job,
//!   refusing, ...) without touching the scheduler.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::trace;

use crate::errors::{Result, ShardschedError};

/// A unit of work submitted to a pool.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Trait abstracting how shard jobs are executed.
///
/// Implementations must eventually run or drop every accepted job. The pool
/// does not need to limit its own parallelism; the scheduler never has more
/// than its configured cap of jobs outstanding.
pub trait WorkerPool: Send + Sync {
    /// Queue `job` for asynchronous execution.
    ///
    /// Returning `Err` marks the shard as failed instead of running it.
    fn submit(&self, job: Job) -> Result<()>;
}

impl<P: WorkerPool + ?Sized> WorkerPool for Arc<P> {
    fn submit(&self, job: Job) -> Result<()> {
        (**self).submit(job)
    }
}

impl<P: WorkerPool + ?Sized> WorkerPool for Box<P> {
    fn submit(&self, job: Job) -> Result<()> {
        (**self).submit(job)
    }
}

/// Worker pool backed by Tokio's blocking thread pool.
#[derive(Debug, Clone)]
pub struct TokioPool {
    handle: Handle,
}

impl TokioPool {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime of the calling context.
    pub fn current() -> Result<Self> {
        let handle = Handle::try_current().map_err(|e| {
            ShardschedError::ConfigError(format!("no Tokio runtime available for worker pool: {e}"))
        })?;
        Ok(Self::new(handle))
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}

impl WorkerPool for TokioPool {
    fn submit(&self, job: Job) -> Result<()> {
        trace!("submitting job to tokio blocking pool");
        // The join handle is not needed: the job reports back through its
        // completion handle, even when the runtime drops it unrun.
        let _ = self.handle.spawn_blocking(job);
        Ok(())
    }
}
