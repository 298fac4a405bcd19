use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use shardsched::errors::{Result, ShardschedError};
use shardsched::exec::{Job, WorkerPool};

/// Runs every job synchronously inside `submit`, on the driving thread.
///
/// Deterministic: shards finish in exactly the order they were launched.
#[derive(Debug, Default, Clone)]
pub struct InlinePool;

impl WorkerPool for InlinePool {
    fn submit(&self, job: Job) -> Result<()> {
        job();
        Ok(())
    }
}

/// Spawns a fresh OS thread per job.
///
/// Has no parallelism limit of its own, so any bound observed by a test is
/// the scheduler's.
#[derive(Debug, Default, Clone)]
pub struct ThreadPerJobPool {
    submitted: Arc<AtomicUsize>,
}

impl ThreadPerJobPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::SeqCst)
    }
}

impl WorkerPool for ThreadPerJobPool {
    fn submit(&self, job: Job) -> Result<()> {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        std::thread::Builder::new()
            .name("shard-worker".to_string())
            .spawn(job)
            .map_err(ShardschedError::IoError)?;
        Ok(())
    }
}

/// Rejects every job.
#[derive(Debug, Default, Clone)]
pub struct RejectingPool;

impl WorkerPool for RejectingPool {
    fn submit(&self, _job: Job) -> Result<()> {
        Err(ShardschedError::Other(anyhow::anyhow!("pool is shut down")))
    }
}

/// Accepts jobs and silently drops them without running.
#[derive(Debug, Default, Clone)]
pub struct DroppingPool {
    dropped: Arc<Mutex<usize>>,
}

impl DroppingPool {
    pub fn dropped(&self) -> usize {
        *self.dropped.lock().unwrap()
    }
}

impl WorkerPool for DroppingPool {
    fn submit(&self, job: Job) -> Result<()> {
        drop(job);
        *self.dropped.lock().unwrap() += 1;
        Ok(())
    }
}
