use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shardsched::shard::{Shard, ShardContext, ShardList};
use shardsched::types::ShardId;

/// Something a probed task did, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeEvent {
    Started(ShardId),
    Finished(ShardId),
}

#[derive(Debug, Default)]
struct ProbeInner {
    events: Mutex<Vec<ProbeEvent>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

/// Shared recorder for task start/finish events and observed concurrency.
///
/// Tasks built by a probe return their own shard id plus the sum of their
/// dependencies' results, so tests can also check result propagation.
#[derive(Debug, Default, Clone)]
pub struct Probe {
    inner: Arc<ProbeInner>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    /// A shard that sleeps for `delay` and succeeds.
    pub fn shard(&self, delay: Duration) -> Shard<usize> {
        let probe = self.clone();
        Shard::from_fn(move |ctx: &ShardContext<usize>| {
            probe.enter(ctx.id());
            std::thread::sleep(delay);
            let value = ctx.id() + ctx.dependency_results().map(|(_, r)| *r).sum::<usize>();
            probe.exit(ctx.id());
            Ok(value)
        })
    }

    /// A shard that records its start and then returns an error.
    pub fn failing_shard(&self) -> Shard<usize> {
        let probe = self.clone();
        Shard::from_fn(move |ctx: &ShardContext<usize>| {
            probe.enter(ctx.id());
            probe.exit(ctx.id());
            anyhow::bail!("shard {} failed on purpose", ctx.id())
        })
    }

    /// A shard that records its start and then panics.
    pub fn panicking_shard(&self) -> Shard<usize> {
        let probe = self.clone();
        Shard::from_fn(move |ctx: &ShardContext<usize>| {
            probe.enter(ctx.id());
            probe.exit(ctx.id());
            panic!("shard {} panicked on purpose", ctx.id())
        })
    }

    /// Build a list of succeeding shards from dependency lists.
    pub fn graph(&self, deps: &[&[ShardId]], delay: Duration) -> ShardList<usize> {
        deps.iter()
            .map(|d| self.shard(delay).with_dependencies(d.iter().copied()))
            .collect()
    }

    pub fn events(&self) -> Vec<ProbeEvent> {
        self.inner.events.lock().unwrap().clone()
    }

    /// Shard ids in the order their tasks started.
    pub fn start_order(&self) -> Vec<ShardId> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProbeEvent::Started(id) => Some(id),
                ProbeEvent::Finished(_) => None,
            })
            .collect()
    }

    pub fn position(&self, event: ProbeEvent) -> Option<usize> {
        self.events().iter().position(|e| *e == event)
    }

    /// Whether `first` finished before `second` started.
    pub fn finished_before_started(&self, first: ShardId, second: ShardId) -> bool {
        match (
            self.position(ProbeEvent::Finished(first)),
            self.position(ProbeEvent::Started(second)),
        ) {
            (Some(f), Some(s)) => f < s,
            _ => false,
        }
    }

    pub fn started(&self, id: ShardId) -> bool {
        self.position(ProbeEvent::Started(id)).is_some()
    }

    /// Highest number of probed tasks that were executing at the same time.
    pub fn max_running(&self) -> usize {
        self.inner.max_running.load(Ordering::SeqCst)
    }

    fn enter(&self, id: ShardId) {
        let mut events = self.inner.events.lock().unwrap();
        events.push(ProbeEvent::Started(id));
        let now = self.inner.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.max_running.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self, id: ShardId) {
        let mut events = self.inner.events.lock().unwrap();
        self.inner.running.fetch_sub(1, Ordering::SeqCst);
        events.push(ProbeEvent::Finished(id));
    }
}
