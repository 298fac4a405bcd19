// tests/failure_propagation.rs

//! A failed shard fails everything that (transitively) depends on it, so
//! `execute` still returns once the rest of the graph is done.

use std::time::Duration;

use shardsched::dag::Scheduler;
use shardsched::shard::ShardList;
use shardsched::types::{ShardFailure, ShardStatus};
use shardsched_test_utils::pools::{DroppingPool, InlinePool, RejectingPool, ThreadPerJobPool};
use shardsched_test_utils::probe::Probe;
use shardsched_test_utils::{init_tracing, with_timeout};

#[test]
fn failed_dependency_fails_dependent_and_execute_returns() {
    init_tracing();

    let probe = Probe::new();
    let mut shards = ShardList::new();
    let a = shards.push(probe.failing_shard());
    let b = shards.push(probe.shard(Duration::ZERO).after(a));

    let mut scheduler = Scheduler::new(shards, ThreadPerJobPool::new(), 2).unwrap();
    let scheduler = with_timeout(move || {
        scheduler.execute();
        scheduler
    });

    assert!(scheduler.is_done());
    assert_eq!(scheduler.status(a), Some(ShardStatus::Error));
    assert!(matches!(scheduler.failure(a), Some(ShardFailure::Failed(msg)) if msg.contains("on purpose")));

    assert_eq!(scheduler.status(b), Some(ShardStatus::Error));
    assert_eq!(scheduler.failure(b), Some(&ShardFailure::DependencyFailed(a)));
    assert!(!probe.started(b), "dependent of a failed shard must never run");
    assert_eq!(scheduler.result(b), None);
}

#[test]
fn failure_does_not_affect_independent_branches() {
    init_tracing();

    let probe = Probe::new();
    let mut shards = ShardList::new();
    // 0 fails; 1 after 0; 2 after 1; 3 independent; 4 after 3.
    let root = shards.push(probe.failing_shard());
    let child = shards.push(probe.shard(Duration::ZERO).after(root));
    let grandchild = shards.push(probe.shard(Duration::ZERO).after(child));
    let other = shards.push(probe.shard(Duration::from_millis(20)));
    let other_child = shards.push(probe.shard(Duration::ZERO).after(other));

    let mut scheduler = Scheduler::new(shards, ThreadPerJobPool::new(), 2).unwrap();
    let scheduler = with_timeout(move || {
        scheduler.execute();
        scheduler
    });

    assert_eq!(scheduler.status(root), Some(ShardStatus::Error));
    assert_eq!(scheduler.status(child), Some(ShardStatus::Error));
    assert_eq!(scheduler.status(grandchild), Some(ShardStatus::Error));
    // Transitive dependents name the shard that actually failed.
    assert_eq!(
        scheduler.failure(grandchild),
        Some(&ShardFailure::DependencyFailed(root))
    );

    assert_eq!(scheduler.status(other), Some(ShardStatus::Completed));
    assert_eq!(scheduler.status(other_child), Some(ShardStatus::Completed));

    let progress = scheduler.progress();
    assert_eq!(progress.completed, 5);
    assert_eq!(progress.failed, 3);
    assert_eq!(progress.succeeded(), 2);
}

#[test]
fn diamond_with_one_failed_branch_skips_join() {
    init_tracing();

    let probe = Probe::new();
    let mut shards = ShardList::new();
    let a = shards.push(probe.shard(Duration::ZERO));
    let b = shards.push(probe.failing_shard().after(a));
    let c = shards.push(probe.shard(Duration::from_millis(20)).after(a));
    let d = shards.push(probe.shard(Duration::ZERO).with_dependencies([b, c]));

    let mut scheduler = Scheduler::new(shards, ThreadPerJobPool::new(), 4).unwrap();
    let scheduler = with_timeout(move || {
        scheduler.execute();
        scheduler
    });

    assert_eq!(scheduler.status(a), Some(ShardStatus::Completed));
    assert_eq!(scheduler.status(b), Some(ShardStatus::Error));
    assert_eq!(scheduler.status(c), Some(ShardStatus::Completed));
    assert_eq!(scheduler.status(d), Some(ShardStatus::Error));
    assert!(!probe.started(d));
}

#[test]
fn panicking_task_is_reported_as_error() {
    init_tracing();

    let probe = Probe::new();
    let mut shards = ShardList::new();
    let a = shards.push(probe.panicking_shard());
    let b = shards.push(probe.shard(Duration::ZERO));

    let mut scheduler = Scheduler::new(shards, ThreadPerJobPool::new(), 2).unwrap();
    let scheduler = with_timeout(move || {
        scheduler.execute();
        scheduler
    });

    assert_eq!(scheduler.status(a), Some(ShardStatus::Error));
    assert!(matches!(scheduler.failure(a), Some(ShardFailure::Panicked(msg)) if msg.contains("panicked on purpose")));
    assert_eq!(scheduler.status(b), Some(ShardStatus::Completed));
}

#[test]
fn rejected_submission_marks_shard_failed() {
    init_tracing();

    let probe = Probe::new();
    let mut shards = ShardList::new();
    let a = shards.push(probe.shard(Duration::ZERO));
    let b = shards.push(probe.shard(Duration::ZERO).after(a));

    let mut scheduler = Scheduler::new(shards, RejectingPool, 1).unwrap();
    scheduler.execute();

    assert!(matches!(scheduler.failure(a), Some(ShardFailure::SubmitFailed(msg)) if msg.contains("shut down")));
    assert_eq!(scheduler.failure(b), Some(&ShardFailure::DependencyFailed(a)));
    assert!(probe.events().is_empty());
}

#[test]
fn dropped_jobs_are_reported_as_abandoned() {
    init_tracing();

    let probe = Probe::new();
    let shards = probe.graph(&[&[], &[]], Duration::ZERO);
    let pool = DroppingPool::default();

    let mut scheduler = Scheduler::new(shards, pool.clone(), 2).unwrap();
    let scheduler = with_timeout(move || {
        scheduler.execute();
        scheduler
    });

    assert_eq!(pool.dropped(), 2);
    assert_eq!(scheduler.failure(0), Some(&ShardFailure::Abandoned));
    assert_eq!(scheduler.failure(1), Some(&ShardFailure::Abandoned));
}

#[test]
fn failure_only_counts_once_per_shard() {
    init_tracing();

    let probe = Probe::new();
    let mut shards = ShardList::new();
    // Two failing roots share one dependent.
    let a = shards.push(probe.failing_shard());
    let b = shards.push(probe.failing_shard());
    let _join = shards.push(probe.shard(Duration::ZERO).with_dependencies([a, b]));

    let mut scheduler = Scheduler::new(shards, InlinePool, 2).unwrap();
    scheduler.execute();

    let progress = scheduler.progress();
    assert_eq!(progress.total, 3);
    assert_eq!(progress.completed, 3);
    assert_eq!(progress.failed, 3);
    // The first root to fail is the one recorded on the join.
    assert_eq!(scheduler.failure(2), Some(&ShardFailure::DependencyFailed(a)));
}
