// tests/scheduler_scenarios.rs

use std::time::Duration;

use shardsched::dag::Scheduler;
use shardsched::shard::{Shard, ShardContext, ShardList};
use shardsched::types::{Progress, ShardStatus};
use shardsched_test_utils::pools::{InlinePool, ThreadPerJobPool};
use shardsched_test_utils::probe::{Probe, ProbeEvent};
use shardsched_test_utils::{init_tracing, with_timeout};

const STEP: Duration = Duration::from_millis(30);

#[test]
fn independent_shards_all_launch_in_first_pass() {
    init_tracing();

    let probe = Probe::new();
    let shards = probe.graph(&[&[], &[], &[]], Duration::from_millis(150));
    let mut scheduler = Scheduler::new(shards, ThreadPerJobPool::new(), 3).unwrap();

    let scheduler = with_timeout(move || {
        scheduler.execute();
        scheduler
    });

    assert!(scheduler.is_done());
    assert_eq!(
        scheduler.statuses(),
        &[ShardStatus::Completed, ShardStatus::Completed, ShardStatus::Completed]
    );
    // All three start before any of them finishes.
    let events = probe.events();
    assert!(events[..3].iter().all(|e| matches!(e, ProbeEvent::Started(_))));
    assert_eq!(probe.max_running(), 3);
}

#[test]
fn dependent_shard_waits_for_dependency() {
    init_tracing();

    let probe = Probe::new();
    // 0 = A, 1 = B after A
    let shards = probe.graph(&[&[], &[0]], STEP);
    let mut scheduler = Scheduler::new(shards, ThreadPerJobPool::new(), 2).unwrap();

    let scheduler = with_timeout(move || {
        scheduler.execute();
        scheduler
    });

    assert_eq!(scheduler.status(0), Some(ShardStatus::Completed));
    assert_eq!(scheduler.status(1), Some(ShardStatus::Completed));
    assert!(probe.finished_before_started(0, 1));
    assert_eq!(probe.max_running(), 1);

    let state = scheduler.state();
    assert_eq!(state.graph().dependents_of(0), &[1]);
    assert_eq!(state.progress(), scheduler.progress());
}

#[test]
fn concurrency_cap_is_never_exceeded() {
    init_tracing();

    let probe = Probe::new();
    let shards = probe.graph(&[&[], &[], &[], &[], &[]], STEP);
    let pool = ThreadPerJobPool::new();
    let mut scheduler = Scheduler::new(shards, pool.clone(), 2).unwrap();

    let scheduler = with_timeout(move || {
        scheduler.execute();
        scheduler
    });

    assert!(scheduler.statuses().iter().all(|s| *s == ShardStatus::Completed));
    assert!(probe.max_running() <= 2, "max running was {}", probe.max_running());
    assert_eq!(pool.submitted(), 5);
    assert_eq!(
        scheduler.progress(),
        Progress {
            total: 5,
            running: 0,
            completed: 5,
            failed: 0
        }
    );
}

#[test]
fn diamond_joins_after_both_branches() {
    init_tracing();

    let probe = Probe::new();
    // A; B, C after A; D after B and C
    let shards = probe.graph(&[&[], &[0], &[0], &[1, 2]], STEP);
    let mut scheduler = Scheduler::new(shards, ThreadPerJobPool::new(), 4).unwrap();

    let scheduler = with_timeout(move || {
        scheduler.execute();
        scheduler
    });

    assert!(scheduler.statuses().iter().all(|s| *s == ShardStatus::Completed));
    assert!(probe.finished_before_started(0, 1));
    assert!(probe.finished_before_started(0, 2));
    assert!(probe.finished_before_started(1, 3));
    assert!(probe.finished_before_started(2, 3));

    // Each shard returns its id plus its dependencies' results:
    // A = 0, B = 1 + 0, C = 2 + 0, D = 3 + 1 + 2.
    assert_eq!(scheduler.result(0), Some(&0));
    assert_eq!(scheduler.result(1), Some(&1));
    assert_eq!(scheduler.result(2), Some(&2));
    assert_eq!(scheduler.result(3), Some(&6));
}

#[test]
fn single_slot_runs_sequentially_in_topological_order() {
    init_tracing();

    let probe = Probe::new();
    // Declared out of dependency order on purpose.
    let deps: &[&[usize]] = &[&[3], &[], &[0, 1], &[1], &[]];
    let shards = probe.graph(deps, Duration::from_millis(5));
    let mut scheduler = Scheduler::new(shards, ThreadPerJobPool::new(), 1).unwrap();

    let scheduler = with_timeout(move || {
        scheduler.execute();
        scheduler
    });

    assert!(scheduler.statuses().iter().all(|s| *s == ShardStatus::Completed));
    assert_eq!(probe.max_running(), 1);

    // Strictly alternating start/finish.
    let events = probe.events();
    for pair in events.chunks(2) {
        match pair {
            [ProbeEvent::Started(a), ProbeEvent::Finished(b)] => assert_eq!(a, b),
            other => panic!("expected start/finish pair, got {other:?}"),
        }
    }

    // Lowest ready id first: 1, then 3 (after 1), then 0 (after 3), 2, 4.
    let order = probe.start_order();
    assert_eq!(order, vec![1, 3, 0, 2, 4]);
    for (pos, &id) in order.iter().enumerate() {
        for dep in deps[id] {
            let dep_pos = order.iter().position(|x| x == dep).unwrap();
            assert!(dep_pos < pos, "shard {id} ran before its dependency {dep}");
        }
    }
}

#[test]
fn inline_pool_drains_whole_chain() {
    init_tracing();

    let probe = Probe::new();
    let shards = probe.graph(&[&[], &[0], &[1], &[2]], Duration::ZERO);
    let mut scheduler = Scheduler::new(shards, InlinePool, 2).unwrap();

    scheduler.execute();

    assert!(scheduler.is_done());
    assert_eq!(probe.start_order(), vec![0, 1, 2, 3]);
    assert_eq!(scheduler.result(3), Some(&6));
}

#[test]
fn empty_registry_returns_immediately() {
    let mut scheduler = Scheduler::new(ShardList::<usize>::new(), InlinePool, 1).unwrap();

    scheduler.execute();

    assert!(scheduler.is_done());
    assert_eq!(scheduler.progress(), Progress::default());
}

#[test]
fn queries_are_stable_after_execute() {
    init_tracing();

    let probe = Probe::new();
    let mut shards = probe.graph(&[&[], &[0]], Duration::ZERO);
    shards.push(probe.failing_shard());
    let mut scheduler = Scheduler::new(shards, InlinePool, 2).unwrap();

    scheduler.execute();

    let statuses = scheduler.statuses().to_vec();
    let results: Vec<_> = (0..3).map(|id| scheduler.result(id).copied()).collect();
    let failures: Vec<_> = (0..3).map(|id| scheduler.failure(id).cloned()).collect();
    let progress = scheduler.progress();

    for _ in 0..3 {
        assert_eq!(scheduler.statuses(), statuses.as_slice());
        let again: Vec<_> = (0..3).map(|id| scheduler.result(id).copied()).collect();
        assert_eq!(again, results);
        let again: Vec<_> = (0..3).map(|id| scheduler.failure(id).cloned()).collect();
        assert_eq!(again, failures);
        assert_eq!(scheduler.progress(), progress);
    }
}

#[test]
fn task_sees_dependency_results_by_id() {
    init_tracing();

    let mut shards = ShardList::new();
    let words = shards.push(
        Shard::from_fn(|_ctx: &ShardContext<String>| Ok("hello world".to_string()))
            .with_label("words"),
    );
    let count = shards.push(
        Shard::from_fn(move |ctx: &ShardContext<String>| {
            let text = ctx
                .dependency_result(words)
                .ok_or_else(|| anyhow::anyhow!("missing words"))?;
            Ok(text.split_whitespace().count().to_string())
        })
        .with_label("count")
        .after(words),
    );

    let mut scheduler = Scheduler::new(shards, ThreadPerJobPool::new(), 2).unwrap();
    let scheduler = with_timeout(move || {
        scheduler.execute();
        scheduler
    });

    assert_eq!(scheduler.result(count).map(String::as_str), Some("2"));
    assert_eq!(scheduler.shards().label_of(count), "count");
}
