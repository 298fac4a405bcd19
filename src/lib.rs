// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod shard;
pub mod types;

use std::io::Write;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, JobFile};
use crate::dag::{Scheduler, ShardGraph};
use crate::exec::{command_shards, CommandOutput, TokioPool};
use crate::types::{ShardFailure, ShardStatus};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - job file loading
/// - shard list construction (one shell command per shard)
/// - the scheduler, driven on a blocking thread
/// - the final per-shard report on stdout
///
/// Returns `Ok(true)` if every shard completed, `Ok(false)` if any shard
/// ended in `Error`.
pub async fn run(args: CliArgs) -> Result<bool> {
    let job = load_and_validate(&args.config)
        .with_context(|| format!("loading job file '{}'", args.config.display()))?;

    if args.dry_run {
        print_dry_run(&job)?;
        return Ok(true);
    }

    let max_concurrent = args
        .max_concurrent
        .map(|n| n as usize)
        .unwrap_or(job.config().max_concurrent_tasks);

    let handle = Handle::current();
    let shards = command_shards(&job, handle.clone());
    let pool = TokioPool::new(handle);
    let mut scheduler = Scheduler::new(shards, pool, max_concurrent)?;

    info!(
        shards = job.shards().len(),
        max_concurrent, "running shard graph"
    );

    // `execute` blocks, so keep it off the async worker threads.
    let scheduler = tokio::task::spawn_blocking(move || {
        scheduler.execute();
        scheduler
    })
    .await
    .context("scheduler thread panicked")?;

    print_report(&scheduler, &mut std::io::stdout().lock())?;

    Ok(scheduler.progress().failed == 0)
}

/// Print shards, their dependencies and one valid execution order.
fn print_dry_run(job: &JobFile) -> Result<()> {
    let deps: Vec<Vec<usize>> = job.shards().iter().map(|s| job.dependency_ids(s)).collect();
    let graph = ShardGraph::from_dependencies(&deps)?;

    let mut out = std::io::stdout().lock();
    writeln!(out, "shardsched dry-run")?;
    writeln!(
        out,
        "  config.max_concurrent_tasks = {}",
        job.config().max_concurrent_tasks
    )?;
    writeln!(out)?;

    writeln!(out, "shards ({}):", job.shards().len())?;
    for (id, shard) in job.shards().iter().enumerate() {
        writeln!(out, "  [{id}] {}", shard.name)?;
        writeln!(out, "      cmd: {}", shard.cmd)?;
        if !shard.after.is_empty() {
            writeln!(out, "      after: {:?}", shard.after)?;
        }
    }
    writeln!(out)?;

    let order: Vec<&str> = graph
        .topological_order()
        .iter()
        .map(|&id| job.shards()[id].name.as_str())
        .collect();
    writeln!(out, "execution order: {}", order.join(" -> "))?;

    debug!("dry-run complete (no execution)");
    Ok(())
}

/// Write one line per shard with its terminal status, plus a summary line.
pub fn print_report<P, W: Write>(scheduler: &Scheduler<CommandOutput, P>, out: &mut W) -> Result<()> {
    for (id, shard) in scheduler.shards().iter() {
        let status = scheduler.status(id).unwrap_or_default();
        match status {
            ShardStatus::Error => {
                let reason = match scheduler.failure(id) {
                    Some(ShardFailure::DependencyFailed(dep)) => {
                        format!("dependency '{}' failed", scheduler.shards().label_of(*dep))
                    }
                    Some(failure) => failure.to_string(),
                    None => String::new(),
                };
                writeln!(out, "{status:<9} {} ({reason})", shard.label())?;
            }
            _ => writeln!(out, "{status:<9} {}", shard.label())?,
        }
    }

    let progress = scheduler.progress();
    writeln!(
        out,
        "{}/{} shards completed, {} failed",
        progress.succeeded(),
        progress.total,
        progress.failed
    )?;
    Ok(())
}
