// src/exec/mod.rs

//! Execution layer.
//!
//! - [`pool`] provides the `WorkerPool` trait the scheduler submits jobs to,
//!   and `TokioPool`, the implementation used in production.
//! - [`command`] turns shell commands from a job file into shard tasks.

pub mod command;
pub mod pool;

pub use command::{command_shards, CommandOutput, CommandTask};
pub use pool::{Job, TokioPool, WorkerPool};
