// src/dag/mod.rs

//! Shard graph validation and scheduling.
//!
//! - [`graph`] validates dependency ids and acyclicity and keeps adjacency.
//! - [`state_manager`] contains the synchronous state machine that decides
//!   which shards launch and applies their outcomes.
//! - [`scheduler_step`] defines the result types for single steps.
//! - [`completion`] holds the completion tokens workers send back.
//! - [`scheduler`] is the blocking driver around the state machine.

pub mod completion;
pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;

pub use completion::{Completion, CompletionHandle};
pub use graph::ShardGraph;
pub use scheduler::{Scheduler, DEFAULT_MAX_CONCURRENT_TASKS};
pub use scheduler_step::{CompletionStep, LaunchStep};
pub use state_manager::SchedulerState;
