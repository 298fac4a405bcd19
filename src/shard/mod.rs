// src/shard/mod.rs

//! Work item registry.
//!
//! - [`registry`] holds [`Shard`] descriptors and the ordered [`ShardList`].
//! - [`task`] defines the [`ShardTask`] trait and the [`ShardContext`] a task
//!   receives when it runs.

pub mod registry;
pub mod task;

pub use registry::{Shard, ShardList};
pub use task::{ShardContext, ShardTask};
