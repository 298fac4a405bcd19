// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! These cover setup-time failures only (loading a job file, building a
//! scheduler). Per-shard failures never surface here; they end up in the
//! shard's status and failure slot instead.

use thiserror::Error;

use crate::types::ShardId;

#[derive(Error, Debug)]
pub enum ShardschedError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid concurrency limit: max_concurrent must be >= 1 (got {0})")]
    InvalidConcurrency(usize),

    #[error("Shard {shard} depends on unknown shard id {dependency}")]
    UnknownDependency { shard: ShardId, dependency: ShardId },

    #[error("Cycle detected in shard graph: {0}")]
    DependencyCycle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ShardschedError>;
