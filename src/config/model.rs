// src/config/model.rs

use std::collections::HashMap;

use serde::Deserialize;

use crate::dag::DEFAULT_MAX_CONCURRENT_TASKS;
use crate::types::ShardId;

/// Job file exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [config]
/// max_concurrent_tasks = 4
///
/// [[shard]]
/// name = "map-0"
/// cmd = "echo map-0"
///
/// [[shard]]
/// name = "reduce"
/// cmd = "echo reduce"
/// after = ["map-0"]
/// ```
///
/// Shards are an array of tables so that declaration order is kept; a
/// shard's position becomes its id.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawJobFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All shards from `[[shard]]`.
    #[serde(default)]
    pub shard: Vec<ShardConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Upper bound on shards running at the same time.
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
}

fn default_max_concurrent_tasks() -> usize {
    DEFAULT_MAX_CONCURRENT_TASKS
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: default_max_concurrent_tasks(),
        }
    }
}

/// One `[[shard]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShardConfig {
    /// Unique shard name, used in `after` lists, logs and the report.
    pub name: String,

    /// The command to execute.
    pub cmd: String,

    /// Names of shards that must complete before this one starts.
    #[serde(default)]
    pub after: Vec<String>,
}

/// A job file that passed validation (see `config::validate`).
///
/// Names are unique, every `after` entry refers to a declared shard, the
/// concurrency cap is positive and the dependency graph is acyclic.
#[derive(Debug, Clone)]
pub struct JobFile {
    config: ConfigSection,
    shards: Vec<ShardConfig>,
    ids: HashMap<String, ShardId>,
}

impl JobFile {
    pub(crate) fn new_unchecked(config: ConfigSection, shards: Vec<ShardConfig>) -> Self {
        let ids = shards
            .iter()
            .enumerate()
            .map(|(id, s)| (s.name.clone(), id))
            .collect();
        Self {
            config,
            shards,
            ids,
        }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn shards(&self) -> &[ShardConfig] {
        &self.shards
    }

    pub fn id_of(&self, name: &str) -> Option<ShardId> {
        self.ids.get(name).copied()
    }

    /// Resolve a shard's `after` names to ids.
    pub fn dependency_ids(&self, shard: &ShardConfig) -> Vec<ShardId> {
        shard
            .after
            .iter()
            .filter_map(|name| self.id_of(name))
            .collect()
    }
}
