// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{JobFile, RawJobFile};
use crate::dag::ShardGraph;
use crate::errors::{Result, ShardschedError};
use crate::types::ShardId;

impl TryFrom<RawJobFile> for JobFile {
    type Error = ShardschedError;

    fn try_from(raw: RawJobFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_job(&raw)?;
        Ok(JobFile::new_unchecked(raw.config, raw.shard))
    }
}

fn validate_raw_job(job: &RawJobFile) -> Result<()> {
    ensure_has_shards(job)?;
    validate_global_config(job)?;
    validate_shard_names(job)?;
    validate_shard_dependencies(job)?;
    validate_dag(job)?;
    Ok(())
}

fn ensure_has_shards(job: &RawJobFile) -> Result<()> {
    if job.shard.is_empty() {
        return Err(ShardschedError::ConfigError(
            "job file must contain at least one [[shard]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(job: &RawJobFile) -> Result<()> {
    if job.config.max_concurrent_tasks == 0 {
        return Err(ShardschedError::ConfigError(
            "[config].max_concurrent_tasks must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_shard_names(job: &RawJobFile) -> Result<()> {
    let mut seen = HashSet::new();
    for (id, shard) in job.shard.iter().enumerate() {
        if shard.name.trim().is_empty() {
            return Err(ShardschedError::ConfigError(format!(
                "shard #{id} has an empty name"
            )));
        }
        if !seen.insert(shard.name.as_str()) {
            return Err(ShardschedError::ConfigError(format!(
                "duplicate shard name '{}'",
                shard.name
            )));
        }
    }
    Ok(())
}

fn validate_shard_dependencies(job: &RawJobFile) -> Result<()> {
    let names: HashSet<&str> = job.shard.iter().map(|s| s.name.as_str()).collect();

    for shard in job.shard.iter() {
        for dep in shard.after.iter() {
            if !names.contains(dep.as_str()) {
                return Err(ShardschedError::ConfigError(format!(
                    "shard '{}' has unknown dependency '{}' in `after`",
                    shard.name, dep
                )));
            }
            if dep == &shard.name {
                return Err(ShardschedError::ConfigError(format!(
                    "shard '{}' cannot depend on itself in `after`",
                    shard.name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(job: &RawJobFile) -> Result<()> {
    // Names are known to be unique and resolvable at this point.
    let deps: Vec<Vec<ShardId>> = job
        .shard
        .iter()
        .map(|shard| {
            shard
                .after
                .iter()
                .filter_map(|dep| job.shard.iter().position(|s| &s.name == dep))
                .collect()
        })
        .collect();

    ShardGraph::build(
        job.shard
            .iter()
            .map(|s| s.name.as_str())
            .zip(deps.iter().map(Vec::as_slice)),
    )?;
    Ok(())
}

/// Validate an already deserialized job file.
pub fn validate_job(raw: RawJobFile) -> Result<JobFile> {
    JobFile::try_from(raw)
}
