#![allow(dead_code)]

use shardsched::config::{ConfigSection, JobFile, RawJobFile, ShardConfig};
use shardsched::errors::Result;

/// Builder for `JobFile` to simplify test setup.
pub struct JobFileBuilder {
    job: RawJobFile,
}

impl JobFileBuilder {
    pub fn new() -> Self {
        Self {
            job: RawJobFile {
                config: ConfigSection::default(),
                shard: Vec::new(),
            },
        }
    }

    pub fn with_shard(mut self, shard: ShardConfig) -> Self {
        self.job.shard.push(shard);
        self
    }

    pub fn max_concurrent_tasks(mut self, n: usize) -> Self {
        self.job.config.max_concurrent_tasks = n;
        self
    }

    pub fn raw(self) -> RawJobFile {
        self.job
    }

    pub fn try_build(self) -> Result<JobFile> {
        JobFile::try_from(self.job)
    }

    pub fn build(self) -> JobFile {
        self.try_build()
            .expect("Failed to build valid job file from builder")
    }
}

impl Default for JobFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ShardConfig`.
pub struct ShardConfigBuilder {
    shard: ShardConfig,
}

impl ShardConfigBuilder {
    pub fn new(name: &str, cmd: &str) -> Self {
        Self {
            shard: ShardConfig {
                name: name.to_string(),
                cmd: cmd.to_string(),
                after: vec![],
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.shard.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> ShardConfig {
        self.shard
    }
}
