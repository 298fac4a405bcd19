// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{JobFile, RawJobFile};
use crate::errors::Result;

/// Load a job file from a given path and return the raw `RawJobFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (names, dependencies, cycles). Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawJobFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_str(&contents)
}

/// Deserialize a job file from TOML text without validating it.
pub fn parse_str(contents: &str) -> Result<RawJobFile> {
    let job: RawJobFile = toml::from_str(contents)?;
    Ok(job)
}

/// Load a job file from path and validate it.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - empty or duplicate shard names,
///   - unknown or self `after` references,
///   - dependency cycles,
///   - a positive concurrency cap.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<JobFile> {
    let raw = load_from_path(&path)?;
    JobFile::try_from(raw)
}

/// Job file used when `--config` is not given: `Shards.toml` in the current
/// working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Shards.toml")
}
