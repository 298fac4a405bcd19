// src/exec/command.rs

//! Shell commands as shard tasks.

use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::config::JobFile;
use crate::shard::{Shard, ShardContext, ShardList, ShardTask};

/// What a successful command shard produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
}

/// Runs `cmd` through the platform shell. A non-zero exit fails the shard.
///
/// The task is executed on a worker thread, so it drives the process with
/// `Handle::block_on` on the runtime it was created for.
#[derive(Debug, Clone)]
pub struct CommandTask {
    cmd: String,
    handle: Handle,
}

impl CommandTask {
    pub fn new(cmd: impl Into<String>, handle: Handle) -> Self {
        Self {
            cmd: cmd.into(),
            handle,
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }
}

impl ShardTask<CommandOutput> for CommandTask {
    fn execute(&self, ctx: &ShardContext<CommandOutput>) -> Result<CommandOutput> {
        self.handle.block_on(run_command(&self.cmd, ctx))
    }
}

/// Build the shard list for a validated job file: one [`CommandTask`] per
/// `[[shard]]`, ids in declaration order.
pub fn command_shards(job: &JobFile, handle: Handle) -> ShardList<CommandOutput> {
    job.shards()
        .iter()
        .map(|sc| {
            Shard::new(CommandTask::new(sc.cmd.clone(), handle.clone()))
                .with_label(sc.name.clone())
                .with_dependencies(job.dependency_ids(sc))
        })
        .collect()
}

async fn run_command(cmd_line: &str, ctx: &ShardContext<CommandOutput>) -> Result<CommandOutput> {
    info!(
        shard = %ctx.label(),
        shard_id = ctx.id(),
        cmd = %cmd_line,
        "starting shard process"
    );

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd_line);
        c
    };

    cmd.env("SHARDSCHED_SHARD", ctx.label())
        .env("SHARDSCHED_SHARD_ID", ctx.id().to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for shard '{}'", ctx.label()))?;

    // Always consume stderr so buffers don't fill; log at debug.
    if let Some(stderr) = child.stderr.take() {
        let label = ctx.label().to_string();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(shard = %label, "stderr: {}", line);
            }
        });
    }

    let mut stdout = String::new();
    if let Some(mut out) = child.stdout.take() {
        out.read_to_string(&mut stdout)
            .await
            .with_context(|| format!("reading stdout of shard '{}'", ctx.label()))?;
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of shard '{}'", ctx.label()))?;
    let exit_code = status.code().unwrap_or(-1);

    info!(
        shard = %ctx.label(),
        shard_id = ctx.id(),
        exit_code,
        success = status.success(),
        "shard process exited"
    );

    if !status.success() {
        bail!("command `{cmd_line}` exited with code {exit_code}");
    }

    Ok(CommandOutput { exit_code, stdout })
}
