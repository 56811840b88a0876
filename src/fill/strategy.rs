//! The two ways of eating disk space, tried in order.

use crate::channel::{Channel, CommandOutput};
use crate::error::{FillError, Result};
use crate::models::outcome::{FillOutcome, DISK_FULL_MESSAGE};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `fallocate -l <n>M`: instant on ext4, xfs, btrfs and ocfs2.
    Fallocate,
    /// `dd if=/dev/zero` launched in the background.
    Dd,
}

impl Strategy {
    pub fn program(&self) -> &'static str {
        match self {
            Strategy::Fallocate => "fallocate",
            Strategy::Dd        => "dd",
        }
    }
}

/// What to do after one strategy has been tried.
#[derive(Debug)]
pub enum Verdict {
    Done(FillOutcome),
    /// Failed in a way the next strategy may get around.
    Next(FillError),
    Fatal(FillError),
}

/// Runs the strategies in order against the artifact file.
pub struct Executor<'a, C: Channel + ?Sized> {
    channel:       &'a C,
    use_fallocate: bool,
}

impl<'a, C: Channel + ?Sized> Executor<'a, C> {
    pub fn new(channel: &'a C, use_fallocate: bool) -> Self {
        Self { channel, use_fallocate }
    }

    /// Fixed order: fallocate (if enabled), then dd.
    pub fn strategies(&self) -> Vec<Strategy> {
        let mut v = Vec::with_capacity(2);
        if self.use_fallocate { v.push(Strategy::Fallocate); }
        v.push(Strategy::Dd);
        v
    }

    pub fn fill(&self, size_mb: u64, artifact: &Path) -> Result<FillOutcome> {
        let mut last = None;
        for strategy in self.strategies() {
            match self.attempt(strategy, size_mb, artifact) {
                Verdict::Done(outcome) => {
                    info!(strategy = strategy.program(), size_mb, %outcome, "fill started");
                    return Ok(outcome);
                }
                Verdict::Next(e) => {
                    warn!(strategy = strategy.program(), "{}", e);
                    last = Some(e);
                }
                Verdict::Fatal(e) => return Err(e),
            }
        }
        Err(last.unwrap_or_else(|| FillError::ToolUnavailable("dd".into())))
    }

    fn attempt(&self, strategy: Strategy, size_mb: u64, artifact: &Path) -> Verdict {
        match strategy {
            Strategy::Fallocate => self.fallocate(size_mb, artifact),
            Strategy::Dd        => match self.dd(size_mb, artifact) {
                Ok(outcome) => Verdict::Done(outcome),
                Err(e)      => Verdict::Fatal(e),
            },
        }
    }

    fn fallocate(&self, size_mb: u64, artifact: &Path) -> Verdict {
        if !self.channel.is_command_available("fallocate") {
            return Verdict::Next(FillError::ToolUnavailable("fallocate".into()));
        }
        let args = vec![
            "-l".to_string(),
            format!("{}M", size_mb),
            artifact.display().to_string(),
        ];
        match self.channel.run("fallocate", &args) {
            Ok(out) => classify_fallocate(&out, size_mb),
            Err(e)  => Verdict::Next(e),
        }
    }

    /// A one-byte write first, so a broken write path fails here and not in
    /// the background. Then the full write is launched and left running.
    fn dd(&self, size_mb: u64, artifact: &Path) -> Result<FillOutcome> {
        let of = format!("of={}", artifact.display());

        let trial = ["if=/dev/zero", of.as_str(), "bs=1", "count=1"].map(String::from);
        let out = self.channel.run("dd", &trial)?;
        if !out.success {
            return Err(FillError::command_failed("dd", out.stderr));
        }

        let full = vec![
            "if=/dev/zero".to_string(),
            of,
            "bs=1M".to_string(),
            format!("count={}", size_mb),
            "iflag=fullblock".to_string(),
        ];
        self.channel.spawn_detached("dd", &full, None)?;
        Ok(FillOutcome::Streaming { size_mb })
    }
}

/// Running out of space while preallocating means the disk is full, which
/// is the point; every other failure falls through to dd.
pub fn classify_fallocate(out: &CommandOutput, size_mb: u64) -> Verdict {
    if out.success {
        Verdict::Done(FillOutcome::Preallocated { size_mb })
    } else if out.stderr.contains(DISK_FULL_MESSAGE) {
        Verdict::Done(FillOutcome::DiskFull)
    } else {
        Verdict::Next(FillError::command_failed("fallocate", out.stderr.clone()))
    }
}
