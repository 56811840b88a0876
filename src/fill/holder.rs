//! The optional background process that keeps the artifact open, and the
//! name-based lookup that finds it (and any dd filler) again on stop.
//!
//! Nothing is remembered between start and stop. Processes are found by
//! scanning command lines, so renaming the artifact breaks discovery and a
//! process can exit between lookup and kill.

use crate::channel::Channel;
use crate::error::{FillError, Result};
use crate::models::request::{artifact_path, ARTIFACT_NAME};
use std::convert::Infallible;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info, warn};

/// Flag that marks a command line as a holder process.
pub const RETAIN_MARKER: &str = "retain-nohup";

/// Arguments that make a fresh copy of this program hold the artifact open.
pub fn holder_args(directory: &Path) -> Vec<String> {
    vec![
        "--start".to_string(),
        "--retain-handle".to_string(),
        format!("--{}", RETAIN_MARKER),
        "--directory".to_string(),
        directory.display().to_string(),
    ]
}

/// Launch `program` as a detached holder for `directory` and return at once.
pub fn retain<C: Channel + ?Sized>(channel: &C, program: &Path, directory: &Path, log: Option<&Path>) -> Result<()> {
    let program = program.display().to_string();
    channel.spawn_detached(&program, &holder_args(directory), log)?;
    info!(directory = %directory.display(), "retain process started");
    Ok(())
}

/// Body of the holder process: open the artifact and never return.
/// The handle is released only when the process is killed.
pub fn hold(directory: &Path) -> Result<Infallible> {
    let path = artifact_path(directory);
    let _file = File::open(&path).map_err(|source| FillError::ArtifactUnreadable { path: path.clone(), source })?;
    info!(path = %path.display(), "holding file handle");
    loop {
        std::thread::park();
    }
}

/// Kill every dd/fallocate filler, then every holder scoped to `program_name`.
/// Finding nothing is fine. Holders are still killed when a filler kill
/// fails; the first failure is returned.
pub fn release<C: Channel + ?Sized>(channel: &C, program_name: &str) -> Result<()> {
    let fillers = channel.find_processes(ARTIFACT_NAME, None);
    let fillers = kill_group(channel, &fillers, "filler");

    let holders = channel.find_processes(RETAIN_MARKER, Some(program_name));
    let holders = kill_group(channel, &holders, "retain");

    fillers.and(holders)
}

fn kill_group<C: Channel + ?Sized>(channel: &C, pids: &[u32], what: &str) -> Result<()> {
    if pids.is_empty() {
        debug!(what, "no processes to kill");
        return Ok(());
    }
    match channel.kill(pids) {
        Ok(()) => {
            info!(what, ?pids, "killed");
            Ok(())
        }
        Err(e) => {
            warn!(what, ?pids, "kill failed, {}", e);
            Err(e)
        }
    }
}
