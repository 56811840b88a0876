use crate::collectors::process;
use crate::error::{FillError, Result};
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout:  String,
    pub stderr:  String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self { success: true, stdout: stdout.into(), stderr: String::new() }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self { success: false, stdout: String::new(), stderr: stderr.into() }
    }
}

/// Everything the fill logic needs from the host: running tools, launching
/// background processes and finding them again by name.
pub trait Channel {
    /// Run `program` to completion. A missing binary is `ToolUnavailable`;
    /// a non-zero exit is reported through `CommandOutput::success`.
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput>;

    fn is_command_available(&self, program: &str) -> bool;

    /// Launch `program` in its own process group and return without waiting.
    /// Output is appended to `log`, or discarded when `log` is `None`.
    fn spawn_detached(&self, program: &str, args: &[String], log: Option<&Path>) -> Result<()>;

    /// PIDs whose command line contains `marker` (and `scope`, if given).
    /// Best-effort: the process table may change before the caller acts.
    fn find_processes(&self, marker: &str, scope: Option<&str>) -> Vec<u32>;

    /// SIGKILL every pid. An empty list is a no-op, and a pid that has
    /// already exited counts as killed. Every pid is tried; the first
    /// failure is returned as `CleanupFailed`.
    fn kill(&self, pids: &[u32]) -> Result<()> {
        let mut first = None;
        for &pid in pids {
            if let Err(e) = sigkill(pid) {
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }
}

fn sigkill(pid: u32) -> Result<()> {
    let raw = i32::try_from(pid)
        .ok()
        .filter(|&p| p > 0)
        .ok_or_else(|| FillError::CleanupFailed(format!("kill {}: not a process id", pid)))?;
    kill_result(pid, signal::kill(Pid::from_raw(raw), Signal::SIGKILL))
}

/// ESRCH means the process is already gone, which is what kill wanted.
pub(crate) fn kill_result(pid: u32, res: nix::Result<()>) -> Result<()> {
    match res {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(FillError::CleanupFailed(format!("kill {}: {}", pid, e))),
    }
}

/// Channel backed by the local host.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalChannel;

impl LocalChannel {
    pub fn new() -> Self { LocalChannel }
}

impl Channel for LocalChannel {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!(program, args = %args.join(" "), "run");
        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(program, e))?;

        Ok(CommandOutput {
            success: out.status.success(),
            stdout:  String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr:  String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }

    fn is_command_available(&self, program: &str) -> bool {
        find_in_path(program).is_some()
    }

    fn spawn_detached(&self, program: &str, args: &[String], log: Option<&Path>) -> Result<()> {
        debug!(program, args = %args.join(" "), "spawn detached");
        let (stdout, stderr) = match log.map(open_log) {
            Some(Ok(f)) => {
                let err = f.try_clone()?;
                (Stdio::from(f), Stdio::from(err))
            }
            _ => (Stdio::null(), Stdio::null()),
        };

        // The child is never waited on; it belongs to its own group so a
        // signal to our group or terminal does not reach it.
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .process_group(0)
            .spawn()
            .map_err(|e| spawn_error(program, e))?;
        Ok(())
    }

    fn find_processes(&self, marker: &str, scope: Option<&str>) -> Vec<u32> {
        process::find(marker, scope)
    }
}

fn spawn_error(program: &str, e: io::Error) -> FillError {
    if e.kind() == io::ErrorKind::NotFound {
        FillError::ToolUnavailable(program.to_string())
    } else {
        FillError::Io(e)
    }
}

fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Resolve `program` the way a shell would: paths are checked directly,
/// bare names are looked up in $PATH.
fn find_in_path(program: &str) -> Option<PathBuf> {
    if program.contains('/') {
        let p = PathBuf::from(program);
        return is_executable(&p).then_some(p);
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| is_executable(p))
}

fn is_executable(p: &Path) -> bool {
    p.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
