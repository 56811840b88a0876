use crate::channel::Channel;
use crate::config::Config;
use crate::error::{FillError, Result};
use crate::fill::{holder, size, strategy::Executor};
use crate::models::filesystem::FilesystemStat;
use crate::models::outcome::FillOutcome;
use crate::models::request::{artifact_path, FillRequest};
use crate::util::human::fmt_mb;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default program name used when the running executable cannot be resolved.
pub const PROGRAM_NAME: &str = "chaos_filldisk";

/// Drives one start or stop against a directory.
pub struct FillController<C: Channel> {
    channel:        C,
    use_fallocate:  bool,
    holder_program: PathBuf,
    holder_log:     Option<PathBuf>,
    stat:           fn(&Path) -> Result<FilesystemStat>,
}

impl<C: Channel> FillController<C> {
    pub fn new(channel: C, config: &Config) -> Self {
        let holder_program = std::env::current_exe().unwrap_or_else(|_| PathBuf::from(PROGRAM_NAME));
        Self {
            channel,
            use_fallocate: config.fill.use_fallocate,
            holder_program,
            holder_log: config.retain_log_path(),
            stat: crate::collectors::filesystem::read_stat,
        }
    }

    /// Program re-invoked as the handle holder; its file name also scopes
    /// the holder lookup on stop.
    pub fn with_holder_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.holder_program = program.into();
        self
    }

    pub fn with_stat_source(mut self, stat: fn(&Path) -> Result<FilesystemStat>) -> Self {
        self.stat = stat;
        self
    }

    pub fn channel(&self) -> &C { &self.channel }

    fn program_name(&self) -> String {
        self.holder_program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| PROGRAM_NAME.to_string())
    }

    /// Compute the size, fill it, and optionally leave a holder behind.
    ///
    /// Size errors return before anything is touched. A fill failure runs
    /// [`stop`](Self::stop) first; if that fails too, the fill error is
    /// still the one returned.
    pub fn start(&self, req: &FillRequest) -> Result<FillOutcome> {
        let directory = req.directory();
        let size_mb = size::compute_with(directory, req.size(), self.stat)?;
        info!(directory = %directory.display(), size = %fmt_mb(size_mb), "starting fill");

        let executor = Executor::new(&self.channel, self.use_fallocate);
        match executor.fill(size_mb, &req.artifact_path()) {
            Ok(outcome) => {
                if req.retain_handle() {
                    self.spawn_holder(directory);
                }
                Ok(outcome)
            }
            Err(e) => {
                if let Err(cleanup) = self.stop(directory) {
                    warn!("failed to stop fill when starting failed, {}, starting err: {}", cleanup, e);
                }
                Err(e)
            }
        }
    }

    fn spawn_holder(&self, directory: &Path) {
        let log = self.holder_log.as_deref().filter(|p| ensure_parent(p));
        if let Err(e) = holder::retain(&self.channel, &self.holder_program, directory, log) {
            warn!("failed to start retain process, {}", e);
        }
    }

    /// Kill fillers and holders, then delete the artifact. Safe to repeat.
    ///
    /// The artifact is removed even when a kill fails, but the kill failure
    /// is still returned: a surviving holder keeps the space allocated.
    pub fn stop(&self, directory: &Path) -> Result<()> {
        if directory.as_os_str().is_empty() {
            return Err(FillError::MissingDirectory);
        }
        let released = holder::release(&self.channel, &self.program_name());

        let artifact = artifact_path(directory);
        if artifact.exists() {
            fs::remove_file(&artifact).map_err(|e| {
                FillError::CleanupFailed(format!("remove {}: {}", artifact.display(), e))
            })?;
            info!(path = %artifact.display(), "artifact removed");
        }
        released
    }
}

/// Create the log file's parent directory; false if that is impossible.
fn ensure_parent(path: &Path) -> bool {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).is_ok(),
        None         => true,
    }
}
