use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while filling or releasing a directory.
#[derive(Debug, Error)]
pub enum FillError {
    #[error("must specify start or stop operation")]
    InvalidMode,

    #[error("--directory flag value is empty")]
    MissingDirectory,

    #[error("less --size or --percent or --reserve flag")]
    MissingSizeSpec,

    #[error("invalid --reserve value {0}, must be a finite number not below zero")]
    InvalidReserve(f64),

    #[error("the disk has been used {used:.2}, large than expected {expected:.2}")]
    AlreadyExceeded { used: f64, expected: f64 },

    #[error("the disk has available size {available_mb:.2}, less than expected {reserve_mb}")]
    InsufficientSpace { available_mb: f64, reserve_mb: f64 },

    #[error("{0} command not found")]
    ToolUnavailable(String),

    #[error("execute {program} err, {stderr}")]
    CommandFailed { program: String, stderr: String },

    #[error("failed to read {} file, {source}", .path.display())]
    ArtifactUnreadable { path: PathBuf, source: io::Error },

    #[error("cleanup failed, {0}")]
    CleanupFailed(String),

    #[error("statfs {} failed, {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, FillError>;

impl FillError {
    pub fn command_failed(program: impl Into<String>, stderr: impl Into<String>) -> Self {
        FillError::CommandFailed {
            program: program.into(),
            stderr:  stderr.into().trim().to_string(),
        }
    }

    /// Stable numeric code reported in JSON responses.
    /// Parameter problems sit in the 4xx range, runtime failures in 5xx.
    pub fn code(&self) -> u16 {
        match self {
            FillError::InvalidMode                 => 400,
            FillError::MissingDirectory            => 401,
            FillError::MissingSizeSpec             => 402,
            FillError::AlreadyExceeded { .. }      => 403,
            FillError::InsufficientSpace { .. }    => 404,
            FillError::InvalidReserve(_)           => 405,
            FillError::ToolUnavailable(_)          => 501,
            FillError::CommandFailed { .. }        => 502,
            FillError::ArtifactUnreadable { .. }   => 503,
            FillError::CleanupFailed(_)            => 504,
            FillError::Stat { .. }                 => 505,
            FillError::Io(_)                       => 506,
        }
    }

    /// True for errors raised before anything on disk or in the process table is touched.
    pub fn is_parameter_error(&self) -> bool {
        self.code() < 500
    }
}
