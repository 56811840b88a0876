use crate::error::FillError;
use serde::Serialize;
use std::fmt;

pub const DISK_FULL_MESSAGE: &str = "No space left on device";

/// What a successful start actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// Space reserved in one preallocation call.
    Preallocated { size_mb: u64 },
    /// Preallocation ran the device out of space; the disk is full.
    DiskFull,
    /// A background zero-write was launched and is still running.
    Streaming { size_mb: u64 },
}

impl fmt::Display for FillOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillOutcome::Preallocated { size_mb } => write!(f, "filled {}M by fallocate", size_mb),
            FillOutcome::DiskFull                 => write!(f, "success because of {}", DISK_FULL_MESSAGE),
            FillOutcome::Streaming { size_mb }    => write!(f, "filling {}M by dd in background", size_mb),
        }
    }
}

/// JSON envelope printed with `--json`.
#[derive(Debug, Serialize)]
pub struct Response {
    pub code:      u16,
    pub success:   bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result:    Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error:     Option<String>,
    pub timestamp: String,
}

impl Response {
    pub fn ok(result: impl Into<String>) -> Self {
        Self {
            code:      200,
            success:   true,
            result:    Some(result.into()),
            error:     None,
            timestamp: chrono::Local::now().to_rfc3339(),
        }
    }

    pub fn fail(err: &FillError) -> Self {
        Self {
            code:      err.code(),
            success:   false,
            result:    None,
            error:     Some(err.to_string()),
            timestamp: chrono::Local::now().to_rfc3339(),
        }
    }
}
