use crate::error::{FillError, Result};
use std::path::{Path, PathBuf};

/// Name of the file that holds the consumed space inside the target directory.
pub const ARTIFACT_NAME: &str = "chaos_filldisk.log.dat";

/// Which half of the experiment a single invocation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Start,
    Stop,
}

impl Mode {
    /// Exactly one of the two flags must be set.
    pub fn from_flags(start: bool, stop: bool) -> Result<Self> {
        match (start, stop) {
            (true, false) => Ok(Mode::Start),
            (false, true) => Ok(Mode::Stop),
            _             => Err(FillError::InvalidMode),
        }
    }
}

/// How much to fill, as given by the user. Percent beats reserve beats size
/// when more than one is present.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizeSpec {
    pub size_mb:    Option<u64>,
    pub percent:    Option<u32>,
    pub reserve_mb: Option<f64>,
}

impl SizeSpec {
    pub fn is_empty(&self) -> bool {
        self.size_mb.is_none() && self.percent.is_none() && self.reserve_mb.is_none()
    }
}

/// A validated start request.
#[derive(Debug, Clone, PartialEq)]
pub struct FillRequest {
    directory:     PathBuf,
    size:          SizeSpec,
    retain_handle: bool,
}

impl FillRequest {
    pub fn new(directory: impl Into<PathBuf>, size: SizeSpec, retain_handle: bool) -> Result<Self> {
        let directory = directory.into();
        if directory.as_os_str().is_empty() {
            return Err(FillError::MissingDirectory);
        }
        if size.is_empty() {
            return Err(FillError::MissingSizeSpec);
        }
        if let Some(reserve) = size.reserve_mb {
            if !reserve.is_finite() || reserve < 0.0 {
                return Err(FillError::InvalidReserve(reserve));
            }
        }
        Ok(Self { directory, size, retain_handle })
    }

    pub fn directory(&self) -> &Path { &self.directory }
    pub fn size(&self) -> SizeSpec { self.size }
    pub fn retain_handle(&self) -> bool { self.retain_handle }

    pub fn artifact_path(&self) -> PathBuf {
        artifact_path(&self.directory)
    }
}

pub fn artifact_path(directory: &Path) -> PathBuf {
    directory.join(ARTIFACT_NAME)
}
