//! Turns a size request into a concrete number of MiB to fill.

use crate::collectors::filesystem::read_stat;
use crate::error::{FillError, Result};
use crate::models::filesystem::{FilesystemStat, MIB};
use crate::models::request::SizeSpec;
use std::path::Path;
use tracing::debug;

/// Size to fill in MiB, reading the filesystem stat of `directory` if needed.
pub fn compute(directory: &Path, wanted: SizeSpec) -> Result<u64> {
    compute_with(directory, wanted, read_stat)
}

/// Same as [`compute`] with an injectable stat source.
///
/// An explicit size is returned untouched (and no stat is taken) unless a
/// percent or reserve is also given. Percent wins over reserve.
pub fn compute_with<F>(directory: &Path, wanted: SizeSpec, stat: F) -> Result<u64>
where
    F: FnOnce(&Path) -> Result<FilesystemStat>,
{
    if wanted.percent.is_none() && wanted.reserve_mb.is_none() {
        return wanted.size_mb.ok_or(FillError::MissingSizeSpec);
    }

    let st = stat(directory)?;
    if let Some(percent) = wanted.percent {
        return size_for_percent(&st, percent);
    }
    match wanted.reserve_mb {
        Some(reserve) => size_for_reserve(&st, reserve),
        None          => wanted.size_mb.ok_or(FillError::MissingSizeSpec),
    }
}

/// MiB needed to bring usage up to `percent` of the total.
///
/// Both the current and the target ratio are rounded to two decimals before
/// comparing, and only the final MiB value is floored.
pub fn size_for_percent(st: &FilesystemStat, percent: u32) -> Result<u64> {
    let used = round2(st.used_fraction());
    let expected = round2(percent as f64 / 100.0);
    if used >= expected {
        return Err(FillError::AlreadyExceeded { used, expected });
    }
    let remainder = expected - used;
    debug!(used, expected, remainder, "percent fill");
    Ok((remainder * st.total_bytes as f64 / MIB).floor() as u64)
}

/// MiB that can be filled while leaving `reserve_mb` available.
pub fn size_for_reserve(st: &FilesystemStat, reserve_mb: f64) -> Result<u64> {
    let available_mb = st.available_mb();
    if available_mb <= reserve_mb {
        return Err(FillError::InsufficientSpace { available_mb, reserve_mb });
    }
    debug!(available_mb, reserve_mb, "reserve fill");
    Ok((available_mb - reserve_mb).floor() as u64)
}

fn round2(v: f64) -> f64 {
    format!("{:.2}", v).parse().unwrap_or(v)
}
