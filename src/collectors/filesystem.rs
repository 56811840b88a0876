use crate::error::{FillError, Result};
use crate::models::filesystem::FilesystemStat;
use std::path::Path;

/// statvfs(3) on the filesystem holding `dir`.
pub fn read_stat(dir: &Path) -> Result<FilesystemStat> {
    use nix::sys::statvfs::statvfs;
    let stat = statvfs(dir).map_err(|source| FillError::Stat {
        path: dir.to_path_buf(),
        source,
    })?;

    let frsize = stat.fragment_size() as u64;
    let fs = FilesystemStat::from_blocks(stat.blocks() as u64, stat.blocks_available() as u64, frsize);
    // Pseudo filesystems report zero blocks; usage ratios are meaningless there.
    if fs.total_bytes == 0 {
        return Err(FillError::Stat {
            path:   dir.to_path_buf(),
            source: nix::errno::Errno::EINVAL,
        });
    }
    Ok(fs)
}
