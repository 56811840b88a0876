pub const MIB: f64 = 1_048_576.0;

/// Capacity snapshot of the filesystem backing one directory.
/// Always read fresh; the disk changes underneath us.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilesystemStat {
    pub total_bytes:     u64,
    pub available_bytes: u64,
    pub block_size:      u64,
}

impl FilesystemStat {
    pub fn from_blocks(blocks: u64, blocks_available: u64, block_size: u64) -> Self {
        Self {
            total_bytes:     blocks * block_size,
            available_bytes: blocks_available * block_size,
            block_size,
        }
    }

    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }

    /// Used space as a fraction of the total, 0.0 ..= 1.0.
    pub fn used_fraction(&self) -> f64 {
        if self.total_bytes == 0 { return 0.0; }
        self.used_bytes() as f64 / self.total_bytes as f64
    }

    pub fn available_mb(&self) -> f64 {
        self.available_bytes as f64 / MIB
    }
}
