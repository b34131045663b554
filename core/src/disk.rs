use crate::fs::{Filesystem, FsError, FsStats};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiskUsage {
    pub used_percent: f32,
}

impl DiskUsage {
    pub fn from_stats(stats: &FsStats) -> Result<Self, FsError> {
        if stats.total_blocks == 0 {
            return Err(FsError::NoBlocks);
        }
        let free = stats.free_blocks.min(stats.total_blocks) as f32;
        let used_percent = 100.0 - (free / stats.total_blocks as f32) * 100.0;
        Ok(Self { used_percent })
    }
}

/// Space used on the launcher's volume. Callers render an error as unknown usage.
pub fn probe<F: Filesystem>(fs: &F) -> Result<DiskUsage, FsError> {
    let stats = fs.stat().map_err(FsError::from_io)?;
    DiskUsage::from_stats(&stats)
}
