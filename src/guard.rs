//! # Size Guard
//!
//! Two independent ceilings protect the reader from oversized input: one on the
//! raw archive length, checked before anything is parsed, and one on the total
//! number of bytes the archive's files decompress to. The second check streams
//! each entry through a bounded reader and stops as soon as the running total
//! crosses the ceiling, so a decompression bomb costs at most `limit + 1` bytes
//! of decoding work and no buffered content at all.

use crate::BundleError;
use serde::{Deserialize, Serialize};
use std::io::{self, Cursor, Read};
use zip::ZipArchive;

/// 1 MiB, the default for both ceilings.
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;

/// Byte ceilings applied before any archive content is handed out.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    /// Maximum length of the compressed archive blob.
    #[serde(default = "default_max")]
    pub max_compressed_bytes: u64,
    /// Maximum cumulative size of all decompressed file entries.
    #[serde(default = "default_max")]
    pub max_decompressed_bytes: u64,
}

fn default_max() -> u64 {
    DEFAULT_MAX_BYTES
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            max_compressed_bytes: DEFAULT_MAX_BYTES,
            max_decompressed_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl SizeLimits {
    /// Returns `true` when the compressed blob is too large to process.
    pub fn check_compressed_size(&self, archive: &[u8]) -> bool {
        archive.len() as u64 > self.max_compressed_bytes
    }

    /// Returns `true` when the archive's files decompress to more than the
    /// ceiling. Directory entries are not counted.
    ///
    /// Sizes are measured by actually decoding, never from the entry headers,
    /// so a forged size field cannot slip past the check.
    pub fn check_decompressed_size(&self, archive: &[u8]) -> Result<bool, BundleError> {
        let mut zip = ZipArchive::new(Cursor::new(archive)).map_err(BundleError::parse)?;
        let mut total: u64 = 0;

        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(BundleError::parse)?;
            if entry.is_dir() {
                continue;
            }
            let remaining = self.max_decompressed_bytes - total;
            // One byte past the budget is enough to know it was exceeded.
            let mut bounded = (&mut entry).take(remaining.saturating_add(1));
            let read = io::copy(&mut bounded, &mut io::sink()).map_err(BundleError::parse)?;
            total += read;
            if total > self.max_decompressed_bytes {
                tracing::trace!(entry = i, total, "decompressed size ceiling crossed");
                return Ok(true);
            }
        }
        Ok(false)
    }
}
