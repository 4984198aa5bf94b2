//! High-level entry points: archive bytes in, nested tree out.
//!
//! Guard trips and filtered entries give an empty or partial tree. Parse and
//! structure errors are logged with `tracing::error!` and returned.

use crate::common::Tree;
use crate::extract::{ArchiveReader, ReaderConfig};
use crate::tree::build_tree;
use crate::BundleError;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Reads `archive` and nests its accepted entries.
pub fn serialize(archive: &[u8], config: &ReaderConfig) -> Result<Tree, BundleError> {
    let result = ArchiveReader::new(archive, config)
        .read_entries()
        .and_then(build_tree);
    if let Err(e) = &result {
        tracing::error!(error = %e, "failed to unpack source archive");
    }
    result
}

/// Buffers the whole blob from `reader`, then unpacks it on the blocking pool.
pub async fn serialize_reader<R>(mut reader: R, config: ReaderConfig) -> Result<Tree, BundleError>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    // Stop buffering one byte past the compressed ceiling; the guard only
    // needs to see that the blob is too long.
    let cap = config.limits.max_compressed_bytes.saturating_add(1);
    (&mut reader).take(cap).read_to_end(&mut bytes).await?;
    tracing::trace!(bytes = bytes.len(), "archive buffered");

    tokio::task::spawn_blocking(move || serialize(&bytes, &config)).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FileSystemObject;
    use crate::guard::SizeLimits;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn one_file_zip(name: &str, content: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(name, FileOptions::default())?;
        zip.write_all(content.as_bytes())?;
        Ok(zip.finish()?.into_inner())
    }

    #[tokio::test]
    async fn test_serialize_reader_builds_tree() -> Result<(), Box<dyn std::error::Error>> {
        let bytes = one_file_zip("contracts/A.sol", "contract A {}")?;
        let tree = serialize_reader(Cursor::new(bytes), ReaderConfig::default()).await?;
        let contracts = &tree["contracts"];
        assert_eq!(contracts.file_count(), 1);
        match contracts {
            FileSystemObject::Folder { children } => {
                assert_eq!(children["A.sol"], FileSystemObject::file("contract A {}"));
            }
            other => panic!("expected folder, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_serialize_reader_stops_buffering_oversized_input() -> Result<(), Box<dyn std::error::Error>> {
        let limits = SizeLimits { max_compressed_bytes: 64, max_decompressed_bytes: 64 };
        let blob = vec![0u8; 4096];
        let tree = serialize_reader(Cursor::new(blob), ReaderConfig::with_limits(limits)).await?;
        assert!(tree.is_empty());
        Ok(())
    }

    #[test]
    fn test_serialize_propagates_parse_errors() {
        let err = serialize(b"not a zip at all", &ReaderConfig::default()).unwrap_err();
        assert!(matches!(err, BundleError::ArchiveParse(_)));
    }
}
