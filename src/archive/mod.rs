//! # Archive Writer
//!
//! Re-packs a [`Tree`] (or a single named file) into an in-memory ZIP blob for
//! download. Folders become directory entries and files are written with the
//! same line-ending normalization the reader applies, so a tree survives a
//! write/read cycle unchanged.

use crate::common::{normalize_line_endings, FileSystemObject, Tree};
use crate::BundleError;
use chrono::{DateTime, Utc};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Extension appended to archive download names.
pub const ZIP_EXTENSION: &str = ".zip";

/// Timestamp layout used in single-file download names.
pub const DOWNLOAD_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// A writer that builds a ZIP archive in memory.
pub struct ArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    file_count: u64,
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            file_count: 0,
        }
    }

    fn file_options() -> FileOptions {
        FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644)
    }

    fn dir_options() -> FileOptions {
        FileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o755)
    }

    /// Adds one text file at `path`.
    pub fn add_file(&mut self, path: &str, content: &str) -> Result<(), BundleError> {
        self.zip.start_file(path, Self::file_options()).map_err(BundleError::write)?;
        self.zip
            .write_all(normalize_line_endings(content).as_bytes())
            .map_err(BundleError::write)?;
        self.file_count += 1;
        Ok(())
    }

    /// Adds a directory entry at `path` (a trailing `/` is added if missing).
    pub fn add_directory(&mut self, path: &str) -> Result<(), BundleError> {
        self.zip.add_directory(path, Self::dir_options()).map_err(BundleError::write)
    }

    /// Adds every node of `tree`, with entry paths prefixed by `prefix`
    /// (empty for the archive root).
    ///
    /// Each key must be a single non-empty path segment.
    pub fn add_tree(&mut self, prefix: &str, tree: &Tree) -> Result<(), BundleError> {
        for (name, node) in tree {
            if name.is_empty() || name.contains('/') {
                return Err(BundleError::InvalidEntryName { name: name.clone() });
            }
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };
            match node {
                FileSystemObject::File { content } => self.add_file(&path, content)?,
                FileSystemObject::Folder { children } => {
                    self.add_directory(&path)?;
                    self.add_tree(&path, children)?;
                }
            }
        }
        Ok(())
    }

    /// Finishes the central directory and returns the archive bytes.
    pub fn finalize(mut self) -> Result<Vec<u8>, BundleError> {
        let cursor = self.zip.finish().map_err(BundleError::write)?;
        tracing::debug!(files = self.file_count, "archive written");
        Ok(cursor.into_inner())
    }
}

/// Packs a whole tree into ZIP bytes.
pub fn write_tree(tree: &Tree) -> Result<Vec<u8>, BundleError> {
    let mut writer = ArchiveWriter::new();
    writer.add_tree("", tree).map_err(report)?;
    writer.finalize().map_err(report)
}

/// Packs one named file into ZIP bytes, without walking a tree.
pub fn write_single_file(name: &str, content: &str) -> Result<Vec<u8>, BundleError> {
    let mut writer = ArchiveWriter::new();
    writer.add_file(name, content).map_err(report)?;
    writer.finalize().map_err(report)
}

fn report(err: BundleError) -> BundleError {
    tracing::error!(error = %err, "failed to write archive");
    err
}

/// `<zip_name>.zip`
pub fn archive_download_name(zip_name: &str) -> String {
    format!("{}{}", zip_name, ZIP_EXTENSION)
}

/// `<file_name>-<timestamp><extension>`, e.g. `Token-20240102030405.json`.
/// `extension` includes its leading dot, or is empty.
pub fn file_download_name(file_name: &str, extension: &str, at: DateTime<Utc>) -> String {
    format!("{}-{}{}", file_name, at.format(DOWNLOAD_TIMESTAMP_FORMAT), extension)
}
