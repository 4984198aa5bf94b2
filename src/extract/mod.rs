//! # Archive Reader
//!
//! Turns a ZIP blob into a flat `path -> FileSystemObject` listing. Both size
//! guards run first; a tripped guard yields an empty listing. Entries under an
//! ignored prefix, and files whose extension is not allow-listed, are left out
//! silently. Only archives that cannot be parsed produce an error.

use crate::common::{normalize_line_endings, FileSystemObject, FlatEntries};
use crate::guard::SizeLimits;
use crate::BundleError;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Entry prefix written by the macOS archiving tool.
pub const MACOS_METADATA_PREFIX: &str = "__MACOSX/";

/// Extensions accepted by default (compared case-insensitively).
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["sol", "json"];

const UTF8_BOM: char = '\u{feff}';

/// Reader settings. `Default` gives the verified-source bundle policy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ReaderConfig {
    pub limits: SizeLimits,
    /// Lower-case extensions, without the dot.
    pub allowed_extensions: Vec<String>,
    /// Entries whose path starts with any of these are skipped.
    pub ignored_prefixes: Vec<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            limits: SizeLimits::default(),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ignored_prefixes: vec![MACOS_METADATA_PREFIX.to_string()],
        }
    }
}

impl ReaderConfig {
    pub fn with_limits(limits: SizeLimits) -> Self {
        Self { limits, ..Self::default() }
    }

    fn is_ignored(&self, path: &str) -> bool {
        self.ignored_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    fn is_allowed(&self, path: &str) -> bool {
        match file_extension(path) {
            Some(ext) => self.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}

/// Extension of the last path segment: the text after its last `.`.
///
/// A name with no dot, a leading dot (`.sol`) or a trailing dot (`file.`) has
/// no extension.
pub fn file_extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(i) if i + 1 == name.len() => None,
        Some(i) => Some(&name[i + 1..]),
    }
}

/// A reader over an in-memory ZIP blob.
pub struct ArchiveReader<'a> {
    bytes: &'a [u8],
    config: &'a ReaderConfig,
}

impl<'a> ArchiveReader<'a> {
    pub fn new(bytes: &'a [u8], config: &'a ReaderConfig) -> Self {
        Self { bytes, config }
    }

    /// Returns `true` if either size ceiling is exceeded.
    pub fn is_oversized(&self) -> Result<bool, BundleError> {
        let limits = &self.config.limits;
        if limits.check_compressed_size(self.bytes) {
            tracing::warn!(
                size = self.bytes.len(),
                limit = limits.max_compressed_bytes,
                "archive exceeds compressed size ceiling"
            );
            return Ok(true);
        }
        if limits.check_decompressed_size(self.bytes)? {
            tracing::warn!(
                limit = limits.max_decompressed_bytes,
                "archive exceeds decompressed size ceiling"
            );
            return Ok(true);
        }
        Ok(false)
    }

    /// Reads every accepted entry into a flat listing.
    ///
    /// Returns an empty listing for oversized archives.
    pub fn read_entries(&self) -> Result<FlatEntries, BundleError> {
        if self.is_oversized()? {
            return Ok(FlatEntries::new());
        }

        let mut zip = ZipArchive::new(Cursor::new(self.bytes)).map_err(BundleError::parse)?;
        let mut entries = FlatEntries::new();
        let mut skipped = 0usize;

        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).map_err(BundleError::parse)?;
            let path = entry.name().to_string();

            if self.config.is_ignored(&path) {
                skipped += 1;
                continue;
            }

            if entry.is_dir() {
                tracing::trace!(%path, "folder entry");
                record(&mut entries, path, FileSystemObject::empty_folder())?;
                continue;
            }

            if !self.config.is_allowed(&path) {
                tracing::trace!(%path, "extension not allowed");
                skipped += 1;
                continue;
            }

            let mut raw = Vec::with_capacity(entry.size().min(self.config.limits.max_decompressed_bytes) as usize);
            entry.read_to_end(&mut raw).map_err(BundleError::parse)?;
            tracing::trace!(%path, bytes = raw.len(), "file entry");
            record(&mut entries, path, FileSystemObject::file(decode_text(&raw)))?;
        }

        tracing::debug!(accepted = entries.len(), skipped, "archive read");
        Ok(entries)
    }
}

/// Adds one entry to the listing. Repeated directory markers collapse into
/// one; a repeated file name is a conflict.
fn record(entries: &mut FlatEntries, path: String, item: FileSystemObject) -> Result<(), BundleError> {
    match entries.entry(path) {
        Entry::Vacant(slot) => {
            slot.insert(item);
            Ok(())
        }
        Entry::Occupied(slot) if slot.get().is_folder() && item.is_folder() => Ok(()),
        Entry::Occupied(slot) => {
            let path = slot.key().clone();
            tracing::error!(%path, "duplicate archive entry");
            Err(BundleError::PathConflict { path })
        }
    }
}

/// Decodes entry bytes as UTF-8 text: invalid sequences are replaced, leading
/// BOMs are dropped and line endings are normalized. Decoding the result
/// again yields the same text.
pub fn decode_text(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    normalize_line_endings(text.trim_start_matches(UTF8_BOM))
}

/// Convenience wrapper around [`ArchiveReader::read_entries`].
pub fn read_entries(bytes: &[u8], config: &ReaderConfig) -> Result<FlatEntries, BundleError> {
    ArchiveReader::new(bytes, config).read_entries()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build_zip(dirs: &[&str], files: &[(&str, &str)]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for dir in dirs {
            zip.add_directory(*dir, FileOptions::default())?;
        }
        for (name, data) in files {
            zip.start_file(*name, FileOptions::default())?;
            zip.write_all(data.as_bytes())?;
        }
        Ok(zip.finish()?.into_inner())
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("a/b/Token.sol"), Some("sol"));
        assert_eq!(file_extension("x.tar.json"), Some("json"));
        assert_eq!(file_extension("test1"), None);
        assert_eq!(file_extension(".sol"), None);
        assert_eq!(file_extension("__MACOSX/.sol"), None);
        assert_eq!(file_extension("trailing."), None);
        assert_eq!(file_extension("dir.v2/README"), None);
    }

    #[test]
    fn test_extension_is_case_insensitive() -> Result<(), Box<dyn std::error::Error>> {
        let archive = build_zip(&[], &[("Upper.SOL", "contract A {}"), ("meta.Json", "{}")])?;
        let entries = read_entries(&archive, &ReaderConfig::default())?;
        assert!(entries.contains_key("Upper.SOL"));
        assert!(entries.contains_key("meta.Json"));
        Ok(())
    }

    #[test]
    fn test_directories_become_empty_folders() -> Result<(), Box<dyn std::error::Error>> {
        let archive = build_zip(&["contracts/", "empty/"], &[("contracts/A.sol", "// A\n")])?;
        let entries = read_entries(&archive, &ReaderConfig::default())?;

        assert_eq!(entries.get("empty/"), Some(&FileSystemObject::empty_folder()));
        assert_eq!(entries.get("contracts/"), Some(&FileSystemObject::empty_folder()));
        assert_eq!(entries.get("contracts/A.sol"), Some(&FileSystemObject::file("// A\n")));
        Ok(())
    }

    #[test]
    fn test_ignored_prefix_skips_directories_too() -> Result<(), Box<dyn std::error::Error>> {
        let archive = build_zip(&["__MACOSX/"], &[("__MACOSX/._A.sol", "junk"), ("A.sol", "ok")])?;
        let entries = read_entries(&archive, &ReaderConfig::default())?;
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["A.sol"]);
        Ok(())
    }

    #[test]
    fn test_decode_text_normalizes() {
        assert_eq!(decode_text(b"\xef\xbb\xbfpragma;\r\n"), "pragma;\n");
        assert_eq!(decode_text("\u{feff}\u{feff}x".as_bytes()), "x");
        assert_eq!(decode_text(b"ok\xff"), "ok\u{fffd}");
    }

    #[test]
    fn test_custom_allow_list() -> Result<(), Box<dyn std::error::Error>> {
        let archive = build_zip(&[], &[("README.md", "# hi"), ("A.sol", "x")])?;
        let config = ReaderConfig { allowed_extensions: vec!["md".into()], ..ReaderConfig::default() };
        let entries = read_entries(&archive, &config)?;
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["README.md"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_file_entries_conflict() -> Result<(), Box<dyn std::error::Error>> {
        let archive = build_zip(&[], &[("a.sol", "first"), ("a.sol", "second")])?;
        let err = read_entries(&archive, &ReaderConfig::default()).unwrap_err();
        assert!(matches!(err, BundleError::PathConflict { ref path } if path == "a.sol"));
        Ok(())
    }

    #[test]
    fn test_duplicate_directory_entries_merge() -> Result<(), Box<dyn std::error::Error>> {
        let archive = build_zip(&["lib/", "lib/"], &[("lib/A.sol", "a")])?;
        let entries = read_entries(&archive, &ReaderConfig::default())?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.get("lib/"), Some(&FileSystemObject::empty_folder()));
        Ok(())
    }

    #[test]
    fn test_corrupt_archive_is_an_error() {
        let err = read_entries(b"PK\x03\x04 truncated", &ReaderConfig::default()).unwrap_err();
        assert!(matches!(err, BundleError::ArchiveParse(_)));
    }
}
