use zip::result::ZipError;

/// The primary error type for all operations in the `sourcebundle` crate.
///
/// Oversized archives and filtered entries are not errors; they produce an
/// empty or partial tree. Only structural failures end up here.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// The input could not be read as a ZIP archive, or an entry could not be
    /// decompressed.
    #[error("Could not parse archive: {0}")]
    ArchiveParse(#[source] ZipError),

    /// The ZIP library failed while producing an output archive.
    #[error("Could not write archive: {0}")]
    ArchiveWrite(#[source] ZipError),

    /// Two entries claim the same location with incompatible shapes: a file
    /// where a folder is needed, or the same file path twice.
    #[error("Conflicting archive entries at path '{path}'")]
    PathConflict { path: String },

    /// A tree key cannot become an archive entry name: it is empty or
    /// contains `/`.
    #[error("Invalid tree entry name '{name}'")]
    InvalidEntryName { name: String },

    /// An I/O error outside of the archive codec, e.g. reading the input blob.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tree (de)serialization failed.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The blocking archive task panicked or was cancelled.
    #[error("Archive task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl BundleError {
    pub(crate) fn parse(err: impl Into<ZipError>) -> Self {
        BundleError::ArchiveParse(err.into())
    }

    pub(crate) fn write(err: impl Into<ZipError>) -> Self {
        BundleError::ArchiveWrite(err.into())
    }
}
