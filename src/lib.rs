//! # sourcebundle Core Library
//!
//! Unpacks verified-contract source bundles (ZIP archives) into a nested
//! folder/file tree, and packs such trees back into ZIP archives for download.
//!
//! ## Key Modules
//!
//! - [`guard`]: compressed and decompressed size ceilings.
//! - [`extract`]: the archive reader that produces a flat path listing.
//! - [`tree`]: nests the flat listing into a [`Tree`].
//! - [`archive`]: the archive writer used for downloads.
//! - [`serialize`]: one-call read pipeline, sync and async.
//!
//! ## Examples
//!
//! ```no_run
//! use sourcebundle::{serialize, to_pretty_json, ReaderConfig};
//!
//! let bytes = std::fs::read("bundle.zip")?;
//! let tree = serialize(&bytes, &ReaderConfig::default())?;
//! println!("{}", to_pretty_json(&tree)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod archive;
pub mod cli;
pub mod cli_runner;
pub mod common;
pub mod error;
pub mod extract;
pub mod guard;
pub mod serialize;
pub mod tree;

pub use archive::{archive_download_name, file_download_name, write_single_file, write_tree, ArchiveWriter};
pub use common::{to_pretty_json, wrap_root, FileSystemObject, FlatEntries, Tree, SOURCE_CODE_ROOT};
pub use error::BundleError;
pub use extract::{read_entries, ArchiveReader, ReaderConfig};
pub use guard::SizeLimits;
pub use serialize::{serialize, serialize_reader};
pub use tree::build_tree;
