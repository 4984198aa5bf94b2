//! Common types shared by the reader, the tree builder and the writer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of an unpacked source bundle: segment name -> node.
pub type Tree = BTreeMap<String, FileSystemObject>;

/// Flat listing produced by the archive reader, keyed by full entry path
/// (e.g. `"messages/test.sol"`), before it is nested into a [`Tree`].
pub type FlatEntries = BTreeMap<String, FileSystemObject>;

/// Key used when a tree is presented under a single synthetic root folder.
pub const SOURCE_CODE_ROOT: &str = "Source Code";

/// A node of the unpacked source tree.
///
/// Serialized with a `kind` discriminant so the JSON form reads
/// `{"kind": "file", "content": ...}` or `{"kind": "folder", "children": {...}}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FileSystemObject {
    /// A decoded text file.
    File { content: String },
    /// A directory. Empty directories from the archive are kept.
    Folder { children: BTreeMap<String, FileSystemObject> },
}

impl FileSystemObject {
    pub fn file(content: impl Into<String>) -> Self {
        FileSystemObject::File { content: content.into() }
    }

    pub fn empty_folder() -> Self {
        FileSystemObject::Folder { children: BTreeMap::new() }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, FileSystemObject::Folder { .. })
    }

    /// Number of `File` leaves at or below this node.
    pub fn file_count(&self) -> usize {
        match self {
            FileSystemObject::File { .. } => 1,
            FileSystemObject::Folder { children } => children.values().map(Self::file_count).sum(),
        }
    }
}

/// Wraps `tree` as the only child of a folder named `name`.
pub fn wrap_root(tree: Tree, name: &str) -> Tree {
    let mut root = Tree::new();
    root.insert(name.to_string(), FileSystemObject::Folder { children: tree });
    root
}

/// Renders a tree as JSON with two-space indentation.
pub fn to_pretty_json(tree: &Tree) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(tree)
}

/// Converts `\r\n` and lone `\r` into `\n`.
///
/// Applied when entry text is decoded and again when it is written back, so
/// content survives a read/write/read cycle unchanged.
pub fn normalize_line_endings(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            out.push('\n');
        } else {
            out.push(c);
        }
    }
    out
}
