//! # Path-Tree Builder
//!
//! Nests a flat `path -> FileSystemObject` listing into a [`Tree`].
//!
//! Paths are split on `/` with empty segments dropped, so leading, trailing and
//! doubled slashes are harmless. Every intermediate segment maps to exactly one
//! `Folder`, however many entries share the prefix. A directory marker that
//! lands on an existing folder merges into it. Any other collision (a file where
//! a folder is needed, a folder where a file sits, the same file twice) is
//! rejected with [`BundleError::PathConflict`] instead of depending on entry
//! order.

use crate::common::{FileSystemObject, FlatEntries, Tree};
use crate::BundleError;
use std::collections::btree_map::Entry;

/// Builds the nested tree for a flat listing.
pub fn build_tree(entries: FlatEntries) -> Result<Tree, BundleError> {
    let mut root = Tree::new();
    for (path, item) in entries {
        insert_path(&mut root, &path, item)?;
    }
    Ok(root)
}

/// Places `item` at `path` inside `root`, creating intermediate folders.
/// A path with no non-empty segment is ignored.
pub fn insert_path(root: &mut Tree, path: &str, item: FileSystemObject) -> Result<(), BundleError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((name, parents)) = segments.split_last() else {
        tracing::debug!(%path, "ignoring entry without a name");
        return Ok(());
    };

    let mut level = root;
    for (depth, segment) in parents.iter().enumerate() {
        level = match level.entry((*segment).to_string()).or_insert_with(FileSystemObject::empty_folder) {
            FileSystemObject::Folder { children } => children,
            FileSystemObject::File { .. } => return Err(conflict(&parents[..=depth])),
        };
    }

    place(level, name, item, &segments)
}

fn place(level: &mut Tree, name: &str, item: FileSystemObject, full: &[&str]) -> Result<(), BundleError> {
    match level.entry(name.to_string()) {
        Entry::Vacant(slot) => {
            slot.insert(item);
            Ok(())
        }
        Entry::Occupied(mut slot) => match (slot.get_mut(), item) {
            (FileSystemObject::Folder { children: existing }, FileSystemObject::Folder { children: incoming }) => {
                for (child, node) in incoming {
                    let mut child_path = full.to_vec();
                    child_path.push(&child);
                    place(existing, &child, node, &child_path)?;
                }
                Ok(())
            }
            _ => Err(conflict(full)),
        },
    }
}

fn conflict(segments: &[&str]) -> BundleError {
    let path = segments.join("/");
    tracing::error!(%path, "conflicting archive entries");
    BundleError::PathConflict { path }
}
