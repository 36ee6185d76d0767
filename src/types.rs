/*!
 * Core types and data structures for chronicle
 */

use std::path::PathBuf;

/// Kind of a filesystem entry as seen by the walker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file, or anything that is not a directory (symlinks included)
    File,
    /// Directory that may be descended into
    Directory,
}

impl EntryKind {
    pub fn is_dir(self) -> bool {
        self == EntryKind::Directory
    }
}

/// A path relative to the scan root, tagged with its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemEntry {
    /// Relative path from scan root, `/`-separated
    pub relative: String,
    /// Entry basename
    pub name: String,
    /// File or directory
    pub kind: EntryKind,
}

/// How a walk accumulates its result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Flat, extension-filtered list of file paths
    Export,
    /// Nested tree of every surviving entry
    Index,
}

/// Represents a directory in the surviving tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    /// Directory name
    pub name: String,
    /// Relative path from scan root (empty for the root)
    pub path: PathBuf,
    /// Directory contents, sorted by name, already pruned
    pub contents: Vec<TreeNode>,
}

/// A single node of the index tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// Directory node
    Directory(DirectoryNode),
    /// Leaf entry
    File {
        /// File name
        name: String,
        /// Relative path from scan root
        path: PathBuf,
    },
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Directory(dir) => &dir.name,
            TreeNode::File { name, .. } => name,
        }
    }
}

impl DirectoryNode {
    /// Count (directories, files) below this node, excluding itself
    pub fn count_entries(&self) -> (usize, usize) {
        self.contents
            .iter()
            .fold((0, 0), |(dirs, files), node| match node {
                TreeNode::Directory(dir) => {
                    let (d, f) = dir.count_entries();
                    (dirs + 1 + d, files + f)
                }
                TreeNode::File { .. } => (dirs, files + 1),
            })
    }
}

/// Output of a single walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalResult {
    /// Absolute paths of exported files in deterministic pre-order
    Export(Vec<PathBuf>),
    /// Root of the pruned tree
    Index(DirectoryNode),
}
