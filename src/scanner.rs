/*!
 * Pruned directory traversal shared by the export and index outputs
 */

use std::env;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::Result;
use crate::exclusion::ExclusionSet;
use crate::types::{
    DirectoryNode, EntryKind, FileSystemEntry, TraversalResult, TreeNode, WalkMode,
};
use crate::utils::has_allowed_extension;

/// Counters gathered while walking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkStatistics {
    /// Entries listed from directories that were opened
    pub entries_visited: usize,
    /// Directories excluded before being opened
    pub directories_pruned: usize,
    /// Files excluded by a pattern
    pub files_excluded: usize,
    /// Files left out of the export because of their extension
    pub files_skipped_by_extension: usize,
    /// Directories or entries that could not be read
    pub unreadable_entries: usize,
}

/// Walks a root directory, consulting an [`ExclusionSet`] at every entry
pub struct Scanner<'a> {
    /// Absolute scan root as the caller named it, symlinks kept
    root: PathBuf,
    /// Exclusion authority
    exclusions: &'a ExclusionSet,
    /// Progress bar
    pub progress: Arc<ProgressBar>,
    /// Walk statistics
    statistics: Mutex<WalkStatistics>,
}

impl<'a> Scanner<'a> {
    /// Create a scanner for `root`
    ///
    /// Fails if `root` does not exist or is not a directory.
    pub fn new(
        root: &Path,
        exclusions: &'a ExclusionSet,
        progress: Arc<ProgressBar>,
    ) -> Result<Self> {
        crate::ensure!(
            root.is_dir(),
            PathNotFound,
            "Target directory not found: {}",
            root.display()
        );
        let root = absolute_root(root)?;

        Ok(Self {
            root,
            exclusions,
            progress,
            statistics: Mutex::new(WalkStatistics::default()),
        })
    }

    /// Absolute root the scanner walks
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get walk statistics accumulated so far
    pub fn get_statistics(&self) -> WalkStatistics {
        self.statistics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Walk the root in the given mode
    pub fn walk(&self, mode: WalkMode) -> Result<TraversalResult> {
        match mode {
            WalkMode::Export => self.collect_files().map(TraversalResult::Export),
            WalkMode::Index => self.build_tree().map(TraversalResult::Index),
        }
    }

    /// Collect the export candidates in pre-order
    ///
    /// A directory's own files come first, followed by its subdirectories,
    /// each in name order.
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        self.collect_directory(&self.root, "", &mut files)?;
        Ok(files)
    }

    /// Build the pruned tree of every surviving entry
    pub fn build_tree(&self) -> Result<DirectoryNode> {
        let name = self
            .root
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let contents = self.scan_directory(&self.root, "")?.unwrap_or_default();

        Ok(DirectoryNode {
            name,
            path: PathBuf::new(),
            contents,
        })
    }

    fn collect_directory(
        &self,
        abs_path: &Path,
        rel_path: &str,
        files: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let Some(entries) = self.read_entries(abs_path, rel_path)? else {
            return Ok(());
        };

        let (dirs, others): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|(_, entry)| entry.kind.is_dir());

        for (dir_entry, entry) in others {
            if self.exclusions.excludes(&entry.relative, false) {
                self.record(|s| s.files_excluded += 1);
                continue;
            }
            if !has_allowed_extension(&entry.name) {
                self.record(|s| s.files_skipped_by_extension += 1);
                continue;
            }
            files.push(dir_entry.into_path());
        }

        for (dir_entry, entry) in dirs {
            if self.exclusions.excludes(&entry.relative, true) {
                self.record(|s| s.directories_pruned += 1);
                continue;
            }
            self.collect_directory(dir_entry.path(), &entry.relative, files)?;
        }

        Ok(())
    }

    /// `None` when the directory could not be listed
    fn scan_directory(&self, abs_path: &Path, rel_path: &str) -> Result<Option<Vec<TreeNode>>> {
        let Some(entries) = self.read_entries(abs_path, rel_path)? else {
            return Ok(None);
        };

        let mut contents = Vec::with_capacity(entries.len());
        for (dir_entry, entry) in entries {
            if self.exclusions.excludes(&entry.relative, entry.kind.is_dir()) {
                self.record(|s| match entry.kind {
                    EntryKind::Directory => s.directories_pruned += 1,
                    EntryKind::File => s.files_excluded += 1,
                });
                continue;
            }

            match entry.kind {
                EntryKind::Directory => {
                    // Unreadable directories are dropped from the tree
                    let Some(children) = self.scan_directory(dir_entry.path(), &entry.relative)?
                    else {
                        continue;
                    };
                    contents.push(TreeNode::Directory(DirectoryNode {
                        name: entry.name,
                        path: PathBuf::from(&entry.relative),
                        contents: children,
                    }));
                }
                EntryKind::File => contents.push(TreeNode::File {
                    name: entry.name,
                    path: PathBuf::from(&entry.relative),
                }),
            }
        }

        Ok(Some(contents))
    }

    /// List a directory sorted by name
    ///
    /// Returns `None` for an unreadable directory below the root; an
    /// unreadable root is an error.
    fn read_entries(
        &self,
        abs_path: &Path,
        rel_path: &str,
    ) -> Result<Option<Vec<(DirEntry, FileSystemEntry)>>> {
        let mut entries = Vec::new();

        for item in WalkDir::new(abs_path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            match item {
                Ok(dir_entry) => {
                    let entry = self.describe(&dir_entry, rel_path);
                    self.visit(&entry);
                    entries.push((dir_entry, entry));
                }
                Err(e) if e.depth() == 0 => {
                    if rel_path.is_empty() {
                        return Err(e.into());
                    }
                    warn!("Skipping unreadable directory {}: {}", abs_path.display(), e);
                    self.record(|s| s.unreadable_entries += 1);
                    return Ok(None);
                }
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", abs_path.display(), e);
                    self.record(|s| s.unreadable_entries += 1);
                }
            }
        }

        Ok(Some(entries))
    }

    fn describe(&self, dir_entry: &DirEntry, rel_path: &str) -> FileSystemEntry {
        let name = dir_entry.file_name().to_string_lossy().to_string();
        let relative = if rel_path.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", rel_path, name)
        };
        // Symlinks are not followed and never count as directories
        let kind = if dir_entry.file_type().is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        FileSystemEntry {
            relative,
            name,
            kind,
        }
    }

    fn visit(&self, entry: &FileSystemEntry) {
        self.progress.inc(1);
        let display_name = if entry.name.len() > 40 {
            let tail: String = entry.name.chars().rev().take(37).collect();
            format!("...{}", tail.chars().rev().collect::<String>())
        } else {
            entry.name.clone()
        };
        self.progress
            .set_message(format!("Current entry: {}", display_name));
        self.record(|s| s.entries_visited += 1);
        debug!(path = %entry.relative, kind = ?entry.kind, "visit");
    }

    fn record(&self, update: impl FnOnce(&mut WalkStatistics)) {
        let mut stats = self
            .statistics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        update(&mut stats);
    }
}

/// Absolute form of `root` with `.` and `..` folded, without resolving symlinks
fn absolute_root(root: &Path) -> io::Result<PathBuf> {
    let joined = if root.is_absolute() {
        root.to_path_buf()
    } else {
        env::current_dir()?.join(root)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Walk `root` once in the given mode, without progress reporting
pub fn walk(root: &Path, exclusions: &ExclusionSet, mode: WalkMode) -> Result<TraversalResult> {
    Scanner::new(root, exclusions, Arc::new(ProgressBar::hidden()))?.walk(mode)
}
