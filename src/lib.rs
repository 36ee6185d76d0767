/*!
 * Chronicle - export the source files of a directory and index its tree
 *
 * This library decides which entries of a directory tree are excluded by
 * gitignore-style rules and, from a single pruned traversal, produces a
 * concatenated text export of the included files and an indented tree
 * listing of the surviving hierarchy.
 */

pub mod config;
pub mod error;
pub mod exclusion;
pub mod generate;
pub mod report;
pub mod scanner;
pub mod types;
pub mod utils;
pub mod writer;

#[cfg(test)]
mod tests;

// Re-export main components for easier access
pub use config::Config;
pub use error::{ChronicleError, Result};
pub use exclusion::{ExclusionSet, IgnoreSource, Pattern};
pub use generate::{generate, GeneratedOutputs, GenerationSummary};
pub use report::{FileReportInfo, ReportFormat, Reporter, RunReport};
pub use scanner::{walk, Scanner, WalkStatistics};
pub use types::{
    DirectoryNode, EntryKind, FileSystemEntry, TraversalResult, TreeNode, WalkMode,
};
pub use utils::{has_allowed_extension, ALLOWED_EXTENSIONS};
pub use writer::{ExportWriter, IndexWriter};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
