/*!
 * Writers for the two chronicle artifacts: the concatenated export and the
 * tree index
 */

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::Result;
use crate::report::FileReportInfo;
use crate::types::{DirectoryNode, TreeNode};

/// Fixed header at the top of every export
pub const EXPORT_HEADER: &str = "# Code Chronicle export\n\
# Source text is copied verbatim, including inline comments/docstrings.\n\n";

/// Files read concurrently before their blocks are written
const READ_BATCH_SIZE: usize = 64;

/// Totals for a written export
#[derive(Debug, Clone, Default)]
pub struct ExportStatistics {
    /// Number of file blocks written
    pub files_written: usize,
    /// Total number of lines
    pub total_lines: usize,
    /// Total number of characters
    pub total_chars: usize,
    /// Details for each file, in export order
    pub file_details: Vec<(String, FileReportInfo)>,
}

/// Writes the concatenated export of a list of files
#[derive(Debug, Default)]
pub struct ExportWriter;

impl ExportWriter {
    /// Create a new export writer
    pub fn new() -> Self {
        Self
    }

    /// Write the export to a new file at `output`
    pub fn write_to_file(&self, files: &[PathBuf], output: &Path) -> Result<ExportStatistics> {
        let mut writer = BufWriter::new(File::create(output)?);
        let stats = self.write(files, &mut writer)?;
        writer.flush()?;
        info!(output = %output.display(), files = stats.files_written, "export written");
        Ok(stats)
    }

    /// Write the header and one block per file, in list order
    ///
    /// Content is copied verbatim; invalid UTF-8 is replaced and unreadable
    /// files produce an empty block.
    pub fn write<W: Write>(&self, files: &[PathBuf], out: &mut W) -> io::Result<ExportStatistics> {
        let mut stats = ExportStatistics::default();
        out.write_all(EXPORT_HEADER.as_bytes())?;

        for batch in files.chunks(READ_BATCH_SIZE) {
            // par_iter keeps the batch order on collect
            let contents: Vec<String> = batch.par_iter().map(|path| read_lossy(path)).collect();

            for (path, content) in batch.iter().zip(contents) {
                let display = path.display().to_string();
                writeln!(out, "########## {} ##########", display)?;
                out.write_all(content.as_bytes())?;
                out.write_all(b"\n\n")?;

                let info = FileReportInfo {
                    lines: content.lines().count(),
                    chars: content.chars().count(),
                    bytes: content.len() as u64,
                };
                stats.files_written += 1;
                stats.total_lines += info.lines;
                stats.total_chars += info.chars;
                stats.file_details.push((display, info));
            }
        }

        Ok(stats)
    }
}

fn read_lossy(path: &Path) -> String {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            String::new()
        }
    }
}

/// Writes the connector-drawn tree index
#[derive(Debug, Default)]
pub struct IndexWriter;

impl IndexWriter {
    /// Create a new index writer
    pub fn new() -> Self {
        Self
    }

    /// Render the tree to a string
    pub fn format(&self, root: &DirectoryNode) -> String {
        let mut output = format!("{}/\n", root.name);
        self.format_children(&root.contents, "", &mut output);
        output
    }

    /// Write the tree to `out`
    pub fn write<W: Write>(&self, root: &DirectoryNode, out: &mut W) -> io::Result<()> {
        out.write_all(self.format(root).as_bytes())
    }

    /// Write the tree to a new file at `output`
    pub fn write_to_file(&self, root: &DirectoryNode, output: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(output)?);
        self.write(root, &mut writer)?;
        writer.flush()?;
        info!(output = %output.display(), "index written");
        Ok(())
    }

    fn format_children(&self, children: &[TreeNode], prefix: &str, output: &mut String) {
        for (idx, node) in children.iter().enumerate() {
            let is_last = idx + 1 == children.len();
            let connector = if is_last { "└── " } else { "├── " };

            output.push_str(prefix);
            output.push_str(connector);
            output.push_str(node.name());

            match node {
                TreeNode::Directory(dir) => {
                    output.push_str("/\n");
                    let child_prefix = if is_last {
                        format!("{}    ", prefix)
                    } else {
                        format!("{}│   ", prefix)
                    };
                    self.format_children(&dir.contents, &child_prefix, output);
                }
                TreeNode::File { .. } => output.push('\n'),
            }
        }
    }
}
