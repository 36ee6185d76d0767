/*!
 * One generation run: validate, build exclusions, walk, write the artifacts
 */

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use indicatif::ProgressBar;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, ResultExt};
use crate::exclusion::{relative_path, ExclusionSet, IgnoreSource};
use crate::report::RunReport;
use crate::scanner::{Scanner, WalkStatistics};
use crate::writer::{ExportStatistics, ExportWriter, IndexWriter};

/// Timestamp format embedded in output file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Paths of the files written by a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedOutputs {
    /// Concatenated export
    pub export_file: Option<PathBuf>,
    /// Tree index
    pub index_file: Option<PathBuf>,
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    /// Canonical scan root
    pub root: PathBuf,
    /// Written files
    pub outputs: GeneratedOutputs,
    /// Export totals, when the export was written
    pub export: Option<ExportStatistics>,
    /// (directories, files) in the index, when the index was written
    pub index_entries: Option<(usize, usize)>,
    /// Walk counters
    pub walk: WalkStatistics,
    /// Time taken to scan and write
    pub duration: Duration,
}

impl GenerationSummary {
    /// Convert into a printable report
    pub fn to_report(&self) -> RunReport {
        let export = self.export.clone().unwrap_or_default();
        let (index_directories, index_files) = self.index_entries.unwrap_or_default();

        RunReport {
            root: self.root.display().to_string(),
            export_file: self
                .outputs
                .export_file
                .as_ref()
                .map(|p| p.display().to_string()),
            index_file: self
                .outputs
                .index_file
                .as_ref()
                .map(|p| p.display().to_string()),
            duration: self.duration,
            files_exported: export.files_written,
            total_lines: export.total_lines,
            total_chars: export.total_chars,
            index_directories,
            index_files,
            walk: self.walk.clone(),
            file_details: export.file_details.into_iter().collect(),
        }
    }
}

/// File names of the export and the index for a root named `root_name`
pub fn output_file_names(root_name: &str, timestamp: &str) -> (String, String) {
    (
        format!("{}_scripts-list_{}.txt", root_name, timestamp),
        format!("{}_file-index_{}.txt", root_name, timestamp),
    )
}

/// Patterns that keep `output_dir` out of a scan of `root`
///
/// An output directory under the root is excluded as an anchored directory.
/// When it is the root itself, the generated file names are excluded instead.
pub fn self_exclusions(root: &Path, output_dir: &Path) -> io::Result<Vec<String>> {
    let output_dir = resolve_path(output_dir)?;
    let Some(relative) = relative_path(&output_dir, root) else {
        return Ok(Vec::new());
    };

    if relative.is_empty() {
        return Ok(vec![
            "/*_scripts-list_*.txt".to_string(),
            "/*_file-index_*.txt".to_string(),
        ]);
    }
    // Directory names may contain glob metacharacters
    let escaped: Vec<String> = relative.split('/').map(glob::Pattern::escape).collect();
    Ok(vec![format!("/{}/", escaped.join("/"))])
}

/// Absolute form of `path` with symlinks resolved as far as it exists
fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        match fs::canonicalize(existing) {
            Ok(resolved) => {
                return Ok(missing
                    .iter()
                    .rev()
                    .fold(resolved, |acc: PathBuf, part| acc.join(part)))
            }
            Err(e) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    existing = parent;
                }
                _ => return Err(e),
            },
        }
    }
}

/// Run a full generation for `config`
///
/// The root is validated and walked before the output directory or any
/// output file is created.
pub fn generate(config: &Config, progress: Arc<ProgressBar>) -> Result<GenerationSummary> {
    let start_time = Instant::now();
    config.validate()?;

    let root = fs::canonicalize(&config.target_dir)?;
    let mut extra_ignores = config.ignore_patterns.clone();
    extra_ignores.extend(self_exclusions(&root, &config.output_dir)?);
    debug!(?extra_ignores, "extra ignore patterns");

    let source = match (&config.gitignore_path, config.respect_gitignore) {
        (_, false) => IgnoreSource::Disabled,
        (Some(path), true) => IgnoreSource::File(path.as_path()),
        (None, true) => IgnoreSource::Root,
    };
    let exclusions =
        ExclusionSet::build_with_source(&root, &config.artifact_name, &extra_ignores, source);

    let scanner = Scanner::new(&config.target_dir, &exclusions, progress)?;
    let files = if config.export {
        scanner.progress.set_prefix("Collecting");
        Some(scanner.collect_files()?)
    } else {
        None
    };
    let tree = if config.index {
        scanner.progress.set_prefix("Indexing");
        Some(scanner.build_tree()?)
    } else {
        None
    };

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let timestamp = config
        .timestamp
        .clone()
        .unwrap_or_else(|| Local::now().format(TIMESTAMP_FORMAT).to_string());
    let root_name = root
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let (export_name, index_name) = output_file_names(&root_name, &timestamp);

    let mut outputs = GeneratedOutputs::default();
    let mut export = None;
    let mut index_entries = None;

    if let Some(files) = files {
        scanner.progress.set_prefix("Exporting");
        let path = config.output_dir.join(export_name);
        export = Some(ExportWriter::new().write_to_file(&files, &path)?);
        outputs.export_file = Some(path);
    }

    if let Some(tree) = tree {
        let path = config.output_dir.join(index_name);
        IndexWriter::new().write_to_file(&tree, &path)?;
        index_entries = Some(tree.count_entries());
        outputs.index_file = Some(path);
    }

    info!(root = %root.display(), "generation finished");

    Ok(GenerationSummary {
        walk: scanner.get_statistics(),
        root,
        outputs,
        export,
        index_entries,
        duration: start_time.elapsed(),
    })
}
