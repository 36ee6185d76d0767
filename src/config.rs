/*!
 * Configuration handling for chronicle
 */

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::error::Result;
use crate::report::ReportFormat;
use crate::utils::{DEFAULT_ARTIFACT_NAME, DEFAULT_OUTPUT_DIR};

/// Command-line arguments for chronicle
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "chronicle",
    version = env!("CARGO_PKG_VERSION"),
    about = "Export gitignore-filtered source files and a tree index of a directory",
    long_about = "Scans a folder, skips everything matched by .gitignore and the built-in rules, and writes a concatenated export of the remaining source files plus an indented tree index of the surviving hierarchy."
)]
pub struct Args {
    /// Folder to scan
    #[clap(default_value = ".")]
    pub folder: String,

    /// Generate the concatenated script export
    #[clap(long)]
    pub summary: bool,

    /// Generate the file index
    #[clap(long)]
    pub index: bool,

    /// Output directory for generated files
    #[clap(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: String,

    /// Comma-separated list of extra patterns to ignore
    #[clap(long, value_delimiter = ',')]
    pub ignore_patterns: Vec<String>,

    /// Do not read the .gitignore file at the root
    #[clap(long)]
    pub no_gitignore: bool,

    /// Path to custom ignore file used instead of <folder>/.gitignore
    #[clap(long)]
    pub gitignore_path: Option<String>,

    /// Name of chronicle's own artifacts, always excluded
    #[clap(long, default_value = DEFAULT_ARTIFACT_NAME)]
    pub artifact_name: String,

    /// Number of threads used to read exported files
    #[clap(long, default_value = "4")]
    pub threads: usize,

    /// Format of the summary printed after a run
    #[clap(long, value_enum, default_value_t = ReportFormat::default())]
    pub report: ReportFormat,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Target directory to process
    pub target_dir: PathBuf,

    /// Directory receiving the generated files
    pub output_dir: PathBuf,

    /// Write the concatenated export
    pub export: bool,

    /// Write the tree index
    pub index: bool,

    /// Extra patterns appended to the exclusion set
    pub ignore_patterns: Vec<String>,

    /// Whether to read an ignore file
    pub respect_gitignore: bool,

    /// Path to custom ignore file
    pub gitignore_path: Option<PathBuf>,

    /// Name of the tool's own artifacts
    pub artifact_name: String,

    /// Number of threads to use for reading files
    pub num_threads: usize,

    /// Fixed timestamp for output names; the current local time when `None`
    pub timestamp: Option<String>,

    /// Report format
    pub report: ReportFormat,
}

impl Config {
    /// Create configuration from command-line arguments
    ///
    /// Without `--summary` or `--index` both artifacts are generated.
    pub fn from_args(args: Args) -> Self {
        let (export, index) = match (args.summary, args.index) {
            (false, false) => (true, true),
            selected => selected,
        };

        Self {
            target_dir: PathBuf::from(args.folder),
            output_dir: PathBuf::from(args.output),
            export,
            index,
            ignore_patterns: args.ignore_patterns,
            respect_gitignore: !args.no_gitignore,
            gitignore_path: args.gitignore_path.map(PathBuf::from),
            artifact_name: args.artifact_name,
            num_threads: args.threads,
            timestamp: None,
            report: args.report,
        }
    }

    /// Configuration for scanning `target_dir` with defaults
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            export: true,
            index: true,
            ignore_patterns: Vec::new(),
            respect_gitignore: true,
            gitignore_path: None,
            artifact_name: DEFAULT_ARTIFACT_NAME.to_string(),
            num_threads: 4,
            timestamp: None,
            report: ReportFormat::default(),
        }
    }

    /// Validate the configuration
    ///
    /// Runs before anything is written, so a bad root leaves no output behind.
    pub fn validate(&self) -> Result<()> {
        crate::ensure!(
            self.target_dir.is_dir(),
            PathNotFound,
            "Target directory not found: {}",
            self.target_dir.display()
        );

        if let Some(path) = &self.gitignore_path {
            crate::ensure!(
                path.is_file(),
                PathNotFound,
                "Custom ignore file not found: {}",
                path.display()
            );
        }

        crate::ensure!(
            self.export || self.index,
            Config,
            "Nothing to generate: enable the export or the index"
        );
        crate::ensure!(
            self.num_threads > 0,
            InvalidArgument,
            "Thread count must be at least 1"
        );
        crate::ensure!(
            !self.artifact_name.trim().is_empty(),
            InvalidArgument,
            "Artifact name must not be empty"
        );

        if self.output_dir.exists() && !self.output_dir.is_dir() {
            crate::bail!(
                Config,
                "Output path exists and is not a directory: {}",
                self.output_dir.display()
            );
        }

        Ok(())
    }
}
