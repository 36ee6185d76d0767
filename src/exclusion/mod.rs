/*!
 * Exclusion rules: built-in defaults, ignore-file patterns and caller extras
 */

mod pattern;

pub use pattern::Pattern;

use std::fs;
use std::io;
use std::path::{Component, Path};

use tracing::{debug, warn};

/// Name of the ignore file read from the scan root
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// Version-control metadata directory, always excluded
pub const VCS_DIR_PATTERN: &str = ".git/";

/// Where the ignore-file patterns come from
#[derive(Debug, Clone, Default)]
pub enum IgnoreSource<'a> {
    /// `<root>/.gitignore`, if present
    #[default]
    Root,
    /// A specific file, possibly outside the root
    File(&'a Path),
    /// Skip ignore files entirely
    Disabled,
}

/// The set of patterns that decides which entries are left out of a scan
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    patterns: Vec<Pattern>,
}

impl ExclusionSet {
    /// Build the exclusion set for `root`
    ///
    /// Seeds the built-in patterns (`artifact_name` and `.git/`), then the
    /// patterns of `<root>/.gitignore`, then `extra_ignores` verbatim.
    pub fn build(root: &Path, artifact_name: &str, extra_ignores: &[String]) -> Self {
        Self::build_with_source(root, artifact_name, extra_ignores, IgnoreSource::Root)
    }

    /// Same as [`ExclusionSet::build`], reading ignore patterns from `source`
    pub fn build_with_source(
        root: &Path,
        artifact_name: &str,
        extra_ignores: &[String],
        source: IgnoreSource<'_>,
    ) -> Self {
        let mut patterns = vec![Pattern::parse(artifact_name), Pattern::parse(VCS_DIR_PATTERN)];

        let ignore_file = match source {
            IgnoreSource::Root => Some(root.join(IGNORE_FILE_NAME)),
            IgnoreSource::File(path) => Some(path.to_path_buf()),
            IgnoreSource::Disabled => None,
        };

        if let Some(path) = ignore_file {
            match fs::read(&path) {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    let parsed = parse_ignore_lines(&text);
                    debug!(file = %path.display(), count = parsed.len(), "loaded ignore patterns");
                    patterns.extend(parsed);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to read ignore file {}: {}", path.display(), e),
            }
        }

        patterns.extend(extra_ignores.iter().map(|raw| Pattern::parse(raw)));

        Self { patterns }
    }

    /// Build a set from explicit patterns only, without built-ins or files
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| Pattern::parse(p.as_ref()))
                .collect(),
        }
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Check whether `path` below `root` is excluded
    ///
    /// The entry type is read from disk without following symlinks. An entry
    /// is excluded when it, or any directory between it and the root, matches
    /// a pattern. The root itself and paths outside it are never excluded.
    pub fn is_excluded(&self, path: &Path, root: &Path) -> bool {
        let Some(relative) = relative_path(path, root) else {
            return false;
        };
        if relative.is_empty() {
            return false;
        }

        let is_dir = fs::symlink_metadata(path)
            .map(|m| m.is_dir())
            .unwrap_or(false);

        let ancestor_excluded = relative
            .match_indices('/')
            .any(|(idx, _)| self.excludes(&relative[..idx], true));

        ancestor_excluded || self.excludes(&relative, is_dir)
    }

    /// Check a single entry whose ancestors are already known to be included
    pub fn excludes(&self, relative: &str, is_dir: bool) -> bool {
        match self.patterns.iter().find(|p| p.matches(relative, is_dir)) {
            Some(pattern) => {
                debug!(path = relative, pattern = %pattern, "excluded");
                true
            }
            None => false,
        }
    }
}

/// Parse the lines of an ignore file into patterns
///
/// Blank lines, `#` comments and `!` negations are dropped.
pub fn parse_ignore_lines(text: &str) -> Vec<Pattern> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with('#'))
        .filter(|line| !line.starts_with('!'))
        .map(Pattern::parse)
        .collect()
}

/// `/`-joined path of `path` relative to `root`, or `None` outside the root
pub fn relative_path(path: &Path, root: &Path) -> Option<String> {
    let stripped = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = stripped
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}
