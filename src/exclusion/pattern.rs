/*!
 * Single gitignore-style pattern and its matching rules
 */

use glob::MatchOptions;

/// `*` and `?` never cross a `/`, matching is case-sensitive and dotfiles
/// need no literal leading dot.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A parsed exclusion pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Text as supplied by the ignore file or caller
    text: String,
    /// Pattern body with anchor and trailing slashes removed
    body: String,
    /// Compiled glob; `None` means the body is compared literally
    glob: Option<glob::Pattern>,
    /// Leading `/`: binds to the scan root only
    anchored: bool,
    /// Trailing `/`: matches directory entries only
    directory_only: bool,
    /// Body contains an internal `/`
    has_separator: bool,
}

impl Pattern {
    /// Parse a raw pattern string
    ///
    /// Backslashes are treated as separators and trailing whitespace is
    /// ignored. A body that is not a valid glob degrades to literal equality.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.replace('\\', "/");
        let normalized = normalized.trim_end();

        let anchored = normalized.starts_with('/');
        let directory_only = normalized.ends_with('/');
        let body = normalized.trim_matches('/').to_string();
        let has_separator = body.contains('/');
        let glob = glob::Pattern::new(&body).ok();

        Self {
            text: raw.to_string(),
            body,
            glob,
            anchored,
            directory_only,
            has_separator,
        }
    }

    /// The pattern as originally written
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn is_directory_only(&self) -> bool {
        self.directory_only
    }

    pub fn has_separator(&self) -> bool {
        self.has_separator
    }

    /// Whether the body compiled as a glob
    pub fn is_glob(&self) -> bool {
        self.glob.is_some()
    }

    /// Check whether `relative` (a `/`-separated path below the scan root)
    /// matches this pattern
    pub fn matches(&self, relative: &str, is_dir: bool) -> bool {
        if self.body.is_empty() {
            return false;
        }
        if self.directory_only && !is_dir {
            return false;
        }

        let relative = relative.trim_matches('/');
        if relative.is_empty() {
            return false;
        }

        if self.anchored {
            return self.matches_text(relative);
        }

        if !self.has_separator {
            return relative
                .split('/')
                .any(|segment| self.matches_text(segment));
        }

        // Every suffix that starts on a segment boundary
        std::iter::once(relative)
            .chain(
                relative
                    .match_indices('/')
                    .map(|(idx, _)| &relative[idx + 1..]),
            )
            .any(|suffix| self.matches_text(suffix))
    }

    fn matches_text(&self, candidate: &str) -> bool {
        match &self.glob {
            Some(glob) => glob.matches_with(candidate, MATCH_OPTIONS),
            None => candidate == self.body,
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
