/*!
 * Utility functions for chronicle
 */

/// Default directory for generated artifacts, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "chronicle-history";

/// Name of the tool's own artifacts, always excluded from scans
pub const DEFAULT_ARTIFACT_NAME: &str = "chronicle-history";

/// Extensions eligible for the export, compared case-insensitively
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    ".doc", ".txt", ".json", ".py", ".env", ".bat", ".html", ".js", ".css", ".ini",
];

/// Check whether a file name ends with one of [`ALLOWED_EXTENSIONS`]
pub fn has_allowed_extension(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Format a human-readable file size
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
