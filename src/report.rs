/*!
 * Reporting functionality for chronicle
 *
 * Renders a summary of a generation run, either as console tables using the
 * tabled library or as JSON.
 */

use std::collections::BTreeMap;
use std::time::Duration;

use clap::ValueEnum;
use serde::Serialize;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::error::Result;
use crate::scanner::WalkStatistics;
use crate::utils::format_file_size;

/// Information about an exported file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileReportInfo {
    /// Number of lines in the file
    pub lines: usize,
    /// Number of characters in the file
    pub chars: usize,
    /// Size of the decoded text in bytes
    pub bytes: u64,
}

/// Summary of a generation run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Scan root
    pub root: String,
    /// Export file, if one was written
    pub export_file: Option<String>,
    /// Index file, if one was written
    pub index_file: Option<String>,
    /// Time taken to scan and write
    #[serde(serialize_with = "serialize_millis", rename = "duration_ms")]
    pub duration: Duration,
    /// Number of files exported
    pub files_exported: usize,
    /// Total number of exported lines
    pub total_lines: usize,
    /// Total number of exported characters
    pub total_chars: usize,
    /// Directories shown in the index
    pub index_directories: usize,
    /// Files shown in the index
    pub index_files: usize,
    /// Walk counters
    pub walk: WalkStatistics,
    /// Details for each exported file
    pub file_details: BTreeMap<String, FileReportInfo>,
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Format of the report output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// Console table output
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// Print nothing
    None,
}

/// Report generator for run results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Format a number with human-readable units
    fn format_number(&self, num: usize) -> String {
        if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }

    /// Generate a report string
    pub fn generate_report(&self, report: &RunReport) -> Result<String> {
        match self.format {
            ReportFormat::Table => Ok(self.generate_console_report(report)),
            ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            ReportFormat::None => Ok(String::new()),
        }
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &RunReport) -> Result<()> {
        if self.format != ReportFormat::None {
            println!("\n{}", self.generate_report(report)?);
        }
        Ok(())
    }

    // Keep the last path segments that fit in `max_len`
    fn format_path(&self, path: &str, max_len: usize) -> String {
        if path.chars().count() <= max_len {
            return path.to_string();
        }

        let mut segments = Vec::new();
        let mut current_len = 3; // "..."
        for part in path.rsplit('/') {
            let part_len = part.chars().count() + 1;
            if current_len + part_len > max_len {
                break;
            }
            segments.push(part);
            current_len += part_len;
        }

        if segments.is_empty() {
            let tail: String = path.chars().rev().take(max_len - 3).collect();
            return format!("...{}", tail.chars().rev().collect::<String>());
        }

        let mut result = String::from("...");
        for part in segments.iter().rev() {
            result.push('/');
            result.push_str(part);
        }
        result
    }

    fn create_summary_table(&self, report: &RunReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let mut rows = vec![SummaryRow {
            key: "📂 Root".to_string(),
            value: report.root.clone(),
        }];

        if let Some(export) = &report.export_file {
            rows.push(SummaryRow {
                key: "📄 Export File".to_string(),
                value: export.clone(),
            });
            rows.push(SummaryRow {
                key: "📝 Files Exported".to_string(),
                value: format!(
                    "{} ({} lines)",
                    self.format_number(report.files_exported),
                    self.format_number(report.total_lines)
                ),
            });
        }

        if let Some(index) = &report.index_file {
            rows.push(SummaryRow {
                key: "🌳 Index File".to_string(),
                value: index.clone(),
            });
            rows.push(SummaryRow {
                key: "🗂️ Index Entries".to_string(),
                value: format!(
                    "{} directories, {} files",
                    self.format_number(report.index_directories),
                    self.format_number(report.index_files)
                ),
            });
        }

        rows.push(SummaryRow {
            key: "✂️ Pruned Directories".to_string(),
            value: self.format_number(report.walk.directories_pruned),
        });

        if report.walk.unreadable_entries > 0 {
            rows.push(SummaryRow {
                key: "⚠️ Unreadable Entries".to_string(),
                value: self.format_number(report.walk.unreadable_entries),
            });
        }

        rows.push(SummaryRow {
            key: "⏱️ Process Time".to_string(),
            value: format!("{:.4?}", report.duration),
        });

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn create_files_table(&self, report: &RunReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Lines")]
            lines: String,

            #[tabled(rename = "Size")]
            size: String,
        }

        // Largest first, ties by path
        let mut files: Vec<_> = report.file_details.iter().collect();
        files.sort_by(|(pa, a), (pb, b)| b.chars.cmp(&a.chars).then_with(|| pa.cmp(pb)));
        files.truncate(10);

        let rows: Vec<FileRow> = files
            .iter()
            .map(|(path, info)| FileRow {
                path: self.format_path(path, 60),
                lines: self.format_number(info.lines),
                size: format_file_size(info.bytes),
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn generate_console_report(&self, report: &RunReport) -> String {
        let summary_table = self.create_summary_table(report);
        let summary_title = "✅  CHRONICLE COMPLETE";

        if report.file_details.is_empty() {
            return format!("{}\n{}", summary_title, summary_table);
        }

        let files_title = if report.file_details.len() > 10 {
            "📋  TOP 10 LARGEST EXPORTED FILES"
        } else {
            "📋  EXPORTED FILES"
        };
        format!(
            "{}\n{}\n\n{}\n{}",
            files_title,
            self.create_files_table(report),
            summary_title,
            summary_table
        )
    }
}
