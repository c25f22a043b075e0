//! Output formatting for CLI operations.

use serde_json::json;

use arcanon::progress::format_bytes_iec;
use arcanon::{Error, PipelineReport};

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats a successful run
    fn format_report(&self, report: &PipelineReport) -> String;

    /// Formats a failed run
    fn format_error(&self, error: &Error) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_report(&self, report: &PipelineReport) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Extracted {} files ({}) from {} archive\n",
            report.extract.files_extracted,
            format_bytes_iec(report.extract.bytes_extracted),
            report.extract.format
        ));
        output.push_str(&format!(
            "Rewrote {} of {} files: {} IP, {} computer name, {} user name replacements\n",
            report.rewrite.files_changed,
            report.rewrite.files_scanned,
            report.rewrite.matches.ip,
            report.rewrite.matches.computer_name,
            report.rewrite.matches.user_name
        ));
        output.push_str(&format!(
            "Wrote {} ({} entries)\n",
            report.output_path.display(),
            report.repack.entries_written
        ));

        if !report.repack.failures.is_empty() {
            output.push_str(&format!("\nSkipped {} files:\n", report.repack.failures.len()));
            for failure in &report.repack.failures {
                output.push_str(&format!("  {}: {}\n", failure.path.display(), failure.message));
            }
        }

        if let Some(dir) = &report.kept_work_dir {
            output.push_str(&format!("Working directory kept at {}\n", dir.display()));
        }

        output
    }

    fn format_error(&self, error: &Error) -> String {
        format!("Error: {}\n", error)
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &PipelineReport) -> String {
        let obj = json!({
            "success": true,
            "output_path": report.output_path.display().to_string(),
            "format": report.extract.format.name(),
            "files_extracted": report.extract.files_extracted,
            "bytes_extracted": report.extract.bytes_extracted,
            "files_scanned": report.rewrite.files_scanned,
            "files_changed": report.rewrite.files_changed,
            "matches": {
                "ip": report.rewrite.matches.ip,
                "computer_name": report.rewrite.matches.computer_name,
                "user_name": report.rewrite.matches.user_name,
            },
            "entries_written": report.repack.entries_written,
            "failures": report.repack.failures.iter().map(|f| json!({
                "path": f.path.display().to_string(),
                "error": f.message,
            })).collect::<Vec<_>>(),
            "kept_work_dir": report.kept_work_dir.as_ref().map(|p| p.display().to_string()),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_error(&self, error: &Error) -> String {
        let obj = json!({
            "success": false,
            "stage": error.stage().map(|s| s.as_str()),
            "error": error.root_cause().to_string(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates a formatter based on the output format
pub fn create_formatter(format: crate::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        crate::OutputFormat::Human => Box::new(HumanFormatter),
        crate::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_carries_stage() {
        let err = Error::UnsupportedFormat {
            path: "a.7z".into(),
        }
        .in_stage(arcanon::Stage::Extracting);

        let out = JsonFormatter.format_error(&err);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["stage"], "extracting");
    }

    #[test]
    fn test_human_error() {
        let err = Error::OutputExists {
            path: "new_a.zip".into(),
        };
        assert!(HumanFormatter.format_error(&err).contains("new_a.zip"));
    }
}
