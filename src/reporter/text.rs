//! Plain text report generator.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::ReportGenerator;
use crate::types::{FieldMap, FieldValue, Resource, Severity, StructuredComment, ValidationError, ValidationResult, CONTENT_FIELD};
use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use std::path::Path;

/// Text report generator for CLI output.
pub struct TextReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
}

impl TextReporter {
    /// Create a new text reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            use_colors: config.output.colored,
            verbose: config.output.verbose,
        }
    }
}

impl ReportGenerator for TextReporter {
    fn generate(&self, result: &ValidationResult) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header());
        output.push('\n');

        output.push_str(&self.format_summary(result));
        output.push('\n');

        if !result.errors.is_empty() || !result.warnings.is_empty() {
            output.push_str(&self.format_violations(result));
            output.push('\n');
            output.push_str(&self.format_resources(result));
            output.push('\n');
        }

        output.push_str(&self.format_footer(result));

        Ok(output)
    }
}

impl TextReporter {
    /// List resources with their structured comments.
    #[must_use]
    pub fn resources(&self, path: &Path, resources: &[Resource]) -> String {
        let mut output = format!("Found {} resources in {}\n", resources.len(), path.display());

        for resource in resources {
            let heading = format!(
                "{} (lines {}-{})",
                resource.address(),
                resource.start_line,
                resource.end_line
            );
            if self.use_colors {
                output.push_str(&format!("\n{}\n", heading.bright_white().bold()));
            } else {
                output.push_str(&format!("\n{heading}\n"));
            }

            self.push_comments(&mut output, "Preceding comments", &resource.preceding_comments);
            self.push_comments(&mut output, "Inline comments", &resource.inline_comments);
        }

        output
    }

    fn push_comments(&self, output: &mut String, title: &str, comments: &[StructuredComment]) {
        if comments.is_empty() {
            return;
        }

        if self.use_colors {
            output.push_str(&format!("  {}\n", title.bright_cyan()));
        } else {
            output.push_str(&format!("  {title}\n"));
        }

        for comment in comments {
            output.push_str(&format!(
                "    [lines {}-{}] {}\n",
                comment.line, comment.end_line, comment.prefix
            ));
            push_fields(output, &comment.fields, 6);
        }
    }

    fn format_header(&self) -> String {
        let title = "Terranotate Validation";
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

        if self.use_colors {
            format!(
                "\n{} {} {}\n{}\n",
                title.bright_white().bold(),
                version.dimmed(),
                format!("({timestamp})").dimmed(),
                "=".repeat(80).bright_blue(),
            )
        } else {
            format!("\n{title} {version} ({timestamp})\n{}\n", "=".repeat(80))
        }
    }

    fn section_title(&self, title: &str) -> String {
        let title = if self.use_colors {
            title.bright_cyan().bold().to_string()
        } else {
            title.to_string()
        };
        format!("\n{title}\n{}\n", "-".repeat(80))
    }

    fn format_summary(&self, result: &ValidationResult) -> String {
        let mut output = self.section_title("Summary");

        let errors = result.errors.len();
        let warnings = result.warnings.len();
        let error_label = if errors == 1 { "Error" } else { "Errors" };
        let warning_label = if warnings == 1 { "Warning" } else { "Warnings" };

        if self.use_colors {
            output.push_str(&format!(
                "  {} {error_label} | {} {warning_label}\n",
                errors.to_string().red().bold(),
                warnings.to_string().yellow().bold(),
            ));
        } else {
            output.push_str(&format!("  {errors} {error_label} | {warnings} {warning_label}\n"));
        }

        output.push_str(&format!(
            "  {} resources | {} files\n",
            result.resources_checked,
            result.files.len()
        ));

        output
    }

    /// Violations grouped by resource address.
    fn format_violations(&self, result: &ValidationResult) -> String {
        let mut output = self.section_title("Violations");

        for (address, violations) in result.by_resource() {
            let location = violations
                .first()
                .map(|v| location(v))
                .unwrap_or_default();

            if self.use_colors {
                output.push_str(&format!("\n  {} {}\n", address.bold(), location.dimmed()));
            } else {
                output.push_str(&format!("\n  {address} {location}\n"));
            }

            for violation in violations {
                output.push_str(&format!(
                    "    [{}] {}",
                    self.severity_label(violation.severity),
                    violation.message
                ));
                if self.verbose {
                    output.push_str(&format!(" (line {})", violation.line));
                }
                output.push('\n');
            }
        }

        output
    }

    fn severity_label(&self, severity: Severity) -> String {
        let label = severity.to_string();
        if !self.use_colors {
            return label;
        }
        match severity {
            Severity::Error => label.red().to_string(),
            Severity::Warning => label.yellow().to_string(),
        }
    }

    /// Per-resource violation counts.
    fn format_resources(&self, result: &ValidationResult) -> String {
        let mut output = self.section_title("Resources");

        let grouped = result.by_resource();
        let failing = grouped.len();
        let passing = result.resources_checked.saturating_sub(failing);
        if passing > 0 {
            let summary = format!("{failing} with issues, {passing} passing");
            if self.use_colors {
                output.push_str(&format!("  {}\n\n", summary.dimmed()));
            } else {
                output.push_str(&format!("  {summary}\n\n"));
            }
        }

        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::UTF8_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Resource", "File", "Line", "Errors", "Warnings"]);

        for (address, violations) in &grouped {
            let errors = violations.iter().filter(|v| v.severity == Severity::Error).count();
            let warnings = violations.len() - errors;
            let first = violations.first();

            let file = first
                .and_then(|v| v.file.as_deref())
                .map_or_else(|| "-".to_string(), |f| contextual_path(f, 3));
            let line = first.map_or(0, |v| v.resource_line);

            let errors_cell = if self.use_colors && errors > 0 {
                Cell::new(errors).fg(Color::Red)
            } else {
                Cell::new(errors)
            };
            let warnings_cell = if self.use_colors && warnings > 0 {
                Cell::new(warnings).fg(Color::Yellow)
            } else {
                Cell::new(warnings)
            };

            table.add_row(vec![
                Cell::new(truncate(address, 50)),
                Cell::new(file),
                Cell::new(line),
                errors_cell,
                warnings_cell,
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn format_footer(&self, result: &ValidationResult) -> String {
        let status = if !result.passed {
            let text = format!("FAILED - {} validation error(s)", result.errors.len());
            if self.use_colors {
                format!("✗ {text}").red().bold().to_string()
            } else {
                text
            }
        } else if !result.warnings.is_empty() {
            if self.use_colors {
                "PASSED with warnings".yellow().to_string()
            } else {
                "PASSED with warnings".to_string()
            }
        } else if self.use_colors {
            "✓ PASSED - All resources have valid comments".green().bold().to_string()
        } else {
            "PASSED - All resources have valid comments".to_string()
        };

        format!("\n{status}\n\n")
    }
}

fn push_fields(output: &mut String, fields: &FieldMap, indent: usize) {
    for (key, value) in fields {
        if key == CONTENT_FIELD {
            continue;
        }
        match value {
            FieldValue::Map(nested) => {
                output.push_str(&format!("{:indent$}{key}:\n", ""));
                push_fields(output, nested, indent + 2);
            }
            other => output.push_str(&format!("{:indent$}{key}: {other}\n", "")),
        }
    }
}

fn location(violation: &ValidationError) -> String {
    match &violation.file {
        Some(file) => format!("({}:{})", file.display(), violation.resource_line),
        None => format!("(line {})", violation.resource_line),
    }
}

/// Truncate a string to at most `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Last `depth` components of a path.
/// Example: /home/me/infra/env/prod/main.tf -> env/prod/main.tf
fn contextual_path(path: &Path, depth: usize) -> String {
    let components: Vec<_> = path.components().collect();
    let start = components.len().saturating_sub(depth);

    components[start..]
        .iter()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Resource, ViolationKind};
    use std::path::PathBuf;

    fn plain() -> TextReporter {
        TextReporter {
            use_colors: false,
            verbose: false,
        }
    }

    fn failing_result() -> ValidationResult {
        let mut resource = Resource::new("aws_s3_bucket", "logs", 3, 5);
        resource.file_path = PathBuf::from("/work/infra/storage/main.tf");

        let mut result = ValidationResult::default();
        result.files.push(resource.file_path.clone());
        result.record(vec![
            ValidationError::new(
                &resource,
                3,
                ViolationKind::MissingPrefix { prefix: "@metadata".into() },
            ),
            ValidationError::new(
                &resource,
                2,
                ViolationKind::MissingField {
                    prefix: "@config".into(),
                    field: "encrypted".into(),
                },
            ),
        ]);
        result.record(Vec::new());
        result
    }

    #[test]
    fn test_text_report_failing() {
        let text = plain().generate(&failing_result()).unwrap();

        assert!(text.contains("Terranotate Validation"));
        assert!(text.contains("2 Errors | 0 Warnings"));
        assert!(text.contains("2 resources | 1 files"));
        assert!(text.contains("aws_s3_bucket.logs (/work/infra/storage/main.tf:3)"));
        assert!(text.contains("[ERROR] Missing required comment prefix: @metadata"));
        assert!(text.contains("[ERROR] @config: Missing required field 'encrypted'"));
        assert!(text.contains("1 with issues, 1 passing"));
        assert!(text.contains("storage/main.tf"));
        assert!(text.contains("FAILED - 2 validation error(s)"));
    }

    #[test]
    fn test_text_report_passing() {
        let mut result = ValidationResult::default();
        result.record(Vec::new());

        let text = plain().generate(&result).unwrap();
        assert!(text.contains("0 Errors | 0 Warnings"));
        assert!(!text.contains("Violations"));
        assert!(text.contains("PASSED - All resources have valid comments"));
    }

    #[test]
    fn test_verbose_shows_violation_lines() {
        let reporter = TextReporter {
            use_colors: false,
            verbose: true,
        };
        let text = reporter.generate(&failing_result()).unwrap();
        assert!(text.contains("@config: Missing required field 'encrypted' (line 2)"));
    }

    #[test]
    fn test_resource_listing() {
        let mut resource = Resource::new("aws_vpc", "main", 3, 5);
        let mut contact = FieldMap::new();
        contact.insert("email".into(), FieldValue::String("a@b.com".into()));
        let mut fields = FieldMap::new();
        fields.insert("owner".into(), FieldValue::String("platform".into()));
        fields.insert("contact".into(), FieldValue::Map(contact));
        fields.insert(CONTENT_FIELD.into(), FieldValue::String("free text".into()));
        resource.preceding_comments.push(StructuredComment {
            prefix: "@metadata".into(),
            fields,
            raw: String::new(),
            line: 1,
            end_line: 2,
        });

        let text = plain().resources(Path::new("main.tf"), &[resource]);

        assert!(text.starts_with("Found 1 resources in main.tf\n"));
        assert!(text.contains("aws_vpc.main (lines 3-5)"));
        assert!(text.contains("  Preceding comments\n    [lines 1-2] @metadata\n"));
        assert!(text.contains("      contact:\n        email: a@b.com\n"));
        assert!(text.contains("      owner: platform\n"));
        assert!(!text.contains("free text"));
        assert!(!text.contains("Inline comments"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_contextual_path() {
        assert_eq!(
            contextual_path(Path::new("/home/me/infra/env/prod/main.tf"), 3),
            "env/prod/main.tf"
        );
        assert_eq!(contextual_path(Path::new("main.tf"), 3), "main.tf");
    }
}
