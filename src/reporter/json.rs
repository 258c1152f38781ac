//! JSON report generator.

use crate::config::Config;
use crate::error::{Result, TerranotateError};
use crate::reporter::ReportGenerator;
use crate::types::{Resource, ValidationError, ValidationResult};
use serde::Serialize;

/// JSON report generator.
pub struct JsonReporter {
    /// Whether to pretty-print the output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty,
        }
    }
}

impl JsonReporter {
    /// Serialize parsed resources.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn resources(&self, resources: &[Resource]) -> Result<String> {
        self.to_json(&resources)
    }

    fn to_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };

        json.map_err(|e| {
            TerranotateError::internal(format!("Failed to serialize JSON report: {e}"), file!(), line!())
        })
    }
}

impl ReportGenerator for JsonReporter {
    fn generate(&self, result: &ValidationResult) -> Result<String> {
        self.to_json(&JsonReport::from(result))
    }
}

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Summary statistics
    pub summary: ReportSummary,
    /// Error-severity violations
    pub errors: &'a [ValidationError],
    /// Warning-severity violations
    pub warnings: &'a [ValidationError],
    /// True iff there are no errors
    pub passed: bool,
}

impl<'a> From<&'a ValidationResult> for JsonReport<'a> {
    fn from(result: &'a ValidationResult) -> Self {
        Self {
            metadata: ReportMetadata {
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                files_checked: result.files.len(),
            },
            summary: ReportSummary {
                resources_checked: result.resources_checked,
                total_errors: result.errors.len(),
                total_warnings: result.warnings.len(),
                resources_with_violations: result.by_resource().len(),
            },
            errors: &result.errors,
            warnings: &result.warnings,
            passed: result.passed,
        }
    }
}

/// Report metadata.
#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    /// Terranotate version
    pub version: String,
    /// Report generation timestamp
    pub timestamp: String,
    /// Number of files checked
    pub files_checked: usize,
}

/// Report summary.
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    /// Resources validated
    pub resources_checked: usize,
    /// Error-severity violations
    pub total_errors: usize,
    /// Warning-severity violations
    pub total_warnings: usize,
    /// Distinct resources with at least one violation
    pub resources_with_violations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Resource, ViolationKind};
    use std::path::PathBuf;

    fn result() -> ValidationResult {
        let mut resource = Resource::new("aws_vpc", "main", 4, 6);
        resource.file_path = PathBuf::from("network/main.tf");

        let mut result = ValidationResult::default();
        result.files.push(resource.file_path.clone());
        result.record(vec![ValidationError::new(
            &resource,
            4,
            ViolationKind::MissingPrefix {
                prefix: "@metadata".to_string(),
            },
        )]);
        result
    }

    #[test]
    fn test_json_report_structure() {
        let reporter = JsonReporter { pretty: false };
        let json = reporter.generate(&result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["passed"], false);
        assert_eq!(value["metadata"]["files_checked"], 1);
        assert_eq!(value["summary"]["resources_checked"], 1);
        assert_eq!(value["summary"]["total_errors"], 1);

        let error = &value["errors"][0];
        assert_eq!(error["kind"], "missing_prefix");
        assert_eq!(error["prefix"], "@metadata");
        assert_eq!(error["resource_type"], "aws_vpc");
        assert_eq!(error["file"], "network/main.tf");
        assert_eq!(error["severity"], "error");
        assert_eq!(error["message"], "Missing required comment prefix: @metadata");
    }

    #[test]
    fn test_resources_json() {
        let mut resource = Resource::new("aws_vpc", "main", 1, 3);
        resource.attributes.insert("cidr_block".into(), "\"10.0.0.0/16\"".into());

        let json = JsonReporter { pretty: false }.resources(&[resource]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["type"], "aws_vpc");
        assert_eq!(value[0]["attributes"]["cidr_block"], "\"10.0.0.0/16\"");
    }

    #[test]
    fn test_pretty_output_is_multiline() {
        let json = JsonReporter { pretty: true }.generate(&result()).unwrap();
        assert!(json.lines().count() > 1);
    }
}
