//! Report generation module.
//!
//! This module renders a [`ValidationResult`] in one of two formats:
//! - Text: human-readable CLI output grouped by resource
//! - JSON: machine-readable structured output
//!
//! # Example
//!
//! ```rust,no_run
//! use terranotate::reporter::Reporter;
//! use terranotate::types::{ReportFormat, ValidationResult};
//! use terranotate::Config;
//!
//! let config = Config::default();
//! let reporter = Reporter::new(&config);
//!
//! let result = ValidationResult::default();
//! let text = reporter.generate(&result, ReportFormat::Text).unwrap();
//! println!("{text}");
//! ```

mod json;
mod text;

use crate::config::Config;
use crate::error::Result;
use crate::types::{ReportFormat, Resource, ValidationResult};
use std::path::Path;

pub use json::{JsonReport, JsonReporter};
pub use text::TextReporter;

/// Report generator that supports multiple output formats.
pub struct Reporter {
    config: Config,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Generate a report in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if report generation fails.
    pub fn generate(&self, result: &ValidationResult, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => JsonReporter::new(&self.config).generate(result),
            ReportFormat::Text => TextReporter::new(&self.config).generate(result),
        }
    }

    /// Render the resources parsed from `path` and their comments.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn resources(&self, path: &Path, resources: &[Resource], format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Json => JsonReporter::new(&self.config).resources(resources),
            ReportFormat::Text => Ok(TextReporter::new(&self.config).resources(path, resources)),
        }
    }
}

/// Trait for report generators.
pub trait ReportGenerator {
    /// Generate a report from a validation result.
    ///
    /// # Errors
    ///
    /// Returns an error if generation fails.
    fn generate(&self, result: &ValidationResult) -> Result<String>;
}
