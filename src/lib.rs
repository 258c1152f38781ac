//! # Terranotate
//!
//! A Terraform comment annotation parser, schema validator and auto-fixer.
//!
//! Terranotate reads structured annotations written in Terraform comments,
//! such as `# @metadata owner:team-a team:platform`, attaches them to the
//! `resource` blocks they describe, checks them against a YAML schema, and
//! can insert placeholder annotations wherever required ones are missing.
//!
//! ## Features
//!
//! - **Comment parsing**: `#`, `//` and `/* */` comments, `key:value` fields
//!   with type coercion and dotted nesting (`contact.email:a@b.com`)
//! - **Schema validation**: required prefixes and fields, nested groups, and
//!   value constraints (type, pattern, allowed values, length, bounds)
//! - **Auto-fix**: missing annotations are inserted above each resource with
//!   placeholder values, with a backup that `revert` restores
//! - **Documentation**: Markdown tables of annotations per resource type
//! - **Reports**: colored text or JSON
//!
//! ## Example
//!
//! ```rust,no_run
//! use terranotate::{Config, Scanner};
//! use terranotate::validator::ValidationSchema;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let schema = ValidationSchema::from_file(Path::new("schema.yaml"))?;
//!     let scanner = Scanner::new(Config::default(), schema);
//!
//!     let batch = scanner.validate_path(Path::new("./infra"))?;
//!     println!("passed: {}", batch.result.passed);
//!     Ok(())
//! }
//! ```

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod fixer;
pub mod generator;
pub mod parser;
pub mod reporter;
pub mod types;
pub mod validator;
pub mod workspace;

// Re-export commonly used types at crate root
pub use config::Config;
pub use error::{Result, TerranotateError};
pub use fixer::{CommentFixer, FixOutcome};
pub use parser::CommentParser;
pub use types::{
    FieldValue, ReportFormat, Resource, Severity, StructuredComment, ValidationError, ValidationResult,
    ViolationKind,
};
pub use validator::{SchemaValidator, ValidationSchema};
pub use workspace::Batch;

use crate::error::ResultExt;
use std::path::{Path, PathBuf};

/// How `Scanner::fix_path` treats the files it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixMode {
    /// Compute fixes without writing anything
    pub dry_run: bool,
    /// Copy each file to its backup before overwriting it
    pub backup: bool,
}

impl Default for FixMode {
    fn default() -> Self {
        Self {
            dry_run: false,
            backup: true,
        }
    }
}

/// Fixes computed (and, unless dry-running, written) for one file.
#[derive(Debug, Clone)]
pub struct FileFix {
    /// The Terraform file
    pub path: PathBuf,
    /// Patched text and what was fixed in it
    pub outcome: FixOutcome,
    /// Backup written before the file was modified
    pub backup: Option<PathBuf>,
}

/// Outcome of `Scanner::fix_path`.
#[derive(Debug, Default)]
pub struct FixReport {
    /// Files that parsed
    pub files_processed: usize,
    /// Files that received at least one fix
    pub fixed: Vec<FileFix>,
    /// `path: type.name` of resources left unchanged because fixing them
    /// would have detached a comment from its resource
    pub unfixed: Vec<String>,
    /// Validation of the fixed files; absent for dry runs and when nothing
    /// needed fixing
    pub remaining: Option<ValidationResult>,
}

impl FixReport {
    /// Total number of fixes over all files.
    #[must_use]
    pub fn fix_count(&self) -> usize {
        self.fixed.iter().map(|f| f.outcome.fix_count).sum()
    }
}

/// Main entry point tying parsing, validation and fixing together.
///
/// # Example
///
/// ```rust,no_run
/// use terranotate::{Config, FixMode, Scanner};
/// use terranotate::validator::ValidationSchema;
/// use std::path::Path;
///
/// fn main() -> anyhow::Result<()> {
///     let schema = ValidationSchema::from_file(Path::new("schema.yaml"))?;
///     let scanner = Scanner::new(Config::default(), schema);
///
///     let report = scanner.fix_path(Path::new("main.tf"), FixMode::default())?;
///     println!("applied {} fixes", report.fix_count());
///     Ok(())
/// }
/// ```
pub struct Scanner {
    config: Config,
    parser: CommentParser,
    validator: SchemaValidator,
}

impl Scanner {
    /// Create a scanner from a configuration and a loaded schema.
    #[must_use]
    pub fn new(config: Config, schema: ValidationSchema) -> Self {
        let parser = CommentParser::from_config(&config);
        Self {
            config,
            parser,
            validator: SchemaValidator::new(schema),
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The schema in use.
    #[must_use]
    pub fn schema(&self) -> &ValidationSchema {
        self.validator.schema()
    }

    /// Validate every Terraform file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if no file can be found, or if a file fails to parse
    /// while `continue_on_error` is off.
    pub fn validate_path(&self, path: &Path) -> Result<Batch> {
        workspace::validate_path(path, &self.parser, &self.validator, &self.config.scan)
    }

    /// Insert missing annotations into every Terraform file at `path`.
    ///
    /// Each file is fixed using only the violations raised for it. Unless
    /// `mode.dry_run` is set the patched text is written back, after a
    /// backup when `mode.backup` is set, and the path is validated again.
    ///
    /// # Errors
    ///
    /// Returns discovery and parse errors as [`Scanner::validate_path`]
    /// does, and IO errors from reading, backing up or writing a file.
    pub fn fix_path(&self, path: &Path, mode: FixMode) -> Result<FixReport> {
        let batch = self.validate_path(path)?;
        let mut report = FixReport {
            files_processed: batch.files.len(),
            ..Default::default()
        };

        if batch.result.passed {
            tracing::info!(path = %path.display(), "No issues to fix");
            return Ok(report);
        }

        let comment_fixer = CommentFixer::from_config(self.validator.schema(), &self.config);

        for file in &batch.files {
            let errors: Vec<ValidationError> = batch
                .result
                .errors
                .iter()
                .filter(|e| e.is_in_file(&file.path))
                .cloned()
                .collect();
            if errors.is_empty() {
                continue;
            }

            let outcome = match comment_fixer.fix_file(&file.path, &file.resources, &errors) {
                Ok(outcome) => outcome,
                Err(e) if self.config.scan.continue_on_error && e.is_recoverable() => {
                    tracing::warn!(file = %file.path.display(), "failed to fix file, continuing: {}", e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            report.unfixed.extend(
                outcome
                    .unfixed_resources
                    .iter()
                    .map(|address| format!("{}: {address}", file.path.display())),
            );
            if outcome.fix_count == 0 {
                continue;
            }

            let mut backup = None;
            if !mode.dry_run {
                if mode.backup {
                    backup = Some(fixer::create_backup(&file.path, &self.config.fixer.backup_suffix)?);
                }
                std::fs::write(&file.path, &outcome.content).with_path(&file.path)?;
                tracing::info!(
                    file = %file.path.display(),
                    fixes = outcome.fix_count,
                    "Fixes applied"
                );
            }

            report.fixed.push(FileFix {
                path: file.path.clone(),
                outcome,
                backup,
            });
        }

        if !mode.dry_run && !report.fixed.is_empty() {
            report.remaining = Some(self.validate_path(path)?.result);
        }

        Ok(report)
    }

    /// Render Markdown documentation for the resources at `path`.
    ///
    /// # Errors
    ///
    /// Returns discovery and parse errors as [`Scanner::validate_path`] does.
    pub fn generate_docs(&self, path: &Path, module_name: &str) -> Result<String> {
        let (files, _skipped) = workspace::parse_path(path, &self.parser, &self.config.scan)?;
        let resources: Vec<Resource> = files.into_iter().flat_map(|f| f.resources).collect();
        Ok(generator::MarkdownGenerator::new(self.validator.schema()).generate(module_name, &resources))
    }
}
