//! Error types for Terranotate.
//!
//! This module defines the error hierarchy using `thiserror`. Every variant
//! carries enough context to be reported on its own and can be propagated
//! with the `?` operator.
//!
//! # Error Categories
//!
//! - **IO errors**: reading Terraform files, schemas, backups
//! - **Parse errors**: HCL syntax failures
//! - **Schema errors**: malformed or inconsistent validation schemas
//! - **Config errors**: invalid `terranotate.yaml` files
//!
//! Rule violations found by the validator are *not* errors: they are
//! returned as [`crate::types::ValidationError`] values.
//!
//! # Example
//!
//! ```rust
//! use terranotate::error::{TerranotateError, Result};
//!
//! fn read_file(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).map_err(|e| TerranotateError::Io {
//!         path: path.into(),
//!         source: e,
//!         src_path: file!(),
//!         src_line: line!(),
//!     })
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Macro to create errors with automatic source location tracking.
///
/// Usage:
/// ```ignore
/// return Err(err!(FileNotFound { path: path.to_path_buf() }));
/// ```
#[macro_export]
macro_rules! err {
    ($variant:ident { $($field:ident: $value:expr),* $(,)? }) => {
        $crate::error::TerranotateError::$variant {
            $($field: $value,)*
            src_path: file!(),
            src_line: line!(),
        }
    };
}

/// A specialized Result type for Terranotate operations.
pub type Result<T> = std::result::Result<T, TerranotateError>;

/// The main error type for Terranotate.
#[derive(Error, Debug)]
pub enum TerranotateError {
    // =========================================================================
    // I/O and File System Errors
    // =========================================================================
    /// I/O error with path context.
    #[error("I/O error at '{path}' ({src_path}:{src_line}): {source}")]
    Io {
        /// The path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// File not found.
    #[error("File not found: {path} ({src_path}:{src_line})")]
    FileNotFound {
        /// The missing file path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Directory not found.
    #[error("Directory not found: {path} ({src_path}:{src_line})")]
    DirectoryNotFound {
        /// The missing directory path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// No Terraform files below a path.
    #[error("No Terraform files found in: {path} ({src_path}:{src_line})")]
    NoTerraformFiles {
        /// The searched path
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// No backup file exists for a file being reverted.
    #[error("No backup found for '{path}' ({src_path}:{src_line})")]
    BackupNotFound {
        /// The file whose backup is missing
        path: PathBuf,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // HCL Parsing Errors
    // =========================================================================
    /// HCL syntax error.
    #[error("Failed to parse HCL in '{file}' \n\t({src_path}:{src_line}): {message}")]
    HclParse {
        /// The file being parsed
        file: PathBuf,
        /// Error message
        message: String,
        /// Line number (if available)
        line: Option<usize>,
        /// Column number (if available)
        column: Option<usize>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Invalid HCL structure (e.g. a resource block without two labels).
    #[error("Invalid HCL structure in '{file}' ({src_path}:{src_line}): {message}")]
    HclStructure {
        /// The file with the invalid structure
        file: PathBuf,
        /// Description of the structural issue
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Schema Errors
    // =========================================================================
    /// Schema document could not be deserialized.
    #[error("Failed to parse schema '{origin}' ({src_path}:{src_line}): {message}")]
    SchemaParse {
        /// Where the schema came from (file path, or `<inline>`)
        origin: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    /// Schema deserialized but holds an unusable value.
    #[error("Invalid schema value for '{key}' ({src_path}:{src_line}): {message}")]
    SchemaValue {
        /// The schema key
        key: String,
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration parsing error.
    #[error("Failed to parse configuration ({src_path}:{src_line}): {message}")]
    ConfigParse {
        /// Error message
        message: String,
        /// The underlying error (if any)
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Internal error (should not happen in normal operation).
    #[error("Internal error ({src_path}:{src_line}): {message}")]
    Internal {
        /// Error message
        message: String,
        /// Source file path
        src_path: &'static str,
        /// Source line number
        src_line: u32,
    },
}

impl TerranotateError {
    /// Creates an `Io` error.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error, src_path: &'static str, src_line: u32) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            return Self::FileNotFound { path: path.into(), src_path, src_line };
        }
        Self::Io { path: path.into(), source, src_path, src_line }
    }

    /// Creates an `HclParse` error.
    #[must_use]
    pub fn hcl_parse(file: PathBuf, message: String, line: Option<usize>, column: Option<usize>, src_path: &'static str, src_line: u32) -> Self {
        Self::HclParse { file, message, line, column, src_path, src_line }
    }

    /// Creates a `ConfigParse` error.
    #[must_use]
    pub fn config_parse(message: String, source: Option<Box<dyn std::error::Error + Send + Sync>>, src_path: &'static str, src_line: u32) -> Self {
        Self::ConfigParse { message, source, src_path, src_line }
    }

    /// Creates an `Internal` error.
    #[must_use]
    pub fn internal(message: String, src_path: &'static str, src_line: u32) -> Self {
        Self::Internal { message, src_path, src_line }
    }

    /// Determines if the error only affects one file of a batch run.
    ///
    /// Schema and configuration failures are never recoverable: nothing can
    /// be validated without them.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::FileNotFound { .. }
                | Self::HclParse { .. }
                | Self::HclStructure { .. }
                | Self::BackupNotFound { .. }
        )
    }

    /// Returns the appropriate exit code for the error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied => 13,
            Self::FileNotFound { .. } => 14,
            Self::DirectoryNotFound { .. } => 15,
            Self::NoTerraformFiles { .. } => 16,
            Self::HclParse { .. } | Self::HclStructure { .. } => 17,
            Self::ConfigParse { .. } => 18,
            Self::SchemaParse { .. } | Self::SchemaValue { .. } => 19,
            Self::BackupNotFound { .. } => 20,
            _ => 3,
        }
    }
}

/// Extension trait for `Result` to add context to errors.
pub trait ResultExt<T> {
    /// Adds a file path context to an I/O error, recording the caller's
    /// location.
    ///
    /// # Errors
    ///
    /// Returns the wrapped error as `TerranotateError::Io` or `FileNotFound`.
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    #[track_caller]
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        let caller = std::panic::Location::caller();
        self.map_err(|e| TerranotateError::io(path, e, caller.file(), caller.line()))
    }
}

impl From<std::io::Error> for TerranotateError {
    fn from(source: std::io::Error) -> Self {
        // Prefer `ResultExt::with_path` wherever the path is known.
        Self::Io {
            path: PathBuf::new(),
            source,
            src_path: file!(),
            src_line: line!(),
        }
    }
}

impl From<serde_json::Error> for TerranotateError {
    fn from(source: serde_json::Error) -> Self {
        Self::Internal {
            message: format!("JSON serialization error: {source}"),
            src_path: file!(),
            src_line: line!(),
        }
    }
}

/// A utility for collecting per-file errors during batch processing.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Vec<TerranotateError>,
}

impl ErrorCollector {
    /// Create a new error collector.
    #[must_use]
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection.
    pub fn add(&mut self, error: TerranotateError) {
        self.errors.push(error);
    }

    /// Get the number of collected errors.
    #[must_use]
    pub fn count(&self) -> usize {
        self.errors.len()
    }

    /// Check if there are any errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Borrow the collected errors.
    #[must_use]
    pub fn errors(&self) -> &[TerranotateError] {
        &self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_file_not_found() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = TerranotateError::io("main.tf", source, file!(), line!());
        assert!(matches!(err, TerranotateError::FileNotFound { .. }));
        assert_eq!(err.exit_code(), 14);
    }

    #[test]
    fn test_recoverable_classification() {
        let parse = crate::err!(HclParse {
            file: PathBuf::from("main.tf"),
            message: "unexpected token".to_string(),
            line: Some(3),
            column: Some(1),
        });
        assert!(parse.is_recoverable());

        let schema = crate::err!(SchemaParse {
            origin: "<inline>".to_string(),
            message: "bad yaml".to_string(),
        });
        assert!(!schema.is_recoverable());
    }

    #[test]
    fn test_error_collector() {
        let mut collector = ErrorCollector::new();
        assert!(collector.is_empty());
        collector.add(TerranotateError::internal("boom".to_string(), file!(), line!()));
        assert_eq!(collector.count(), 1);
        assert!(matches!(collector.errors(), [TerranotateError::Internal { .. }]));
    }

    #[test]
    fn test_schema_parse_message_includes_path() {
        let err = crate::err!(SchemaParse {
            origin: "schema.yaml".to_string(),
            message: "bad".to_string(),
        });
        assert!(err.to_string().contains("'schema.yaml'"));
    }
}
