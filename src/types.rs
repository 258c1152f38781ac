//! Core data types used throughout Terranotate.
//!
//! This module defines the fundamental data structures for representing:
//! - Structured comments and their typed field values
//! - Terraform resources with their associated comments
//! - Validation violations and aggregated results
//! - Report formats and severity levels

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Synthetic field holding the cleaned text of a structured comment.
///
/// It is never displayed nor validated.
pub const CONTENT_FIELD: &str = "_content";

/// Mapping from field name to value, possibly nested through dotted keys.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A typed value parsed out of a `key:value` token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// `true` or `false`
    Bool(bool),
    /// Whole number
    Integer(i64),
    /// Decimal number
    Float(f64),
    /// Bracketed list (`[a,b,c]`), items kept as raw strings
    List(Vec<String>),
    /// Nested mapping built from dotted keys
    Map(FieldMap),
    /// Anything else
    String(String),
}

impl FieldValue {
    /// Type name used in violation messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::List(_) => "array",
            Self::Map(_) => "map",
            Self::String(_) => "string",
        }
    }

    /// Borrow the value as a string, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the value as a nested mapping, if it is one.
    #[must_use]
    pub fn as_map(&self) -> Option<&FieldMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::List(items) => write!(f, "[{}]", items.join(",")),
            Self::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{k}:{v}")).collect();
                write!(f, "{{{}}}", parts.join(" "))
            }
        }
    }
}

/// Walk `fields` along a dotted path.
///
/// Every segment but the last must resolve to a nested mapping.
#[must_use]
pub fn lookup_path<'a>(fields: &'a FieldMap, path: &str) -> Option<&'a FieldValue> {
    let mut current = fields;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let value = current.get(segment)?;
        if segments.peek().is_none() {
            return Some(value);
        }
        current = value.as_map()?;
    }

    None
}

/// A comment block that started with one of the configured prefixes.
///
/// # Example
///
/// ```hcl
/// # @metadata owner:platform team:infra
/// # contact.email:infra@example.com
/// resource "aws_vpc" "main" {}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuredComment {
    /// The matched prefix (e.g. `@metadata`)
    pub prefix: String,

    /// Parsed `key:value` pairs, nested through dotted keys
    pub fields: FieldMap,

    /// Cleaned comment text, comment markers stripped
    pub raw: String,

    /// First line of the comment block (1-based)
    pub line: usize,

    /// Last line of the comment block (1-based)
    pub end_line: usize,
}

impl StructuredComment {
    /// Look up a flat or dotted field.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        lookup_path(&self.fields, path)
    }

    /// Whether a flat or dotted field is present.
    #[must_use]
    pub fn has_field(&self, path: &str) -> bool {
        self.get(path).is_some()
    }
}

/// A `resource "type" "name" { ... }` block and the comments attached to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    /// Resource type label (e.g. `aws_instance`)
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Resource name label
    pub name: String,

    /// File where this resource is declared
    pub file_path: PathBuf,

    /// Line of the block header (1-based)
    pub start_line: usize,

    /// Line of the closing brace (1-based)
    pub end_line: usize,

    /// Top-level attributes as raw expression text
    pub attributes: BTreeMap<String, String>,

    /// Structured comments shortly above the block
    pub preceding_comments: Vec<StructuredComment>,

    /// Structured comments inside the block
    pub inline_comments: Vec<StructuredComment>,
}

impl Resource {
    /// Create a resource with no attributes or comments.
    #[must_use]
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>, start_line: usize, end_line: usize) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            file_path: PathBuf::new(),
            start_line,
            end_line,
            attributes: BTreeMap::new(),
            preceding_comments: Vec::new(),
            inline_comments: Vec::new(),
        }
    }

    /// `type.name` address of the resource.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.name)
    }

    /// Preceding comments followed by inline comments.
    pub fn comments(&self) -> impl Iterator<Item = &StructuredComment> {
        self.preceding_comments.iter().chain(self.inline_comments.iter())
    }

    /// All structured comments carrying `prefix`.
    #[must_use]
    pub fn comments_by_prefix(&self, prefix: &str) -> Vec<&StructuredComment> {
        self.comments().filter(|c| c.prefix == prefix).collect()
    }

    /// Whether any structured comment carries `prefix`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.comments().any(|c| c.prefix == prefix)
    }

    /// Dotted lookup in the first comment carrying `prefix`.
    #[must_use]
    pub fn nested_field(&self, prefix: &str, path: &str) -> Option<&FieldValue> {
        self.comments().find(|c| c.prefix == prefix)?.get(path)
    }
}

/// Severity level for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Potential issue; not produced by the schema validator itself
    Warning,
    /// Rule breach
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// What rule a violation breaches.
///
/// The human-readable message is rendered from this value; consumers such as
/// the fixer match on the variant instead of parsing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// No comment with a required prefix
    MissingPrefix { prefix: String },
    /// Flat field (or `nested.field`) absent from a comment
    MissingField { prefix: String, field: String },
    /// Nested path absent while its rule requires fields
    MissingNestedStructure { prefix: String, path: String },
    /// Dotted sub-field of a nested rule absent
    MissingNestedField { prefix: String, path: String },
    /// Value has the wrong type
    InvalidType { prefix: String, field: String, expected: String, actual: String },
    /// String does not match the configured regex
    PatternMismatch { prefix: String, field: String, value: String, pattern: String },
    /// String is not one of the allowed values
    DisallowedValue { prefix: String, field: String, value: String, allowed: Vec<String> },
    /// String shorter than `min_length`
    TooShort { prefix: String, field: String, min_length: usize, actual: usize },
    /// Number below `min`
    BelowMinimum { prefix: String, field: String, value: String, min: String },
    /// Number above `max`
    AboveMaximum { prefix: String, field: String, value: String, max: String },
    /// Array with fewer than `min_items` entries
    TooFewItems { prefix: String, field: String, min_items: usize, actual: usize },
}

impl ViolationKind {
    /// The comment prefix this violation concerns.
    #[must_use]
    pub fn prefix(&self) -> &str {
        match self {
            Self::MissingPrefix { prefix }
            | Self::MissingField { prefix, .. }
            | Self::MissingNestedStructure { prefix, .. }
            | Self::MissingNestedField { prefix, .. }
            | Self::InvalidType { prefix, .. }
            | Self::PatternMismatch { prefix, .. }
            | Self::DisallowedValue { prefix, .. }
            | Self::TooShort { prefix, .. }
            | Self::BelowMinimum { prefix, .. }
            | Self::AboveMaximum { prefix, .. }
            | Self::TooFewItems { prefix, .. } => prefix,
        }
    }

    /// Whether the violation is about missing structure rather than a bad value.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MissingPrefix { .. }
                | Self::MissingField { .. }
                | Self::MissingNestedStructure { .. }
                | Self::MissingNestedField { .. }
        )
    }
}

fn with_article(type_name: &str) -> String {
    match type_name.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => format!("an {type_name}"),
        _ => format!("a {type_name}"),
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrefix { prefix } => write!(f, "Missing required comment prefix: {prefix}"),
            Self::MissingField { prefix, field } => {
                write!(f, "{prefix}: Missing required field '{field}'")
            }
            Self::MissingNestedStructure { prefix, path } => {
                write!(f, "{prefix}: Missing nested structure '{path}'")
            }
            Self::MissingNestedField { prefix, path } => {
                write!(f, "{prefix}: Missing required nested field '{path}'")
            }
            Self::InvalidType { prefix, field, expected, actual } => write!(
                f,
                "{prefix}: Field '{field}' must be {}, got {actual}",
                with_article(expected)
            ),
            Self::PatternMismatch { prefix, field, value, pattern } => write!(
                f,
                "{prefix}: Field '{field}' value '{value}' does not match required pattern '{pattern}'"
            ),
            Self::DisallowedValue { prefix, field, value, allowed } => write!(
                f,
                "{prefix}: Field '{field}' value '{value}' not in allowed values: [{}]",
                allowed.join(" ")
            ),
            Self::TooShort { prefix, field, min_length, actual } => write!(
                f,
                "{prefix}: Field '{field}' must be at least {min_length} characters, got {actual}"
            ),
            Self::BelowMinimum { prefix, field, value, min } => {
                write!(f, "{prefix}: Field '{field}' value {value} is below minimum {min}")
            }
            Self::AboveMaximum { prefix, field, value, max } => {
                write!(f, "{prefix}: Field '{field}' value {value} exceeds maximum {max}")
            }
            Self::TooFewItems { prefix, field, min_items, actual } => write!(
                f,
                "{prefix}: Field '{field}' must have at least {min_items} items, got {actual}"
            ),
        }
    }
}

/// A single rule violation attached to a resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Resource type label
    pub resource_type: String,

    /// Resource name label
    pub resource_name: String,

    /// Declaration line of the resource; disambiguates duplicate addresses
    pub resource_line: usize,

    /// File the resource was parsed from (empty for in-memory resources)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Line the violation points at
    pub line: usize,

    /// Severity level
    pub severity: Severity,

    /// Structured description of the breach
    #[serde(flatten)]
    pub kind: ViolationKind,

    /// Message rendered from `kind`
    pub message: String,
}

impl ValidationError {
    /// Create an error-severity violation for `resource`.
    #[must_use]
    pub fn new(resource: &Resource, line: usize, kind: ViolationKind) -> Self {
        let file = if resource.file_path.as_os_str().is_empty() {
            None
        } else {
            Some(resource.file_path.clone())
        };

        Self {
            resource_type: resource.resource_type.clone(),
            resource_name: resource.name.clone(),
            resource_line: resource.start_line,
            file,
            line,
            severity: Severity::Error,
            message: kind.to_string(),
            kind,
        }
    }

    /// `type.name` address of the offending resource.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}.{}", self.resource_type, self.resource_name)
    }

    /// Whether the violation was raised for a resource in `path`.
    #[must_use]
    pub fn is_in_file(&self, path: &Path) -> bool {
        self.file.as_deref() == Some(path)
    }
}

/// Aggregated outcome of validating one or more resources.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Error-severity violations
    pub errors: Vec<ValidationError>,

    /// Warning-severity violations
    pub warnings: Vec<ValidationError>,

    /// Number of resources checked
    pub resources_checked: usize,

    /// Files the resources came from
    pub files: Vec<PathBuf>,

    /// True iff there are no errors
    pub passed: bool,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            resources_checked: 0,
            files: Vec::new(),
            passed: true,
        }
    }
}

impl ValidationResult {
    /// Record the violations of one resource.
    pub fn record(&mut self, violations: Vec<ValidationError>) {
        self.resources_checked += 1;
        for violation in violations {
            match violation.severity {
                Severity::Error => {
                    self.passed = false;
                    self.errors.push(violation);
                }
                Severity::Warning => self.warnings.push(violation),
            }
        }
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: Self) {
        self.passed &= other.passed;
        self.resources_checked += other.resources_checked;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.files.extend(other.files);
    }

    /// Errors and warnings grouped by `type.name`, in address order.
    #[must_use]
    pub fn by_resource(&self) -> BTreeMap<String, Vec<&ValidationError>> {
        let mut grouped: BTreeMap<String, Vec<&ValidationError>> = BTreeMap::new();
        for violation in self.errors.iter().chain(self.warnings.iter()) {
            grouped.entry(violation.address()).or_default().push(violation);
        }
        grouped
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum ReportFormat {
    /// Plain text format
    #[default]
    Text,
    /// JSON format
    Json,
}
