//! Schema validation of structured comments.
//!
//! This module checks the annotations attached to each resource against a
//! [`ValidationSchema`].
//!
//! # Checks
//!
//! 1. **Required prefixes**: every prefix listed in the applicable rule set
//!    must appear on at least one preceding or inline comment.
//!
//! 2. **Required fields**: each comment carrying a prefix with a rule must
//!    hold that rule's required fields. Dotted names are looked up through
//!    nested mappings.
//!
//! 3. **Nested groups**: a nested rule's path must exist when the rule has
//!    required fields, and each of those fields must be present under it.
//!
//! 4. **Field values**: fields whose leaf name has an entry in
//!    `field_validations` are checked for type, pattern, allowed values,
//!    length, numeric bounds and item count.
//!
//! # Example
//!
//! ```rust,no_run
//! use terranotate::validator::{SchemaValidator, ValidationSchema};
//! use terranotate::parser::CommentParser;
//! use std::path::Path;
//!
//! fn main() -> terranotate::Result<()> {
//!     let schema = ValidationSchema::from_file(Path::new("schema.yaml"))?;
//!     let validator = SchemaValidator::new(schema);
//!
//!     let parser = CommentParser::new(["@metadata"]);
//!     let resources = parser.parse_file(Path::new("main.tf"))?;
//!
//!     let result = validator.validate_resources(&resources);
//!     println!("passed: {}", result.passed);
//!     Ok(())
//! }
//! ```

mod rules;
mod schema;

pub use rules::FieldCheck;
pub use schema::{FieldType, FieldValidation, NestedRule, PrefixRule, RuleSet, ValidationSchema};

use crate::error::Result;
use crate::types::{
    lookup_path, FieldMap, FieldValue, Resource, StructuredComment, ValidationError, ValidationResult,
    ViolationKind, CONTENT_FIELD,
};
use std::path::Path;

/// Validates resources against a schema.
///
/// The validator holds no mutable state; one instance can check any number
/// of files.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: ValidationSchema,
}

impl SchemaValidator {
    /// Create a validator for an already loaded schema.
    #[must_use]
    pub fn new(schema: ValidationSchema) -> Self {
        Self { schema }
    }

    /// Load the schema from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        ValidationSchema::from_file(path).map(Self::new)
    }

    /// The schema in use.
    #[must_use]
    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }

    /// Validate every resource and aggregate the violations.
    #[must_use]
    pub fn validate_resources(&self, resources: &[Resource]) -> ValidationResult {
        let mut result = ValidationResult::default();

        for resource in resources {
            result.record(self.validate_resource(resource));
        }

        tracing::debug!(
            resources = result.resources_checked,
            errors = result.errors.len(),
            passed = result.passed,
            "Validation complete"
        );

        result
    }

    /// Validate a single resource.
    #[must_use]
    pub fn validate_resource(&self, resource: &Resource) -> Vec<ValidationError> {
        let rules = self.schema.rules_for(&resource.resource_type);
        let mut errors = Vec::new();

        for prefix in &rules.required_prefixes {
            if !resource.has_prefix(prefix) {
                errors.push(ValidationError::new(
                    resource,
                    resource.start_line,
                    ViolationKind::MissingPrefix { prefix: prefix.clone() },
                ));
            }
        }

        for (prefix, rule) in &rules.prefix_rules {
            for comment in resource.comments_by_prefix(prefix) {
                errors.extend(
                    self.check_comment(prefix, rule, comment)
                        .into_iter()
                        .map(|kind| ValidationError::new(resource, comment.line, kind)),
                );
            }
        }

        if !errors.is_empty() {
            tracing::trace!(
                resource = %resource.address(),
                errors = errors.len(),
                "Resource has violations"
            );
        }

        errors
    }

    fn check_comment(&self, prefix: &str, rule: &PrefixRule, comment: &StructuredComment) -> Vec<ViolationKind> {
        let mut violations = Vec::new();

        for field in &rule.required_fields {
            if !comment.has_field(field) {
                violations.push(ViolationKind::MissingField {
                    prefix: prefix.to_string(),
                    field: field.clone(),
                });
            }
        }

        for (path, nested) in &rule.nested_fields {
            violations.extend(check_nested(prefix, path, nested, &comment.fields));
        }

        self.check_values(prefix, &comment.fields, &mut violations);

        violations
    }

    /// Apply `field_validations` by leaf name, descending into nested maps.
    fn check_values(&self, prefix: &str, fields: &FieldMap, violations: &mut Vec<ViolationKind>) {
        for (name, value) in fields {
            if name == CONTENT_FIELD {
                continue;
            }

            if let FieldValue::Map(nested) = value {
                self.check_values(prefix, nested, violations);
                continue;
            }

            if let Some(validation) = self.schema.field_validation(name) {
                let check = FieldCheck { prefix, field: name, value };
                violations.extend(check.check(validation, self.schema.pattern(name)));
            }
        }
    }
}

fn check_nested(prefix: &str, path: &str, rule: &NestedRule, fields: &FieldMap) -> Vec<ViolationKind> {
    let group = match lookup_path(fields, path) {
        Some(FieldValue::Map(group)) => group,
        // a scalar at the path cannot be checked further
        Some(_) => return Vec::new(),
        None if rule.required_fields.is_empty() => return Vec::new(),
        None => {
            return vec![ViolationKind::MissingNestedStructure {
                prefix: prefix.to_string(),
                path: path.to_string(),
            }];
        }
    };

    rule.required_fields
        .iter()
        .filter_map(|field| {
            if field.contains('.') {
                lookup_path(group, field).is_none().then(|| ViolationKind::MissingNestedField {
                    prefix: prefix.to_string(),
                    path: format!("{path}.{field}"),
                })
            } else {
                (!group.contains_key(field)).then(|| ViolationKind::MissingField {
                    prefix: prefix.to_string(),
                    field: format!("{path}.{field}"),
                })
            }
        })
        .collect()
}
