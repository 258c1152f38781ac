//! Placeholder values for generated annotations.

use crate::validator::{FieldType, ValidationSchema};
use std::collections::BTreeMap;

/// Value used when nothing better is known about a field.
pub const DEFAULT_PLACEHOLDER: &str = "CHANGEME";

const BUILTIN: &[(&str, &str)] = &[
    ("owner", "CHANGEME"),
    ("team", "CHANGEME"),
    ("priority", "medium"),
    ("environment", "production"),
    ("email", "changeme@example.com"),
    ("slack", "@changeme"),
    ("phone", "555-0000"),
    ("description", "CHANGEME"),
    ("required", "true"),
    ("enabled", "true"),
    ("backup", "true"),
    ("encrypted", "true"),
    ("cost_center", "CHANGEME"),
    ("department", "CHANGEME"),
    ("emergency_contact", "oncall@example.com"),
    ("uptime", "99.9"),
    ("replicas", "3"),
    ("backup_required", "true"),
    ("mfa_required", "true"),
    ("password_policy", "strict"),
];

/// Example values keyed by leaf field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderTable {
    values: BTreeMap<String, String>,
}

impl Default for PlaceholderTable {
    fn default() -> Self {
        Self {
            values: BUILTIN
                .iter()
                .map(|(field, value)| ((*field).to_string(), (*value).to_string()))
                .collect(),
        }
    }
}

impl PlaceholderTable {
    /// Built-in table with `overrides` applied on top.
    #[must_use]
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut table = Self::default();
        table
            .values
            .extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        table
    }

    /// Placeholder for `field`, which may be a dotted path.
    ///
    /// Lookup uses the leaf name: the table first, then the field's
    /// `field_validations` entry, then [`DEFAULT_PLACEHOLDER`].
    #[must_use]
    pub fn value_for(&self, field: &str, schema: &ValidationSchema) -> String {
        let leaf = field.rsplit('.').next().unwrap_or(field);

        if let Some(value) = self.values.get(leaf) {
            return value.clone();
        }

        let Some(validation) = schema.field_validation(leaf) else {
            return DEFAULT_PLACEHOLDER.to_string();
        };

        if let Some(first) = validation.allowed_values.first() {
            return first.clone();
        }

        match validation.field_type {
            Some(FieldType::Boolean) => "true".to_string(),
            #[allow(clippy::cast_possible_truncation)]
            Some(FieldType::Integer) => validation
                .min
                .map_or_else(|| "1".to_string(), |min| format!("{}", min.ceil() as i64)),
            Some(FieldType::Float) => validation
                .min
                .map_or_else(|| "1.0".to_string(), |min| format!("{min:.1}")),
            Some(FieldType::Array) => format!("[{DEFAULT_PLACEHOLDER}]"),
            Some(FieldType::String | FieldType::Map) | None => DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}
