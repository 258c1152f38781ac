//! Field value constraint checks.

use crate::types::{FieldValue, ViolationKind};
use crate::validator::schema::{FieldType, FieldValidation};
use regex::Regex;

/// A field being checked, with the context needed to report on it.
pub struct FieldCheck<'a> {
    /// Prefix of the comment holding the field
    pub prefix: &'a str,
    /// Leaf field name
    pub field: &'a str,
    /// Parsed value
    pub value: &'a FieldValue,
}

impl FieldCheck<'_> {
    /// Check the value against `validation`.
    ///
    /// An entry without a `type` checks nothing. A type mismatch is reported
    /// alone; the remaining constraints are only checked once the type is
    /// right.
    pub fn check(&self, validation: &FieldValidation, pattern: Option<&Regex>) -> Vec<ViolationKind> {
        let Some(expected) = validation.field_type else {
            return Vec::new();
        };

        if !matches_type(self.value, expected) {
            return vec![ViolationKind::InvalidType {
                prefix: self.prefix.to_string(),
                field: self.field.to_string(),
                expected: expected.to_string(),
                actual: self.value.type_name().to_string(),
            }];
        }

        match self.value {
            FieldValue::String(s) => self.check_string(s, validation, pattern),
            FieldValue::Integer(i) => {
                #[allow(clippy::cast_precision_loss)]
                let number = *i as f64;
                self.check_bounds(number, &i.to_string(), validation, |b| format!("{b}"))
            }
            FieldValue::Float(x) => {
                self.check_bounds(*x, &format!("{x:.2}"), validation, |b| format!("{b:.2}"))
            }
            FieldValue::List(items) => self.check_items(items, validation),
            FieldValue::Bool(_) | FieldValue::Map(_) => Vec::new(),
        }
    }

    fn check_string(&self, value: &str, validation: &FieldValidation, pattern: Option<&Regex>) -> Vec<ViolationKind> {
        let mut violations = Vec::new();

        if let Some(regex) = pattern {
            if !regex.is_match(value) {
                violations.push(ViolationKind::PatternMismatch {
                    prefix: self.prefix.to_string(),
                    field: self.field.to_string(),
                    value: value.to_string(),
                    pattern: regex.as_str().to_string(),
                });
            }
        }

        if !validation.allowed_values.is_empty() && !validation.allowed_values.iter().any(|a| a == value) {
            violations.push(ViolationKind::DisallowedValue {
                prefix: self.prefix.to_string(),
                field: self.field.to_string(),
                value: value.to_string(),
                allowed: validation.allowed_values.clone(),
            });
        }

        let length = value.chars().count();
        if let Some(min_length) = validation.min_length.filter(|min| length < *min) {
            violations.push(ViolationKind::TooShort {
                prefix: self.prefix.to_string(),
                field: self.field.to_string(),
                min_length,
                actual: length,
            });
        }

        violations
    }

    fn check_bounds(
        &self,
        number: f64,
        shown: &str,
        validation: &FieldValidation,
        format_bound: impl Fn(f64) -> String,
    ) -> Vec<ViolationKind> {
        let mut violations = Vec::new();

        if let Some(min) = validation.min.filter(|min| number < *min) {
            violations.push(ViolationKind::BelowMinimum {
                prefix: self.prefix.to_string(),
                field: self.field.to_string(),
                value: shown.to_string(),
                min: format_bound(min),
            });
        }

        if let Some(max) = validation.max.filter(|max| number > *max) {
            violations.push(ViolationKind::AboveMaximum {
                prefix: self.prefix.to_string(),
                field: self.field.to_string(),
                value: shown.to_string(),
                max: format_bound(max),
            });
        }

        violations
    }

    fn check_items(&self, items: &[String], validation: &FieldValidation) -> Vec<ViolationKind> {
        match validation.min_items.filter(|min| items.len() < *min) {
            Some(min_items) => vec![ViolationKind::TooFewItems {
                prefix: self.prefix.to_string(),
                field: self.field.to_string(),
                min_items,
                actual: items.len(),
            }],
            None => Vec::new(),
        }
    }
}

fn matches_type(value: &FieldValue, expected: FieldType) -> bool {
    matches!(
        (value, expected),
        (FieldValue::String(_), FieldType::String)
            | (FieldValue::Bool(_), FieldType::Boolean)
            | (FieldValue::Integer(_), FieldType::Integer)
            | (FieldValue::Float(_), FieldType::Float)
            | (FieldValue::List(_), FieldType::Array)
            | (FieldValue::Map(_), FieldType::Map)
    )
}
