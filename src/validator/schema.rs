//! Validation schema document.
//!
//! ```yaml
//! global:
//!   required_prefixes: ["@metadata"]
//!   prefix_rules:
//!     "@metadata":
//!       required_fields: [owner, team]
//!       optional_fields: [cost_center]
//!       nested_fields:
//!         contact:
//!           required_fields: [email]
//!           optional_fields: [slack]
//!
//! resource_types:
//!   aws_s3_bucket:
//!     required_prefixes: ["@metadata", "@config"]
//!     prefix_rules: {}
//!
//! field_validations:
//!   environment:
//!     type: string
//!     allowed_values: [dev, staging, production]
//! ```

use crate::error::{Result, TerranotateError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Requirements for one comment prefix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefixRule {
    /// Fields that must be present, in rendering order
    pub required_fields: Vec<String>,

    /// Fields that may be present, in rendering order
    pub optional_fields: Vec<String>,

    /// Rules for dotted field groups, keyed by path
    pub nested_fields: BTreeMap<String, NestedRule>,
}

/// Requirements for a nested field group such as `contact.*`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedRule {
    /// Fields that must appear under the group
    pub required_fields: Vec<String>,
    /// Fields rendered after the required ones when fixing
    pub optional_fields: Vec<String>,
}

/// Prefix requirements applied to a resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    /// Prefixes every resource must carry
    pub required_prefixes: Vec<String>,

    /// Field rules per prefix
    pub prefix_rules: BTreeMap<String, PrefixRule>,
}

/// Declared type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Boolean,
    Integer,
    Float,
    Array,
    Map,
}

impl FieldType {
    /// Name as used in schemas and violation messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Array => "array",
            Self::Map => "map",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type and value constraints for every field with a given leaf name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldValidation {
    /// Expected value type; without one the entry is not checked
    #[serde(rename = "type")]
    pub field_type: Option<FieldType>,

    /// Permitted string values
    pub allowed_values: Vec<String>,

    /// Regex a string value must match
    pub pattern: Option<String>,

    /// Minimum string length in characters
    pub min_length: Option<usize>,

    /// Inclusive numeric lower bound
    pub min: Option<f64>,

    /// Inclusive numeric upper bound
    pub max: Option<f64>,

    /// Minimum number of array items
    pub min_items: Option<usize>,
}

/// The complete validation schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSchema {
    /// Rules for resource types without their own entry
    pub global: RuleSet,

    /// Rules per resource type; an entry replaces `global` entirely
    pub resource_types: BTreeMap<String, RuleSet>,

    /// Constraints keyed by leaf field name
    pub field_validations: BTreeMap<String, FieldValidation>,

    #[serde(skip)]
    patterns: BTreeMap<String, Regex>,
}

impl ValidationSchema {
    /// Parse a schema from YAML. `origin` names the source in errors.
    ///
    /// # Errors
    ///
    /// Returns `SchemaParse` for malformed YAML and `SchemaValue` for
    /// invalid regex patterns or empty prefixes.
    pub fn from_yaml(content: &str, origin: &str) -> Result<Self> {
        let mut schema: Self = serde_yaml::from_str(content).map_err(|e| {
            crate::err!(SchemaParse {
                origin: origin.to_string(),
                message: e.to_string(),
            })
        })?;

        schema.compile()?;

        tracing::debug!(
            origin = %origin,
            resource_types = schema.resource_types.len(),
            field_validations = schema.field_validations.len(),
            "Schema loaded"
        );

        Ok(schema)
    }

    /// Load a schema from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid schema.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TerranotateError::io(path, e, file!(), line!()))?;
        Self::from_yaml(&content, &path.display().to_string())
    }

    fn compile(&mut self) -> Result<()> {
        let rule_sets = std::iter::once(&self.global).chain(self.resource_types.values());
        for rules in rule_sets {
            let prefixes = rules.required_prefixes.iter().chain(rules.prefix_rules.keys());
            if let Some(empty) = prefixes.into_iter().find(|p| p.trim().is_empty()) {
                return Err(crate::err!(SchemaValue {
                    key: format!("prefix '{empty}'"),
                    message: "comment prefixes must not be empty".to_string(),
                }));
            }
        }

        self.patterns.clear();
        for (field, validation) in &self.field_validations {
            let Some(pattern) = validation.pattern.as_deref().filter(|p| !p.is_empty()) else {
                continue;
            };
            let regex = Regex::new(pattern).map_err(|e| {
                crate::err!(SchemaValue {
                    key: format!("field_validations.{field}.pattern"),
                    message: e.to_string(),
                })
            })?;
            self.patterns.insert(field.clone(), regex);
        }

        Ok(())
    }

    /// Rule set applying to `resource_type`: its own entry, else `global`.
    #[must_use]
    pub fn rules_for(&self, resource_type: &str) -> &RuleSet {
        self.resource_types.get(resource_type).unwrap_or(&self.global)
    }

    /// Rule for `prefix` in the rule set applying to `resource_type`.
    ///
    /// A per-type entry replaces `global` entirely, its prefix rules
    /// included.
    #[must_use]
    pub fn find_prefix_rule(&self, resource_type: &str, prefix: &str) -> Option<&PrefixRule> {
        self.rules_for(resource_type).prefix_rules.get(prefix)
    }

    /// Constraints for a leaf field name.
    #[must_use]
    pub fn field_validation(&self, field: &str) -> Option<&FieldValidation> {
        self.field_validations.get(field)
    }

    /// Compiled pattern for a leaf field name.
    #[must_use]
    pub fn pattern(&self, field: &str) -> Option<&Regex> {
        self.patterns.get(field)
    }

    /// Generate an example schema.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# Terranotate validation schema

global:
  required_prefixes:
    - "@metadata"
  prefix_rules:
    "@metadata":
      required_fields: [owner, team]
      optional_fields: [environment, cost_center]
      nested_fields:
        contact:
          required_fields: [email]
          optional_fields: [slack]

resource_types:
  aws_s3_bucket:
    required_prefixes:
      - "@metadata"
      - "@config"
    prefix_rules:
      "@metadata":
        required_fields: [owner, team, environment]
      "@config":
        required_fields: [encrypted, backup]

field_validations:
  environment:
    type: string
    allowed_values: [dev, staging, production]
  email:
    type: string
    pattern: '^[^@\s]+@[^@\s]+$'
  encrypted:
    type: boolean
  backup:
    type: boolean
  replicas:
    type: integer
    min: 1
    max: 10
"#
        .to_string()
    }
}
