//! Markdown documentation generator.
//!
//! Produces one table per resource type. Columns are the `prefix:field`
//! pairs required by the schema for that type (per-type rules first, then
//! global rules); values are read from the preceding comment with the
//! matching prefix that is nearest to the resource.

use crate::types::Resource;
use crate::validator::ValidationSchema;
use std::collections::BTreeMap;

/// Shown for a field a resource does not set.
const MISSING: &str = "-";

/// Prefixes searched for a `description` field in the fallback table.
const DESCRIPTION_PREFIXES: &[&str] = &["@docs", "@metadata"];

/// Renders resource annotations as Markdown tables.
#[derive(Debug, Clone)]
pub struct MarkdownGenerator<'a> {
    schema: &'a ValidationSchema,
}

impl<'a> MarkdownGenerator<'a> {
    /// Create a generator taking its columns from `schema`.
    #[must_use]
    pub fn new(schema: &'a ValidationSchema) -> Self {
        Self { schema }
    }

    /// Generate the document for a module.
    #[must_use]
    pub fn generate(&self, module_name: &str, resources: &[Resource]) -> String {
        let mut by_type: BTreeMap<&str, Vec<&Resource>> = BTreeMap::new();
        for resource in resources {
            by_type.entry(&resource.resource_type).or_default().push(resource);
        }

        let mut doc = format!("# {module_name} - Resource Documentation\n\n");
        doc.push_str("Terraform resources and their annotations.\n\n");

        for (resource_type, typed) in &by_type {
            doc.push_str(&self.table_for_type(resource_type, typed));
            doc.push('\n');
        }

        doc.push_str("---\n\n");
        doc.push_str(&format!("**Total Resources:** {}\n\n", resources.len()));
        doc.push_str(&format!("**Resource Types:** {}\n", by_type.len()));

        tracing::debug!(
            module = %module_name,
            resources = resources.len(),
            types = by_type.len(),
            "Generated documentation"
        );

        doc
    }

    /// Column keys (`prefix:field`) for a resource type, deduplicated.
    #[must_use]
    pub fn columns(&self, resource_type: &str) -> Vec<(String, String)> {
        let mut columns: Vec<(String, String)> = Vec::new();

        let per_type = self.schema.resource_types.get(resource_type);
        for rules in per_type.into_iter().chain(std::iter::once(&self.schema.global)) {
            for (prefix, rule) in &rules.prefix_rules {
                for field in &rule.required_fields {
                    let column = (prefix.clone(), field.clone());
                    if !columns.contains(&column) {
                        columns.push(column);
                    }
                }
            }
        }

        columns
    }

    fn table_for_type(&self, resource_type: &str, resources: &[&Resource]) -> String {
        let mut table = format!("## {resource_type}\n\n");
        let columns = self.columns(resource_type);

        if columns.is_empty() {
            table.push_str("| Resource Name | Description |\n");
            table.push_str("|---------------|-------------|\n");
            for resource in resources {
                table.push_str(&format!("| `{}` | {} |\n", resource.name, description(resource)));
            }
        } else {
            let headers: Vec<String> = columns.iter().map(|(p, f)| format!("{p}:{f}")).collect();
            table.push_str(&format!("| Resource | {} |\n", headers.join(" | ")));
            table.push_str(&format!("|----------|{}\n", "--------|".repeat(columns.len())));

            for resource in resources {
                let values: Vec<String> = columns
                    .iter()
                    .map(|(prefix, field)| field_value(resource, prefix, field))
                    .collect();
                table.push_str(&format!("| `{}` | {} |\n", resource.name, values.join(" | ")));
            }
        }

        table.push('\n');
        table
    }
}

/// Value from the comment with `prefix` closest to the resource.
fn field_value(resource: &Resource, prefix: &str, field: &str) -> String {
    resource
        .preceding_comments
        .iter()
        .rev()
        .find(|c| c.prefix == prefix)
        .and_then(|c| c.get(field))
        .map_or_else(|| MISSING.to_string(), |v| escape_cell(&v.to_string()))
}

fn description(resource: &Resource) -> String {
    resource
        .preceding_comments
        .iter()
        .rev()
        .filter(|c| DESCRIPTION_PREFIXES.contains(&c.prefix.as_str()))
        .find_map(|c| c.get("description"))
        .map_or_else(|| MISSING.to_string(), |v| escape_cell(&v.to_string()))
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}
