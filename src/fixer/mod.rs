//! Automatic insertion of missing annotations.
//!
//! The fixer turns structural violations (missing prefixes, fields and nested
//! groups) into new comment blocks filled with placeholder values, and splices
//! them into the source text above the offending resources. Existing comments
//! are never edited: a new block is inserted.
//!
//! Adjacent comment lines form a single block, which the fixer relies on in
//! two ways. Fields missing from an existing comment are written on one line
//! directly above that comment, so they merge into it. Blocks for missing
//! prefixes are kept apart from each other, and from managed comments below
//! them, by a blank line.
//!
//! Value violations (wrong type, disallowed value, ...) are left to the user.

mod placeholder;
mod render;

pub use placeholder::{PlaceholderTable, DEFAULT_PLACEHOLDER};
pub use render::{render_fix, render_line, CommentFix};

use crate::config::Config;
use crate::error::{Result, ResultExt, TerranotateError};
use crate::parser::{clean_comment, DEFAULT_LOOKBACK_LINES};
use crate::types::{Resource, ValidationError, ViolationKind};
use crate::validator::ValidationSchema;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Where a rendered block goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    /// 0-based index of the line the block is inserted before
    pub index: usize,

    /// Whether a blank line is inserted first to keep the block apart from
    /// a user comment above it
    pub separator: bool,
}

/// Result of fixing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    /// Patched source text
    pub content: String,

    /// Number of comment fixes applied
    pub fix_count: usize,

    /// `type.name` of every resource that received a fix
    pub fixed_resources: Vec<String>,

    /// `type.name` of resources left unchanged because a fix would have
    /// detached one of their comments
    pub unfixed_resources: Vec<String>,
}

/// Fixes derived for one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFixes {
    /// Blocks for prefixes the resource does not carry at all
    pub missing: Vec<CommentFix>,

    /// Lines to merge into existing comments, keyed by the comment's
    /// first line (1-based)
    pub additions: Vec<(usize, CommentFix)>,
}

impl ResourceFixes {
    /// Number of fixes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.missing.len() + self.additions.len()
    }

    /// Whether there is nothing to fix.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn addition_for(&mut self, line: usize, prefix: &str) -> &mut CommentFix {
        let position = match self
            .additions
            .iter()
            .position(|(l, f)| *l == line && f.prefix == prefix)
        {
            Some(position) => position,
            None => {
                self.additions.push((line, CommentFix::new(prefix)));
                self.additions.len() - 1
            }
        };
        &mut self.additions[position].1
    }
}

/// Lines inserted before one line of the original text.
#[derive(Debug, Clone)]
struct Splice {
    /// 0-based index in the original text
    index: usize,
    kind: SpliceKind,
    lines: Vec<String>,
    /// Offsets of each rendered comment's first line within `lines`
    heads: Vec<usize>,
    /// Candidates whose fixes produced this splice
    owners: Vec<usize>,
    /// Start line of the resource a new block is written for
    resource_line: Option<usize>,
    fixes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SpliceKind {
    Addition,
    Block,
}

/// Resource identity used to match violations to declarations.
type ResourceKey = (String, String, usize);

/// Synthesizes and inserts missing comment blocks.
#[derive(Debug, Clone)]
pub struct CommentFixer<'a> {
    schema: &'a ValidationSchema,
    placeholders: PlaceholderTable,
    managed_markers: Vec<String>,
    lookback_lines: usize,
}

impl<'a> CommentFixer<'a> {
    /// Create a fixer with the built-in placeholders and markers.
    #[must_use]
    pub fn new(schema: &'a ValidationSchema) -> Self {
        Self {
            schema,
            placeholders: PlaceholderTable::default(),
            managed_markers: vec!["@".to_string(), "terraform:".to_string()],
            lookback_lines: DEFAULT_LOOKBACK_LINES,
        }
    }

    /// Create a fixer using the `fixer` section of the configuration.
    #[must_use]
    pub fn from_config(schema: &'a ValidationSchema, config: &Config) -> Self {
        Self {
            schema,
            placeholders: PlaceholderTable::with_overrides(&config.fixer.placeholders),
            managed_markers: config.fixer.managed_markers.clone(),
            lookback_lines: config.parser.lookback_lines,
        }
    }

    /// Read `path` and fix it; only violations raised for that file are used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn fix_file(&self, path: &Path, resources: &[Resource], errors: &[ValidationError]) -> Result<FixOutcome> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TerranotateError::io(path, e, file!(), line!()))?;

        let relevant: Vec<ValidationError> = errors
            .iter()
            .filter(|e| e.file.is_none() || e.is_in_file(path))
            .cloned()
            .collect();

        Ok(self.fix_content(&content, resources, &relevant))
    }

    /// Insert comment blocks for the structural violations in `errors`.
    ///
    /// Every insertion is planned against the original text and applied in
    /// one pass. A resource whose fixes would push one of its comments out
    /// of the lookback window is left untouched and listed in
    /// `unfixed_resources`.
    #[must_use]
    pub fn fix_content(&self, content: &str, resources: &[Resource], errors: &[ValidationError]) -> FixOutcome {
        let grouped = group_errors(errors);
        let crlf = content.contains("\r\n");
        let mut lines: Vec<String> = content.split('\n').map(String::from).collect();

        let mut ordered: Vec<&Resource> = resources.iter().collect();
        ordered.sort_by_key(|r| r.start_line);

        let mut candidates: Vec<(&Resource, ResourceFixes)> = Vec::new();
        for resource in ordered {
            let key = (resource.resource_type.clone(), resource.name.clone(), resource.start_line);
            let Some(resource_errors) = grouped.get(&key) else {
                continue;
            };

            if self.has_valid_comments(resource, resource_errors) {
                tracing::debug!(resource = %resource.address(), "Comments already structurally valid");
                continue;
            }

            let fixes = self.derive_fixes(resource, resource_errors);
            if !fixes.is_empty() {
                candidates.push((resource, fixes));
            }
        }

        let mut unfixed_resources = Vec::new();
        let splices = loop {
            let splices = self.plan_splices(&lines, &candidates);
            let stranding = self.stranding(resources, &splices);
            if stranding.is_empty() {
                break splices;
            }
            for owner in stranding.into_iter().rev() {
                let (resource, _) = candidates.remove(owner);
                tracing::warn!(
                    resource = %resource.address(),
                    lookback = self.lookback_lines,
                    "Fix would move a comment out of the lookback window, leaving resource unchanged"
                );
                unfixed_resources.push(resource.address());
            }
        };

        let fix_count: usize = splices.iter().map(|s| s.fixes).sum();
        tracing::debug!(splices = splices.len(), fixes = fix_count, "Inserting comment lines");

        for splice in splices {
            let tail = lines.split_off(splice.index.min(lines.len()));
            lines.extend(
                splice
                    .lines
                    .into_iter()
                    .map(|line| if crlf { line + "\r" } else { line }),
            );
            lines.extend(tail);
        }

        unfixed_resources.sort();

        FixOutcome {
            content: lines.join("\n"),
            fix_count,
            fixed_resources: candidates.iter().map(|(r, _)| r.address()).collect(),
            unfixed_resources,
        }
    }

    /// Plan the insertions for every candidate, last index first so that
    /// applying them in order keeps earlier indexes valid.
    ///
    /// Additions aimed at the same comment by several resources are merged
    /// into one line. At a shared index additions are applied first, so a
    /// new block ends up above them.
    fn plan_splices(&self, lines: &[String], candidates: &[(&Resource, ResourceFixes)]) -> Vec<Splice> {
        let mut additions: BTreeMap<(usize, String), (CommentFix, &str, Vec<usize>)> = BTreeMap::new();
        let mut splices = Vec::new();

        for (owner, (resource, fixes)) in candidates.iter().enumerate() {
            for (line, fix) in &fixes.additions {
                let (merged, _, owners) = additions
                    .entry((*line, fix.prefix.clone()))
                    .or_insert_with(|| (CommentFix::new(fix.prefix.clone()), resource.resource_type.as_str(), Vec::new()));
                merged
                    .fields
                    .extend(fix.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                owners.push(owner);
            }

            if !fixes.missing.is_empty() {
                splices.push(self.missing_block(lines, resource, &fixes.missing, owner));
            }
        }

        for ((line, _), (fix, resource_type, owners)) in additions {
            let rule = self.schema.find_prefix_rule(resource_type, &fix.prefix);
            splices.push(Splice {
                index: line.saturating_sub(1),
                kind: SpliceKind::Addition,
                lines: vec![render_line(&fix, rule)],
                heads: vec![0],
                owners,
                resource_line: None,
                fixes: 1,
            });
        }

        splices.sort_by(|a, b| b.index.cmp(&a.index).then(a.kind.cmp(&b.kind)));
        splices
    }

    /// One block holding a comment per missing prefix, blank-separated.
    fn missing_block(&self, lines: &[String], resource: &Resource, missing: &[CommentFix], owner: usize) -> Splice {
        let insertion = self.find_insertion_point(lines, resource.start_line);
        let mut block = Vec::new();
        let mut heads = Vec::new();

        if insertion.separator {
            block.push(String::new());
        }
        for (i, fix) in missing.iter().enumerate() {
            if i > 0 {
                block.push(String::new());
            }
            heads.push(block.len());
            block.extend(render_fix(
                fix,
                self.schema.find_prefix_rule(&resource.resource_type, &fix.prefix),
            ));
        }
        if lines
            .get(insertion.index)
            .is_some_and(|below| is_comment_line(below.trim()))
        {
            block.push(String::new());
        }

        Splice {
            index: insertion.index,
            kind: SpliceKind::Block,
            lines: block,
            heads,
            owners: vec![owner],
            resource_line: Some(resource.start_line),
            fixes: missing.len(),
        }
    }

    /// Candidates whose splices would leave a comment more than
    /// `lookback_lines` above the resource it documents.
    ///
    /// Both the existing preceding comments of every resource and the
    /// blocks inserted for it are checked.
    fn stranding(&self, resources: &[Resource], splices: &[Splice]) -> BTreeSet<usize> {
        let mut blamed = BTreeSet::new();

        for resource in resources {
            let target = shifted(splices, resource.start_line.saturating_sub(1));

            let existing = resource.preceding_comments.iter().map(|comment| {
                splices
                    .iter()
                    .position(|s| s.kind == SpliceKind::Addition && s.index + 1 == comment.line)
                    .map_or_else(|| shifted(splices, comment.line.saturating_sub(1)), |k| placed(splices, k, 0))
            });
            let inserted = splices
                .iter()
                .enumerate()
                .filter(|(_, s)| s.resource_line == Some(resource.start_line))
                .flat_map(|(k, s)| s.heads.iter().map(move |head| placed(splices, k, *head)));

            for anchor in existing.chain(inserted) {
                if target.saturating_sub(anchor) <= self.lookback_lines {
                    continue;
                }
                for (k, splice) in splices.iter().enumerate() {
                    let first = placed(splices, k, 0);
                    if first < target && first + splice.lines.len() > anchor {
                        blamed.extend(splice.owners.iter().copied());
                    }
                }
            }
        }

        blamed
    }

    /// Whether a resource already carries managed comments that satisfy
    /// every structural requirement, placeholder values included.
    #[must_use]
    pub fn has_valid_comments(&self, resource: &Resource, errors: &[&ValidationError]) -> bool {
        let has_managed = resource
            .preceding_comments
            .iter()
            .any(|c| self.is_managed_text(&c.raw) && c.raw.contains(':'));

        has_managed && !errors.iter().any(|e| e.kind.is_structural())
    }

    /// Build the fixes for one resource's violations.
    ///
    /// Each missing prefix gets a full block, in violation order. Missing
    /// fields and nested groups are collected per existing comment, keyed by
    /// the comment's first line.
    #[must_use]
    pub fn derive_fixes(&self, resource: &Resource, errors: &[&ValidationError]) -> ResourceFixes {
        let mut fixes = ResourceFixes::default();

        for error in errors {
            match &error.kind {
                ViolationKind::MissingPrefix { prefix } => {
                    if fixes.missing.iter().any(|f| &f.prefix == prefix) {
                        continue;
                    }
                    let Some(rule) = self.schema.find_prefix_rule(&resource.resource_type, prefix) else {
                        tracing::debug!(prefix = %prefix, "No rule for missing prefix, nothing to insert");
                        continue;
                    };

                    let mut fix = CommentFix::new(prefix.clone());
                    for field in &rule.required_fields {
                        self.add_placeholder(&mut fix, field.clone());
                    }
                    for (path, nested) in &rule.nested_fields {
                        for field in &nested.required_fields {
                            self.add_placeholder(&mut fix, format!("{path}.{field}"));
                        }
                    }
                    fixes.missing.push(fix);
                }
                ViolationKind::MissingField { prefix, field } => {
                    let fix = fixes.addition_for(error.line, prefix);
                    self.add_placeholder(fix, field.clone());
                }
                ViolationKind::MissingNestedField { prefix, path } => {
                    let fix = fixes.addition_for(error.line, prefix);
                    self.add_placeholder(fix, path.clone());
                }
                ViolationKind::MissingNestedStructure { prefix, path } => {
                    let nested = self
                        .schema
                        .find_prefix_rule(&resource.resource_type, prefix)
                        .and_then(|rule| rule.nested_fields.get(path));
                    if let Some(nested) = nested {
                        let fix = fixes.addition_for(error.line, prefix);
                        for field in &nested.required_fields {
                            self.add_placeholder(fix, format!("{path}.{field}"));
                        }
                    }
                }
                _ => {}
            }
        }

        fixes.additions.retain(|(_, fix)| !fix.fields.is_empty());
        fixes
    }

    fn add_placeholder(&self, fix: &mut CommentFix, field: String) {
        let value = self.placeholders.value_for(&field, self.schema);
        fix.fields.insert(field, value);
    }

    /// Compute where a block for the resource starting at `start_line`
    /// (1-based) is inserted.
    ///
    /// Scanning upward from the line above the resource, managed comments are
    /// skipped. The block goes right after the first blank line, code line or
    /// user comment found (a user comment also gets a blank separator), or at
    /// the top of the file.
    #[must_use]
    pub fn find_insertion_point<S: AsRef<str>>(&self, lines: &[S], start_line: usize) -> Insertion {
        let mut index = start_line.saturating_sub(1).min(lines.len());

        while index > 0 {
            let above = lines[index - 1].as_ref().trim();

            if above.is_empty() {
                return Insertion { index, separator: false };
            }

            if is_comment_line(above) {
                if self.is_managed_line(above) {
                    index -= 1;
                    continue;
                }
                return Insertion { index, separator: true };
            }

            return Insertion { index, separator: false };
        }

        Insertion { index: 0, separator: false }
    }

    fn is_managed_line(&self, line: &str) -> bool {
        clean_comment(line)
            .first()
            .is_some_and(|text| self.is_managed_text(text))
    }

    fn is_managed_text(&self, text: &str) -> bool {
        self.managed_markers.iter().any(|m| text.starts_with(m.as_str()))
    }
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("//") || line.starts_with("/*") || line.starts_with('*')
}

/// Final 0-based position of original line `line` once `splices` are applied.
fn shifted(splices: &[Splice], line: usize) -> usize {
    line + splices
        .iter()
        .filter(|s| s.index <= line)
        .map(|s| s.lines.len())
        .sum::<usize>()
}

/// Final 0-based position of line `offset` of `splices[k]`.
fn placed(splices: &[Splice], k: usize, offset: usize) -> usize {
    let splice = &splices[k];
    let above: usize = splices
        .iter()
        .enumerate()
        .filter(|(j, other)| other.index < splice.index || (other.index == splice.index && *j > k))
        .map(|(_, other)| other.lines.len())
        .sum();
    splice.index + offset + above
}

/// Group violations by resource type, name and declaration line.
///
/// A ` (file)` qualifier on the type is ignored.
fn group_errors(errors: &[ValidationError]) -> BTreeMap<ResourceKey, Vec<&ValidationError>> {
    let mut grouped: BTreeMap<ResourceKey, Vec<&ValidationError>> = BTreeMap::new();

    for error in errors {
        let base_type = error
            .resource_type
            .split_once(" (")
            .map_or(error.resource_type.as_str(), |(base, _)| base);
        grouped
            .entry((base_type.to_string(), error.resource_name.clone(), error.resource_line))
            .or_default()
            .push(error);
    }

    grouped
}

/// Path of the backup copy of `path`.
#[must_use]
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Copy `path` to its backup location.
///
/// # Errors
///
/// Returns an error if the copy fails.
pub fn create_backup(path: &Path, suffix: &str) -> Result<PathBuf> {
    let backup = backup_path(path, suffix);
    std::fs::copy(path, &backup).with_path(path)?;
    tracing::debug!(file = %path.display(), backup = %backup.display(), "Backup created");
    Ok(backup)
}

/// Restore `path` from its backup and remove the backup.
///
/// # Errors
///
/// Returns `BackupNotFound` if there is no backup, or an IO error.
pub fn restore_backup(path: &Path, suffix: &str) -> Result<()> {
    let backup = backup_path(path, suffix);
    if !backup.is_file() {
        return Err(crate::err!(BackupNotFound { path: backup }));
    }

    std::fs::copy(&backup, path).with_path(path)?;
    std::fs::remove_file(&backup).with_path(&backup)?;
    tracing::info!(file = %path.display(), "Restored from backup");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{CommentParser, Parser};
    use crate::validator::SchemaValidator;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use test_case::test_case;

    const SCHEMA: &str = r#"
global:
  required_prefixes: ["@metadata"]
  prefix_rules:
    "@metadata":
      required_fields: [owner, team]
      optional_fields: [priority]
      nested_fields:
        contact:
          required_fields: [email]
          optional_fields: [slack]
"#;

    fn schema() -> ValidationSchema {
        ValidationSchema::from_yaml(SCHEMA, "<inline>").unwrap()
    }

    fn run_fix(schema: &ValidationSchema, content: &str) -> (FixOutcome, usize) {
        let parser = CommentParser::new(["@metadata", "@docs", "@config"]);
        let path = PathBuf::from("main.tf");
        let resources = parser.parse_content(content, &path).unwrap();
        let errors = SchemaValidator::new(schema.clone()).validate_resources(&resources).errors;

        let outcome = CommentFixer::new(schema).fix_content(content, &resources, &errors);

        let fixed = parser.parse_content(&outcome.content, &path).unwrap();
        let remaining = SchemaValidator::new(schema.clone()).validate_resources(&fixed).errors.len();
        (outcome, remaining)
    }

    #[test]
    fn test_missing_prefix_inserted_above_resource() {
        let schema = schema();
        let content = "resource \"aws_vpc\" \"main\" {\n  cidr_block = \"10.0.0.0/16\"\n}\n";
        let (outcome, remaining) = run_fix(&schema, content);

        assert_eq!(
            outcome.content,
            "# @metadata owner:CHANGEME team:CHANGEME\n# contact.email:changeme@example.com\nresource \"aws_vpc\" \"main\" {\n  cidr_block = \"10.0.0.0/16\"\n}\n"
        );
        assert_eq!(outcome.fix_count, 1);
        assert_eq!(outcome.fixed_resources, vec!["aws_vpc.main"]);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_missing_field_adds_new_block() {
        let schema = schema();
        let content = "# @metadata owner:team-a contact.email:a@b.com\nresource \"aws_vpc\" \"main\" {}\n";
        let (outcome, remaining) = run_fix(&schema, content);

        assert_eq!(
            outcome.content,
            "# @metadata team:CHANGEME\n# @metadata owner:team-a contact.email:a@b.com\nresource \"aws_vpc\" \"main\" {}\n"
        );
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_user_comment_kept_apart() {
        let schema = schema();
        let content = "locals {}\n# The main network\nresource \"aws_vpc\" \"main\" {}\n";
        let (outcome, remaining) = run_fix(&schema, content);

        assert_eq!(
            outcome.content,
            "locals {}\n# The main network\n\n# @metadata owner:CHANGEME team:CHANGEME\n# contact.email:changeme@example.com\nresource \"aws_vpc\" \"main\" {}\n"
        );
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_missing_nested_structure_fixed() {
        let schema = schema();
        let content = "\n# @metadata owner:a team:b\nresource \"aws_vpc\" \"main\" {}\n";
        let (outcome, remaining) = run_fix(&schema, content);

        assert_eq!(
            outcome.content,
            "\n# @metadata contact.email:changeme@example.com\n# @metadata owner:a team:b\nresource \"aws_vpc\" \"main\" {}\n"
        );
        assert_eq!(remaining, 0);
    }

    const DEEP_SCHEMA: &str = r#"
global:
  required_prefixes: ["@metadata"]
  prefix_rules:
    "@metadata":
      required_fields: [owner, team]
      nested_fields:
        contact:
          required_fields: [email]
        oncall:
          required_fields: [phone]
"#;

    #[test]
    fn test_addition_keeps_comment_within_lookback() {
        let schema = ValidationSchema::from_yaml(DEEP_SCHEMA, "<inline>").unwrap();
        let content = "# @metadata owner:a\n# first note\n# second note\nresource \"aws_instance\" \"web\" {}\n";
        let (outcome, remaining) = run_fix(&schema, content);

        assert_eq!(
            outcome.content,
            "# @metadata team:CHANGEME contact.email:changeme@example.com oncall.phone:555-0000\n# @metadata owner:a\n# first note\n# second note\nresource \"aws_instance\" \"web\" {}\n"
        );
        assert_eq!(outcome.fix_count, 1);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_fix_that_would_detach_comment_is_skipped() {
        let schema = ValidationSchema::from_yaml(DEEP_SCHEMA, "<inline>").unwrap();
        let content = "# @metadata owner:a\n# one\n# two\n# three\n# four\nresource \"aws_instance\" \"web\" {}\n";
        let (outcome, remaining) = run_fix(&schema, content);

        assert_eq!(outcome.content, content);
        assert_eq!(outcome.fix_count, 0);
        assert!(outcome.fixed_resources.is_empty());
        assert_eq!(outcome.unfixed_resources, vec!["aws_instance.web"]);
        assert_eq!(remaining, 3);
    }

    #[test]
    fn test_shared_comment_gets_one_addition() {
        let schema = ValidationSchema::from_yaml(DEEP_SCHEMA, "<inline>").unwrap();
        let content = "# @metadata owner:a team:b oncall.phone:1\nresource \"a\" \"one\" {}\nresource \"a\" \"two\" {}\n";
        let (outcome, remaining) = run_fix(&schema, content);

        assert_eq!(
            outcome.content,
            "# @metadata contact.email:changeme@example.com\n# @metadata owner:a team:b oncall.phone:1\nresource \"a\" \"one\" {}\nresource \"a\" \"two\" {}\n"
        );
        assert_eq!(outcome.fix_count, 1);
        assert_eq!(outcome.fixed_resources, vec!["a.one", "a.two"]);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_crlf_line_endings_kept() {
        let schema = schema();
        let content = "locals {}\r\n# The main network\r\nresource \"aws_vpc\" \"main\" {}\r\n";
        let (outcome, remaining) = run_fix(&schema, content);

        assert_eq!(
            outcome.content,
            "locals {}\r\n# The main network\r\n\r\n# @metadata owner:CHANGEME team:CHANGEME\r\n# contact.email:changeme@example.com\r\nresource \"aws_vpc\" \"main\" {}\r\n"
        );
        assert!(!outcome.content.replace("\r\n", "").contains('\n'));
        assert_eq!(remaining, 0);
    }

    const TWO_PREFIXES: &str = r#"
global:
  required_prefixes: ["@metadata", "@config"]
  prefix_rules:
    "@metadata":
      required_fields: [owner, team]
    "@config":
      required_fields: [encrypted, backup]
"#;

    #[test]
    fn test_missing_prefixes_get_separate_blocks() {
        let schema = ValidationSchema::from_yaml(TWO_PREFIXES, "<inline>").unwrap();
        let (outcome, remaining) = run_fix(&schema, "resource \"a\" \"b\" {}\n");

        assert_eq!(
            outcome.content,
            "# @metadata owner:CHANGEME team:CHANGEME\n\n# @config encrypted:true backup:true\nresource \"a\" \"b\" {}\n"
        );
        assert_eq!(outcome.fix_count, 2);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_new_block_kept_apart_from_other_prefix() {
        let schema = ValidationSchema::from_yaml(TWO_PREFIXES, "<inline>").unwrap();
        let content = "# @config encrypted:true\nresource \"a\" \"b\" {}\n";
        let (outcome, remaining) = run_fix(&schema, content);

        assert_eq!(
            outcome.content,
            "# @metadata owner:CHANGEME team:CHANGEME\n\n# @config backup:true\n# @config encrypted:true\nresource \"a\" \"b\" {}\n"
        );
        assert_eq!(outcome.fix_count, 2);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_derive_fixes_keys_additions_by_comment() {
        let schema = ValidationSchema::from_yaml(TWO_PREFIXES, "<inline>").unwrap();
        let content = "# @config encrypted:true\n\n# @metadata owner:a\nresource \"a\" \"b\" {}\n";
        let parser = CommentParser::new(["@metadata", "@config"]);
        let resources = parser.parse_content(content, &PathBuf::from("main.tf")).unwrap();
        let errors = SchemaValidator::new(schema.clone()).validate_resource(&resources[0]);
        let refs: Vec<&ValidationError> = errors.iter().collect();

        let fixes = CommentFixer::new(&schema).derive_fixes(&resources[0], &refs);

        assert!(fixes.missing.is_empty());
        assert_eq!(fixes.len(), 2);
        let lines: Vec<usize> = fixes.additions.iter().map(|(line, _)| *line).collect();
        assert_eq!(lines, vec![1, 3]);
        assert!(fixes.additions[0].1.fields.contains_key("backup"));
        assert!(fixes.additions[1].1.fields.contains_key("team"));
    }

    #[test]
    fn test_multiple_resources_fixed_bottom_up() {
        let schema = schema();
        let content = "resource \"a\" \"one\" {}\n\nresource \"a\" \"two\" {}\n";
        let (outcome, remaining) = run_fix(&schema, content);

        assert_eq!(outcome.fix_count, 2);
        assert_eq!(outcome.fixed_resources, vec!["a.one", "a.two"]);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_fixing_is_idempotent() {
        let schema = schema();
        let content = "resource \"aws_vpc\" \"main\" {}\n";
        let (first, _) = run_fix(&schema, content);
        let (second, remaining) = run_fix(&schema, &first.content);

        assert_eq!(second.fix_count, 0);
        assert_eq!(second.content, first.content);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_prefix_without_rule_is_not_fixed() {
        let schema = ValidationSchema::from_yaml("global:\n  required_prefixes: [\"@docs\"]\n", "<inline>").unwrap();
        let (outcome, remaining) = run_fix(&schema, "resource \"a\" \"b\" {}\n");

        assert_eq!(outcome.fix_count, 0);
        assert_eq!(remaining, 1);
    }

    #[test]
    fn test_duplicate_addresses_fixed_independently() {
        let schema = schema();
        let content = "resource \"a\" \"x\" {}\n\n# @metadata owner:o team:t contact.email:e\nresource \"a\" \"x\" {}\n";
        let (outcome, remaining) = run_fix(&schema, content);

        assert_eq!(outcome.fix_count, 1);
        assert!(outcome.content.starts_with("# @metadata owner:CHANGEME"));
        assert_eq!(remaining, 0);
    }

    #[test_case(&["resource \"a\" \"b\" {}"], 1, 0, false ; "top of file")]
    #[test_case(&["", "resource \"a\" \"b\" {}"], 2, 1, false ; "below blank line")]
    #[test_case(&["}", "resource \"a\" \"b\" {}"], 2, 1, false ; "below code")]
    #[test_case(&["# user", "resource \"a\" \"b\" {}"], 2, 1, true ; "below user comment")]
    #[test_case(&["", "# @metadata x:y", "resource \"a\" \"b\" {}"], 3, 1, false ; "skips managed comments")]
    #[test_case(&["# @metadata x:y", "resource \"a\" \"b\" {}"], 2, 0, false ; "managed comments up to top")]
    #[test_case(&["# user", "// terraform: x", "resource \"a\" \"b\" {}"], 3, 1, true ; "user comment above managed")]
    fn test_find_insertion_point(lines: &[&str], start_line: usize, index: usize, separator: bool) {
        let schema = ValidationSchema::default();
        let fixer = CommentFixer::new(&schema);

        assert_eq!(fixer.find_insertion_point(lines, start_line), Insertion { index, separator });
    }

    #[test]
    fn test_group_errors_strips_file_qualifier() {
        let mut resource = Resource::new("aws_vpc", "main", 3, 4);
        resource.file_path = PathBuf::from("main.tf");
        let mut error = ValidationError::new(
            &resource,
            3,
            ViolationKind::MissingPrefix { prefix: "@metadata".into() },
        );
        error.resource_type = "aws_vpc (main.tf)".to_string();

        let grouped = group_errors(std::slice::from_ref(&error));
        assert!(grouped.contains_key(&("aws_vpc".to_string(), "main".to_string(), 3)));
    }

    #[test]
    fn test_backup_and_restore() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("main.tf");
        std::fs::write(&file, "original").unwrap();

        let backup = create_backup(&file, ".bak").unwrap();
        assert_eq!(backup, dir.path().join("main.tf.bak"));

        std::fs::write(&file, "changed").unwrap();
        restore_backup(&file, ".bak").unwrap();

        assert_eq!(std::fs::read_to_string(&file).unwrap(), "original");
        assert!(!backup.exists());
        assert!(matches!(
            restore_backup(&file, ".bak"),
            Err(TerranotateError::BackupNotFound { .. })
        ));
    }
}
