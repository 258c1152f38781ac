//! Rendering of comment fixes into comment lines.

use crate::validator::PrefixRule;
use std::collections::{BTreeMap, BTreeSet};

/// Fields to add under one prefix, keyed by flat or dotted name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentFix {
    /// Annotation prefix, e.g. `@metadata`
    pub prefix: String,

    /// Field name to placeholder value
    pub fields: BTreeMap<String, String>,
}

impl CommentFix {
    /// Create an empty fix for `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            fields: BTreeMap::new(),
        }
    }
}

/// Render `fix` as `#` comment lines.
///
/// With a rule, the first line holds the prefix and the flat fields in
/// declared order (required, then optional), and each nested group gets its
/// own line. Without one, fields are written in name order.
#[must_use]
pub fn render_fix(fix: &CommentFix, rule: Option<&PrefixRule>) -> Vec<String> {
    let mut rendered: BTreeSet<&str> = BTreeSet::new();
    let mut head = format!("# {}", fix.prefix);
    let mut lines = Vec::new();

    if let Some(rule) = rule {
        for field in rule.required_fields.iter().chain(&rule.optional_fields) {
            push_pair(&mut head, fix, field, &mut rendered);
        }

        for (path, nested) in &rule.nested_fields {
            let mut line = String::from("#");
            for field in nested.required_fields.iter().chain(&nested.optional_fields) {
                push_pair(&mut line, fix, &format!("{path}.{field}"), &mut rendered);
            }
            if line.len() > 1 {
                lines.push(line);
            }
        }
    }

    // Fields the rule does not order: flat ones on the head line, dotted
    // ones grouped by their first segment.
    let mut groups: BTreeMap<&str, String> = BTreeMap::new();
    for key in fix.fields.keys() {
        if rendered.contains(key.as_str()) {
            continue;
        }
        match key.split_once('.') {
            Some((group, _)) => {
                let line = groups.entry(group).or_insert_with(|| String::from("#"));
                push_pair(line, fix, key, &mut rendered);
            }
            None => push_pair(&mut head, fix, key, &mut rendered),
        }
    }

    lines.extend(groups.into_values());
    lines.insert(0, head);
    lines
}

/// Render `fix` as a single `#` comment line, nested groups appended to
/// the head line.
///
/// Used for fields merged into an existing comment, where every extra line
/// would push that comment further from its resource.
#[must_use]
pub fn render_line(fix: &CommentFix, rule: Option<&PrefixRule>) -> String {
    let mut lines = render_fix(fix, rule).into_iter();
    let mut line = lines.next().unwrap_or_else(|| format!("# {}", fix.prefix));
    for rest in lines {
        line.push_str(rest.trim_start_matches('#'));
    }
    line
}

fn push_pair<'a>(line: &mut String, fix: &'a CommentFix, key: &str, rendered: &mut BTreeSet<&'a str>) {
    if let Some((key, value)) = fix.fields.get_key_value(key) {
        if rendered.insert(key.as_str()) {
            line.push(' ');
            line.push_str(key);
            line.push(':');
            line.push_str(value);
        }
    }
}
