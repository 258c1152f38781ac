//! `key:value` extraction and typed value coercion.

use crate::types::{FieldMap, FieldValue};
use regex::Regex;
use std::sync::LazyLock;

/// `key:value` where the key may contain dots and the value runs to whitespace.
static FIELD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\w\.]+):(\S+)").expect("Invalid regex"));

static FLOAT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("Invalid regex"));

/// Extract every `key:value` pair from `lines` into a field map.
pub fn parse_fields<'a>(lines: impl IntoIterator<Item = &'a str>) -> FieldMap {
    let mut fields = FieldMap::new();

    for line in lines {
        for captures in FIELD_PATTERN.captures_iter(line) {
            let (_, [key, value]) = captures.extract();
            insert_field(&mut fields, key, coerce_value(value));
        }
    }

    fields
}

/// Coerce a raw token into the most specific value type.
///
/// Order: boolean, integer, float, bracketed list, string.
#[must_use]
pub fn coerce_value(raw: &str) -> FieldValue {
    let raw = raw.trim();

    match raw {
        "true" => return FieldValue::Bool(true),
        "false" => return FieldValue::Bool(false),
        _ => {}
    }

    if let Ok(int) = raw.parse::<i64>() {
        return FieldValue::Integer(int);
    }

    if FLOAT_PATTERN.is_match(raw) {
        if let Ok(float) = raw.parse::<f64>() {
            return FieldValue::Float(float);
        }
    }

    if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect();
        return FieldValue::List(items);
    }

    FieldValue::String(raw.to_string())
}

/// Insert `value` under `key`, building nested maps for dotted keys.
///
/// When a path segment already holds a non-map value (or the key has empty
/// segments) the whole dotted key is stored literally at the top level.
pub fn insert_field(fields: &mut FieldMap, key: &str, value: FieldValue) {
    let segments: Vec<&str> = key.split('.').collect();
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };

    if parents.is_empty() {
        fields.insert(key.to_string(), value);
        return;
    }

    if segments.iter().any(|s| s.is_empty()) || !path_is_nestable(fields, parents) {
        fields.insert(key.to_string(), value);
        return;
    }

    let mut current = fields;
    for segment in parents {
        let entry = current
            .entry((*segment).to_string())
            .or_insert_with(|| FieldValue::Map(FieldMap::new()));
        match entry {
            FieldValue::Map(map) => current = map,
            // path_is_nestable guarantees every segment is a map or absent
            _ => return,
        }
    }
    current.insert((*leaf).to_string(), value);
}

fn path_is_nestable(fields: &FieldMap, parents: &[&str]) -> bool {
    let mut current = fields;
    for segment in parents {
        match current.get(*segment) {
            None => return true,
            Some(FieldValue::Map(map)) => current = map,
            Some(_) => return false,
        }
    }
    true
}
