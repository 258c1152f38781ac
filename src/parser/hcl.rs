//! Terraform resource extraction and comment association.
//!
//! This module checks syntax and locates resource blocks with the `hcl-edit`
//! crate, whose syntax tree keeps byte spans for every block and expression.
//! Comments come from the scanner in [`super::lexer`].

use crate::config::Config;
use crate::error::{Result, TerranotateError};
use crate::parser::comments::extract_structured;
use crate::parser::lexer::tokenize;
use crate::parser::Parser;
use crate::types::{Resource, StructuredComment};

use hcl_edit::structure::{Block, BlockLabel};
use hcl_edit::Span;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

/// Number of lines above a resource searched for preceding comments.
pub const DEFAULT_LOOKBACK_LINES: usize = 5;

/// Parser for structured comments attached to Terraform resources.
#[derive(Debug, Clone)]
pub struct CommentParser {
    /// Recognised prefixes, in match order
    prefixes: Vec<String>,

    /// Lookback window for preceding comments
    lookback_lines: usize,
}

impl CommentParser {
    /// Create a parser recognising `prefixes` (first match wins).
    #[must_use]
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            lookback_lines: DEFAULT_LOOKBACK_LINES,
        }
    }

    /// Create a parser from the `parser` section of the configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.parser.prefixes.iter().cloned()).with_lookback(config.parser.lookback_lines)
    }

    /// Override the preceding-comment lookback window.
    #[must_use]
    pub fn with_lookback(mut self, lines: usize) -> Self {
        self.lookback_lines = lines;
        self
    }

    /// Recognised prefixes, in match order.
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Parse a single Terraform file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid HCL.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<Resource>> {
        tracing::debug!(file = %path.display(), "Parsing file");

        let content = std::fs::read_to_string(path)
            .map_err(|e| TerranotateError::io(path, e, file!(), line!()))?;

        self.parse_content(&content, path)
    }
}

impl Parser for CommentParser {
    fn parse_content(&self, content: &str, file_path: &Path) -> Result<Vec<Resource>> {
        let body = hcl_edit::parser::parse_body(content).map_err(|e| {
            let location = e.location();
            TerranotateError::hcl_parse(
                file_path.to_path_buf(),
                e.message().to_string(),
                Some(location.line()),
                Some(location.column()),
                file!(),
                line!(),
            )
        })?;

        let comments = extract_structured(&tokenize(content), &self.prefixes);
        let index = LineIndex::new(content);

        let mut resources = Vec::new();
        for block in body.blocks().filter(|b| b.ident.value().as_str() == "resource") {
            let mut resource = build_resource(block, content, &index, file_path)?;
            attach_comments(&mut resource, &comments, self.lookback_lines);
            resources.push(resource);
        }

        tracing::debug!(
            file = %file_path.display(),
            resources = resources.len(),
            comments = comments.len(),
            "Parsed file"
        );

        Ok(resources)
    }
}

/// Maps byte offsets to 1-based line numbers.
struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(offset, _)| offset + 1));
        Self { line_starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line + 1,
            Err(next) => next,
        }
    }

    fn line_range(&self, span: &Range<usize>) -> (usize, usize) {
        let start = self.line_of(span.start);
        let end = self.line_of(span.end.saturating_sub(1).max(span.start));
        (start, end)
    }
}

fn label_text(label: &BlockLabel) -> &str {
    match label {
        BlockLabel::String(s) => s.value().as_str(),
        BlockLabel::Ident(ident) => ident.value().as_str(),
    }
}

fn build_resource(block: &Block, source: &str, index: &LineIndex, file_path: &Path) -> Result<Resource> {
    let [resource_type, name] = block.labels.as_slice() else {
        return Err(crate::err!(HclStructure {
            file: file_path.to_path_buf(),
            message: format!(
                "resource block must have exactly two labels, found {}",
                block.labels.len()
            ),
        }));
    };

    let span = block.span().ok_or_else(|| {
        crate::err!(HclStructure {
            file: file_path.to_path_buf(),
            message: format!("resource '{}' has no source position", label_text(name)),
        })
    })?;
    let (start_line, end_line) = index.line_range(&span);

    let mut resource = Resource::new(label_text(resource_type), label_text(name), start_line, end_line);
    resource.file_path = file_path.to_path_buf();
    resource.attributes = raw_attributes(block, source);

    Ok(resource)
}

/// Top-level attributes of a block as their raw expression text.
fn raw_attributes(block: &Block, source: &str) -> BTreeMap<String, String> {
    block
        .body
        .attributes()
        .map(|attr| {
            let raw = attr
                .value
                .span()
                .and_then(|span| source.get(span))
                .map_or_else(|| attr.value.to_string(), str::to_string);
            (attr.key.value().as_str().to_string(), raw.trim().to_string())
        })
        .collect()
}

/// Split comments into preceding and inline relative to `resource`.
///
/// A comment precedes the resource when it starts within `lookback` lines
/// above it, and is inline when it starts inside the block's line range.
fn attach_comments(resource: &mut Resource, comments: &[StructuredComment], lookback: usize) {
    for comment in comments {
        if comment.line < resource.start_line && comment.line + lookback >= resource.start_line {
            resource.preceding_comments.push(comment.clone());
        }
        if (resource.start_line..=resource.end_line).contains(&comment.line) {
            resource.inline_comments.push(comment.clone());
        }
    }
}
