//! Comment block grouping and structured comment recognition.

use crate::parser::fields::parse_fields;
use crate::parser::lexer::Token;
use crate::types::{FieldValue, StructuredComment, CONTENT_FIELD};

/// A run of comments on consecutive lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    /// First line (1-based)
    pub line: usize,
    /// Last line (1-based)
    pub end_line: usize,
    /// Comment token texts, markers included
    pub texts: Vec<String>,
}

impl CommentBlock {
    /// Cleaned text of every non-empty comment line in the block.
    #[must_use]
    pub fn cleaned_lines(&self) -> Vec<String> {
        self.texts
            .iter()
            .flat_map(|text| clean_comment(text))
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Group comment tokens into blocks.
///
/// A comment joins the current block when it starts on the line right after
/// the previous comment's start line. Any code token ends the block.
#[must_use]
pub fn group_blocks(tokens: &[Token]) -> Vec<CommentBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<CommentBlock> = None;
    let mut last_start = 0;

    for token in tokens {
        match token {
            Token::Comment { line, end_line, text } => {
                match current.as_mut() {
                    Some(block) if *line == last_start + 1 => {
                        block.end_line = *end_line;
                        block.texts.push(text.clone());
                    }
                    _ => {
                        blocks.extend(current.take());
                        current = Some(CommentBlock {
                            line: *line,
                            end_line: *end_line,
                            texts: vec![text.clone()],
                        });
                    }
                }
                last_start = *line;
            }
            Token::Code { .. } => blocks.extend(current.take()),
        }
    }

    blocks.extend(current);
    blocks
}

/// Strip comment markers from a single comment token.
///
/// `/* */` comments may span several lines; each is returned separately,
/// with a leading `*` continuation marker removed.
#[must_use]
pub fn clean_comment(text: &str) -> Vec<String> {
    let text = text.trim();

    if let Some(body) = text.strip_prefix("/*") {
        let body = body.strip_suffix("*/").unwrap_or(body);
        return body
            .lines()
            .enumerate()
            .map(|(index, line)| {
                let line = line.trim();
                if index > 0 {
                    line.strip_prefix('*').unwrap_or(line).trim().to_string()
                } else {
                    line.to_string()
                }
            })
            .collect();
    }

    let body = text
        .strip_prefix("//")
        .or_else(|| text.strip_prefix('#'))
        .unwrap_or(text);
    vec![body.trim().to_string()]
}

/// Interpret a comment block as a structured comment.
///
/// Returns `None` when the block's first non-empty line does not start with
/// one of `prefixes`. Prefixes are tried in order and the first match wins.
#[must_use]
pub fn parse_block(block: &CommentBlock, prefixes: &[String]) -> Option<StructuredComment> {
    let lines = block.cleaned_lines();
    let first = lines.first()?;
    let prefix = prefixes.iter().find(|p| first.starts_with(p.as_str()))?;

    let mut content_lines: Vec<&str> = Vec::with_capacity(lines.len());
    content_lines.push(first[prefix.len()..].trim());
    content_lines.extend(lines.iter().skip(1).map(String::as_str));

    let mut fields = parse_fields(content_lines.iter().copied());

    let content = content_lines.join("\n").trim().to_string();
    if !content.is_empty() {
        fields.insert(CONTENT_FIELD.to_string(), FieldValue::String(content));
    }

    Some(StructuredComment {
        prefix: prefix.clone(),
        fields,
        raw: lines.join("\n"),
        line: block.line,
        end_line: block.end_line,
    })
}

/// Group tokens and keep only the blocks carrying a recognised prefix.
#[must_use]
pub fn extract_structured(tokens: &[Token], prefixes: &[String]) -> Vec<StructuredComment> {
    let structured: Vec<StructuredComment> = group_blocks(tokens)
        .iter()
        .filter_map(|block| parse_block(block, prefixes))
        .collect();

    tracing::trace!(count = structured.len(), "Extracted structured comments");
    structured
}
