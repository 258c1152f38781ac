//! Comment-aware scanner for Terraform source text.
//!
//! The syntax tree produced by `hcl-edit` keeps comments as opaque
//! decor, so the scanner walks the raw text once and reports every comment
//! with its line range. Everything else collapses into `Code` tokens, which
//! is all the block grouping needs to know.

/// A lexical token relevant to comment grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A `#`, `//` or `/* */` comment, markers included.
    Comment {
        /// First line (1-based)
        line: usize,
        /// Last line (1-based); differs from `line` for multi-line `/* */`
        end_line: usize,
        /// Comment text as written
        text: String,
    },
    /// A run of non-comment tokens, identified by the line it starts on.
    Code {
        /// First line (1-based)
        line: usize,
    },
}

impl Token {
    /// Line the token starts on.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Comment { line, .. } | Self::Code { line } => *line,
        }
    }
}

/// Scan `source` into comment and code tokens.
///
/// Quoted strings (including `${ }` and `%{ }` templates) and heredocs are
/// skipped so that `#` or `//` inside them is never mistaken for a comment.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(byte) = self.current() {
            match byte {
                b'\n' => self.newline(),
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'#' => self.line_comment(),
                b'/' if self.peek(1) == Some(b'/') => self.line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.block_comment(),
                b'"' => {
                    self.code();
                    self.pos += 1;
                    self.skip_string();
                }
                b'<' if self.peek(1) == Some(b'<') && self.heredoc() => {}
                _ => {
                    self.code();
                    self.pos += 1;
                }
            }
        }

        self.tokens
    }

    fn current(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn newline(&mut self) {
        self.line += 1;
        self.pos += 1;
    }

    /// Record code on the current line, merging with a preceding code token.
    fn code(&mut self) {
        if !matches!(self.tokens.last(), Some(Token::Code { .. })) {
            self.tokens.push(Token::Code { line: self.line });
        }
    }

    fn line_comment(&mut self) {
        let start = self.pos;
        while let Some(byte) = self.current() {
            if byte == b'\n' {
                break;
            }
            self.pos += 1;
        }

        self.tokens.push(Token::Comment {
            line: self.line,
            end_line: self.line,
            text: self.source[start..self.pos].trim_end().to_string(),
        });
    }

    fn block_comment(&mut self) {
        let start = self.pos;
        let start_line = self.line;
        self.pos += 2;

        loop {
            match self.current() {
                None => break,
                Some(b'*') if self.peek(1) == Some(b'/') => {
                    self.pos += 2;
                    break;
                }
                Some(b'\n') => self.newline(),
                Some(_) => self.pos += 1,
            }
        }

        self.tokens.push(Token::Comment {
            line: start_line,
            end_line: self.line,
            text: self.source[start..self.pos].to_string(),
        });
    }

    /// Skip a quoted string; `pos` is just past the opening quote.
    fn skip_string(&mut self) {
        while let Some(byte) = self.current() {
            match byte {
                b'\\' => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    return;
                }
                // `$${` and `%%{` are escaped template openers
                b'$' | b'%' if self.peek(1) == Some(byte) => self.pos += 2,
                b'$' | b'%' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.skip_template();
                }
                b'\n' => self.newline(),
                _ => self.pos += 1,
            }
        }
    }

    /// Skip a template interpolation; `pos` is just past the opening brace.
    fn skip_template(&mut self) {
        let mut depth = 1usize;
        while let Some(byte) = self.current() {
            match byte {
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' => {
                    self.pos += 1;
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                b'"' => {
                    self.pos += 1;
                    self.skip_string();
                }
                b'\n' => self.newline(),
                _ => self.pos += 1,
            }
        }
    }

    /// Skip a `<<EOF` / `<<-EOF` heredoc if one starts here.
    ///
    /// Returns false when the `<<` is not a heredoc opener.
    fn heredoc(&mut self) -> bool {
        let mut cursor = self.pos + 2;
        if self.bytes.get(cursor) == Some(&b'-') {
            cursor += 1;
        }

        let ident_start = cursor;
        while self
            .bytes
            .get(cursor)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            cursor += 1;
        }
        if cursor == ident_start {
            return false;
        }

        let rest_of_line = self.source[cursor..].split('\n').next().unwrap_or_default();
        if !rest_of_line.trim().is_empty() {
            return false;
        }

        let ident = &self.source[ident_start..cursor];
        self.code();
        self.pos = cursor + rest_of_line.len();

        while self.current() == Some(b'\n') {
            self.newline();
            let body_line = self.source[self.pos..].split('\n').next().unwrap_or_default();
            self.pos += body_line.len();
            if body_line.trim() == ident {
                break;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comments(tokens: &[Token]) -> Vec<(usize, &str)> {
        tokens
            .iter()
            .filter_map(|t| match t {
                Token::Comment { line, text, .. } => Some((*line, text.as_str())),
                Token::Code { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_all_comment_styles() {
        let source = "# hash\n// slash\n/* block */\n";
        let tokens = tokenize(source);

        assert_eq!(comments(&tokens), vec![(1, "# hash"), (2, "// slash"), (3, "/* block */")]);
    }

    #[test]
    fn test_multiline_block_comment_range() {
        let source = "/* first\n   second\n*/\nlocals {}\n";
        let tokens = tokenize(source);

        assert!(matches!(
            &tokens[0],
            Token::Comment { line: 1, end_line: 3, .. }
        ));
        assert_eq!(tokens[1], Token::Code { line: 4 });
    }

    #[test]
    fn test_code_tokens_collapse() {
        let source = "resource \"a\" \"b\" {\n  x = 1\n}\n# after\n";
        let tokens = tokenize(source);

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], Token::Code { line: 1 });
        assert_eq!(tokens[1].line(), 4);
    }

    #[test]
    fn test_hash_inside_string_is_not_comment() {
        let source = "x = \"a # b // c\"\ny = \"${var.a[\"#\"]}\" # real\n";
        let tokens = tokenize(source);

        assert_eq!(comments(&tokens), vec![(2, "# real")]);
    }

    #[test]
    fn test_heredoc_is_skipped() {
        let source = "x = <<-EOT\n  # not a comment\n  EOT\n# comment\n";
        let tokens = tokenize(source);

        assert_eq!(comments(&tokens), vec![(4, "# comment")]);
    }

    #[test]
    fn test_trailing_comment_after_code() {
        let source = "x = 1 # trailing\n";
        let tokens = tokenize(source);

        assert_eq!(tokens[0], Token::Code { line: 1 });
        assert_eq!(comments(&tokens), vec![(1, "# trailing")]);
    }
}
