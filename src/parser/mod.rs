//! Structured comment parsing for Terraform/OpenTofu files.
//!
//! This module extracts resource blocks from HCL source and attaches the
//! annotation comments found above and inside each block.
//!
//! # Supported Annotations
//!
//! - A comment block whose first line starts with a configured prefix
//!   (`@metadata`, `@docs`, ...)
//! - Any number of `key:value` pairs on any line of the block
//! - Dotted keys (`contact.email:a@b.com`) building nested mappings
//!
//! # Example
//!
//! ```rust,no_run
//! use terranotate::parser::CommentParser;
//! use std::path::Path;
//!
//! fn main() -> terranotate::Result<()> {
//!     let parser = CommentParser::new(["@metadata", "@docs"]);
//!     let resources = parser.parse_file(Path::new("main.tf"))?;
//!     println!("Found {} resources", resources.len());
//!     Ok(())
//! }
//! ```

mod comments;
mod fields;
mod hcl;
mod lexer;

pub use comments::{clean_comment, group_blocks, parse_block, CommentBlock};
pub use fields::{coerce_value, parse_fields};
pub use hcl::{CommentParser, DEFAULT_LOOKBACK_LINES};
pub use lexer::{tokenize, Token};

use crate::types::Resource;

/// File extension of Terraform/OpenTofu source files.
pub const TERRAFORM_EXTENSION: &str = "tf";

/// Directories never descended into during scanning.
pub const SKIP_DIRS: &[&str] = &[
    ".terraform",
    ".terragrunt-cache",
    "terraform.tfstate.d",
    "node_modules",
];

/// Trait for extracting annotated resources from HCL content.
///
/// This trait allows for different parsing implementations
/// (e.g., for testing with mock parsers).
pub trait Parser: Send + Sync {
    /// Parse a single file's contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the HCL content is invalid.
    fn parse_content(&self, content: &str, file_path: &std::path::Path) -> crate::Result<Vec<Resource>>;
}
