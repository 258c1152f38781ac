//! Configuration module for Terranotate.
//!
//! This module handles loading and validating configuration from:
//! - YAML configuration files (`terranotate.yaml`)
//! - Environment variables
//! - CLI arguments
//!
//! The validation schema itself is a separate document, see
//! [`crate::validator::ValidationSchema`].
//!
//! # Configuration File Format
//!
//! ```yaml
//! # terranotate.yaml
//!
//! parser:
//!   prefixes: ["@metadata", "@docs", "@validation", "@config"]
//!   lookback_lines: 5
//!
//! fixer:
//!   managed_markers: ["@", "terraform:"]
//!   backup_suffix: .bak
//!   placeholders:
//!     owner: ${USER}   # Environment variable expansion
//!
//! scan:
//!   exclude_patterns: ["legacy*"]
//!   continue_on_error: true
//!
//! output:
//!   colored: true
//!   verbose: false
//!   pretty: true
//! ```

use crate::error::{Result, TerranotateError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Configuration files looked up in the working directory, in order.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["terranotate.yaml", "terranotate.yml", ".terranotate.yaml"];

static BRACED_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("Invalid regex"));

static BARE_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("Invalid regex"));

/// Comment parsing options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Recognised comment prefixes. Order matters: first match wins.
    pub prefixes: Vec<String>,

    /// How many lines above a resource a comment may start and still precede it.
    pub lookback_lines: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            prefixes: ["@metadata", "@docs", "@validation", "@config"]
                .into_iter()
                .map(String::from)
                .collect(),
            lookback_lines: crate::parser::DEFAULT_LOOKBACK_LINES,
        }
    }
}

/// Fixer options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixerOptions {
    /// Comment text prefixes identifying comments owned by Terranotate.
    pub managed_markers: Vec<String>,

    /// Placeholder values merged over the built-in table.
    pub placeholders: BTreeMap<String, String>,

    /// Suffix appended to a file name for its backup copy.
    pub backup_suffix: String,
}

impl Default for FixerOptions {
    fn default() -> Self {
        Self {
            managed_markers: vec!["@".to_string(), "terraform:".to_string()],
            placeholders: BTreeMap::new(),
            backup_suffix: ".bak".to_string(),
        }
    }
}

/// Scanning options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// File or directory name patterns to exclude (glob patterns).
    pub exclude_patterns: Vec<String>,

    /// Continue scanning even if some files fail to parse.
    pub continue_on_error: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
            continue_on_error: true,
        }
    }
}

/// Output options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Use colored output.
    pub colored: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            colored: true,
            verbose: false,
            pretty: true,
        }
    }
}

/// Main configuration structure with nested sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Comment parsing options
    pub parser: ParserOptions,

    /// Fixer options
    pub fixer: FixerOptions,

    /// Scanning options
    pub scan: ScanOptions,

    /// Output options
    pub output: OutputOptions,
}

impl Config {
    /// Load configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or the prefix list is empty.
    pub fn from_yaml(content: &str) -> Result<Self> {
        tracing::debug!("Parsing configuration from YAML");
        let expanded = expand_env_vars(content);

        let config: Config = serde_yaml::from_str(&expanded).map_err(|e| {
            TerranotateError::config_parse(e.to_string(), Some(Box::new(e)), file!(), line!())
        })?;

        if config.parser.prefixes.iter().all(|p| p.trim().is_empty()) {
            return Err(TerranotateError::config_parse(
                "parser.prefixes must contain at least one non-empty prefix".to_string(),
                None,
                file!(),
                line!(),
            ));
        }

        tracing::debug!(
            prefixes = config.parser.prefixes.len(),
            lookback_lines = config.parser.lookback_lines,
            continue_on_error = config.scan.continue_on_error,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TerranotateError::io(path, e, file!(), line!()))?;
        Self::from_yaml(&content)
    }

    /// Resolve the configuration for a run.
    ///
    /// Priority order:
    /// 1. `explicit` path (from `--config` or `TERRANOTATE_CONFIG`)
    /// 2. The first of [`DEFAULT_CONFIG_FILES`] found in `dir`
    /// 3. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a selected file cannot be read or is invalid.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "Loading configuration from explicit path");
            return Self::from_file(path);
        }

        for name in DEFAULT_CONFIG_FILES {
            let candidate: PathBuf = dir.join(name);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "Found configuration file");
                return Self::from_file(&candidate);
            }
        }

        tracing::debug!("No configuration file found, using default configuration");
        Ok(Self::default())
    }

    /// Merge CLI arguments into the configuration.
    pub fn merge_cli_args(&mut self, args: &crate::cli::ScanArgs) {
        if !args.exclude.is_empty() {
            self.scan.exclude_patterns.extend(args.exclude.iter().cloned());
        }
        if args.fail_fast {
            self.scan.continue_on_error = false;
        }
        if !args.prefixes.is_empty() {
            self.parser.prefixes.clone_from(&args.prefixes);
        }
    }

    /// Generate an example YAML configuration.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# Terranotate Configuration File

# Comment parsing
parser:
  # Recognised comment prefixes; the first matching prefix wins
  prefixes:
    - "@metadata"
    - "@docs"
    - "@validation"
    - "@config"

  # Comments starting up to this many lines above a resource are attached to it
  lookback_lines: 5

# Auto-fixing
fixer:
  # Comments whose text starts with one of these are treated as managed
  managed_markers:
    - "@"
    - "terraform:"

  # Extension appended to the backup written before a file is fixed
  backup_suffix: .bak

  # Placeholder overrides (field name -> value)
  # placeholders:
  #   owner: platform-team
  #   cost_center: CC-0000

# Directory scanning
scan:
  # File or directory names to skip (glob patterns)
  exclude_patterns: []

  # Log and skip files that fail to parse instead of aborting
  continue_on_error: true

# Output options
output:
  colored: true
  verbose: false
  pretty: true
"#
        .to_string()
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. Unset variables are left as-is.
fn expand_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });

    BARE_VAR
        .replace_all(&braced, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
