//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap, including
//! all commands, arguments, and options.
//!
//! # Commands
//!
//! - `parse`: Show the resources and structured comments of a file
//! - `validate`: Check annotations against a schema
//! - `fix`: Insert missing annotations with placeholder values
//! - `revert`: Restore files from the backups written by `fix`
//! - `generate`: Render annotations as Markdown documentation
//! - `init`: Create example configuration and schema files
//!
//! # Example Usage
//!
//! ```bash
//! # Validate a module
//! terranotate validate ./infra schema.yaml
//!
//! # Machine-readable report
//! terranotate validate ./infra schema.yaml --format json --output report.json
//!
//! # Add missing annotations, then undo
//! terranotate fix ./infra schema.yaml
//! terranotate revert ./infra
//!
//! # Documentation
//! terranotate generate ./infra schema.yaml --output RESOURCES.md
//! ```

use crate::types::ReportFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Terranotate - Terraform comment annotation validator and fixer.
#[derive(Parser, Debug)]
#[command(
    name = "terranotate",
    author,
    version,
    about = "Terraform comment annotation parser, schema validator and auto-fixer",
    long_about = "Terranotate reads structured annotations such as \
                  `# @metadata owner:team-a` from Terraform comments, validates them \
                  against a YAML schema, and inserts placeholder annotations where \
                  required ones are missing."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "TERRANOTATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a Terraform file and display its structured comments
    #[command(visible_alias = "p")]
    Parse(ParseArgs),

    /// Validate comments against a schema
    #[command(visible_alias = "v")]
    Validate(ValidateArgs),

    /// Insert missing comments with placeholder values
    Fix(FixArgs),

    /// Restore files from the backups written by `fix`
    Revert(RevertArgs),

    /// Generate Markdown documentation from comments
    #[command(visible_alias = "g")]
    Generate(GenerateArgs),

    /// Create example configuration and schema files
    Init(InitArgs),
}

/// Options shared by every command that scans Terraform files.
#[derive(Args, Debug, Default, Clone)]
pub struct ScanArgs {
    /// Patterns to exclude from scanning (glob patterns)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Stop at the first file that fails to parse
    #[arg(long)]
    pub fail_fast: bool,

    /// Comment prefixes to recognise, replacing the configured ones
    #[arg(long = "prefix", value_name = "PREFIX")]
    pub prefixes: Vec<String>,
}

/// Report output options.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, default_value = "text", value_enum)]
    pub format: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for the parse command.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Terraform file to parse
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// File discovery and parser options
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Report format and destination
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Terraform file or module directory
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Validation schema (YAML)
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// File discovery and parser options
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Report format and destination
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments for the fix command.
#[derive(Args, Debug)]
pub struct FixArgs {
    /// Terraform file or module directory
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Validation schema (YAML)
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Print the fixes without writing any file
    #[arg(long)]
    pub dry_run: bool,

    /// Do not write a backup before modifying a file
    #[arg(long)]
    pub no_backup: bool,

    /// File discovery and parser options
    #[command(flatten)]
    pub scan: ScanArgs,
}

/// Arguments for the revert command.
#[derive(Args, Debug)]
pub struct RevertArgs {
    /// Terraform file or module directory
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// File discovery and parser options
    #[command(flatten)]
    pub scan: ScanArgs,
}

/// Arguments for the generate command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Terraform file or module directory
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Validation schema (YAML) whose required fields become columns
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Title of the document (defaults to the directory name)
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// File discovery and parser options
    #[command(flatten)]
    pub scan: ScanArgs,
}

/// Arguments for the init command.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to write the example files into
    #[arg(value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parsing() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["terranotate", "validate", "./infra", "schema.yaml"]);
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.path, PathBuf::from("./infra"));
                assert_eq!(args.schema, PathBuf::from("schema.yaml"));
                assert_eq!(args.output.format, ReportFormat::Text);
                assert!(!args.scan.fail_fast);
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_validate_with_options() {
        let cli = Cli::parse_from([
            "terranotate",
            "validate",
            "./infra",
            "schema.yaml",
            "--format",
            "json",
            "--output",
            "report.json",
            "--exclude",
            "vendor",
            "--prefix",
            "@owner",
            "--fail-fast",
        ]);
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.output.format, ReportFormat::Json);
                assert_eq!(args.output.output, Some(PathBuf::from("report.json")));
                assert_eq!(args.scan.exclude, vec!["vendor"]);
                assert_eq!(args.scan.prefixes, vec!["@owner"]);
                assert!(args.scan.fail_fast);
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_fix_command() {
        let cli = Cli::parse_from(["terranotate", "fix", "main.tf", "schema.yaml", "--dry-run"]);
        match cli.command {
            Commands::Fix(args) => {
                assert!(args.dry_run);
                assert!(!args.no_backup);
            }
            _ => panic!("Expected Fix command"),
        }
    }

    #[test]
    fn test_requires_schema() {
        assert!(Cli::try_parse_from(["terranotate", "validate", "./infra"]).is_err());
    }

    #[test]
    fn test_init_defaults() {
        let cli = Cli::parse_from(["terranotate", "init"]);
        match cli.command {
            Commands::Init(args) => {
                assert_eq!(args.dir, PathBuf::from("."));
                assert!(!args.force);
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::parse_from(["terranotate", "-vvv", "--config", "custom.yaml", "parse", "main.tf"]);
        assert_eq!(cli.verbose, 3);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
    }

    #[test]
    fn test_alias() {
        let cli = Cli::parse_from(["terranotate", "v", "./infra", "schema.yaml"]);
        assert!(matches!(cli.command, Commands::Validate(_)));
    }
}
