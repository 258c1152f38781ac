//! Terranotate CLI entry point.
//!
//! This binary provides the command-line interface for Terranotate.

use clap::Parser;
use colored::Colorize;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use terranotate::cli::{Cli, Commands, FixArgs, GenerateArgs, InitArgs, OutputArgs, ParseArgs, RevertArgs, ScanArgs, ValidateArgs};
use terranotate::fixer::restore_backup;
use terranotate::reporter::Reporter;
use terranotate::{workspace, CommentParser, Config, FixMode, Scanner, TerranotateError, ValidationSchema};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name written by `init` next to the configuration.
const EXAMPLE_SCHEMA_FILE: &str = "schema.yaml";

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");

            eprintln!("Error: {e}");

            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut i = 0;
                while let Some(cause) = source {
                    eprintln!("  {i}: {cause}");
                    source = cause.source();
                    i += 1;
                }
            }

            let code = e
                .downcast_ref::<TerranotateError>()
                .map_or(1, TerranotateError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let base_level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(format!("warn,terranotate={base_level}"))
        })
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    tracing::debug!("Loading configuration");
    let mut config = Config::discover(cli.config.as_deref(), Path::new("."))?;
    config.output.verbose |= cli.verbose > 0;

    match cli.command {
        Commands::Parse(args) => parse(&mut config, &args),
        Commands::Validate(args) => validate(&mut config, &args),
        Commands::Fix(args) => fix(&mut config, &args),
        Commands::Revert(args) => revert(&mut config, &args),
        Commands::Generate(args) => generate(&mut config, &args),
        Commands::Init(args) => init(&args),
    }
}

fn apply_args(config: &mut Config, scan: &ScanArgs, output: Option<&OutputArgs>) {
    config.merge_cli_args(scan);
    if output.is_some_and(|o| o.no_color) {
        config.output.colored = false;
    }
    if !config.output.colored {
        colored::control::set_override(false);
    }
}

fn emit(output: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn parse(config: &mut Config, args: &ParseArgs) -> anyhow::Result<ExitCode> {
    apply_args(config, &args.scan, Some(&args.output));

    let parser = CommentParser::from_config(config);
    let resources = parser.parse_file(&args.file)?;

    let listing = Reporter::new(config).resources(&args.file, &resources, args.output.format)?;
    emit(args.output.output.as_deref(), &listing)?;
    Ok(ExitCode::SUCCESS)
}

fn scanner(config: &Config, schema: &Path) -> anyhow::Result<Scanner> {
    let schema = ValidationSchema::from_file(schema)?;
    Ok(Scanner::new(config.clone(), schema))
}

fn validate(config: &mut Config, args: &ValidateArgs) -> anyhow::Result<ExitCode> {
    apply_args(config, &args.scan, Some(&args.output));

    let batch = scanner(config, &args.schema)?.validate_path(&args.path)?;

    let report = Reporter::new(config).generate(&batch.result, args.output.format)?;
    emit(args.output.output.as_deref(), &report)?;

    if !batch.skipped.is_empty() {
        for error in batch.skipped.errors() {
            eprintln!("  {error}");
        }
        eprintln!("{} file(s) could not be parsed and were skipped", batch.skipped.count());
    }

    Ok(if batch.result.passed && batch.skipped.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn fix(config: &mut Config, args: &FixArgs) -> anyhow::Result<ExitCode> {
    apply_args(config, &args.scan, None);

    let mode = FixMode {
        dry_run: args.dry_run,
        backup: !args.no_backup,
    };
    let report = scanner(config, &args.schema)?.fix_path(&args.path, mode)?;

    for unfixed in &report.unfixed {
        println!(
            "{} Skipped {}: fixing it would move a comment out of the lookback window",
            "!".yellow(),
            unfixed
        );
    }

    if report.fixed.is_empty() {
        println!("{} No fixable issues found", "✓".green());
        return Ok(ExitCode::SUCCESS);
    }

    for file in &report.fixed {
        if args.dry_run {
            println!(
                "Would apply {} fix(es) to {} ({})",
                file.outcome.fix_count,
                file.path.display(),
                file.outcome.fixed_resources.join(", ")
            );
            println!("{}", file.outcome.content);
            continue;
        }

        println!(
            "{} Applied {} fix(es) to {}",
            "✓".green(),
            file.outcome.fix_count,
            file.path.display()
        );
        if let Some(backup) = &file.backup {
            println!("  Backup saved as {}", backup.display());
        }
    }

    println!(
        "\nFix summary: {} file(s) processed, {} file(s) fixed, {} fix(es) applied",
        report.files_processed,
        report.fixed.len(),
        report.fix_count()
    );

    match &report.remaining {
        Some(remaining) if remaining.passed => {
            println!("{} All fixable issues resolved", "✓".green());
        }
        Some(remaining) => println!(
            "{} {} issue(s) remain and may need manual attention",
            "!".yellow(),
            remaining.errors.len()
        ),
        None => {}
    }

    Ok(ExitCode::SUCCESS)
}

fn revert(config: &mut Config, args: &RevertArgs) -> anyhow::Result<ExitCode> {
    apply_args(config, &args.scan, None);

    let suffix = &config.fixer.backup_suffix;
    let originals = workspace::find_backups(&args.path, &config.scan, suffix)?;
    if originals.is_empty() {
        println!("No backup files found to revert.");
        return Ok(ExitCode::SUCCESS);
    }

    let mut reverted = 0;
    let mut failed = 0;
    for original in &originals {
        match restore_backup(original, suffix) {
            Ok(()) => {
                println!("{} Reverted {}", "✓".green(), original.display());
                reverted += 1;
            }
            Err(e) => {
                tracing::warn!(file = %original.display(), "failed to revert: {}", e);
                failed += 1;
            }
        }
    }

    println!("\nRevert summary: {reverted} file(s) reverted");
    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::from(1) })
}

fn generate(config: &mut Config, args: &GenerateArgs) -> anyhow::Result<ExitCode> {
    apply_args(config, &args.scan, None);

    let name = args.name.clone().unwrap_or_else(|| module_name(&args.path));
    let markdown = scanner(config, &args.schema)?.generate_docs(&args.path, &name)?;

    emit(args.output.as_deref(), &markdown)?;
    Ok(ExitCode::SUCCESS)
}

fn init(args: &InitArgs) -> anyhow::Result<ExitCode> {
    let config_path = args.dir.join(terranotate::config::DEFAULT_CONFIG_FILES[0]);
    let schema_path = args.dir.join(EXAMPLE_SCHEMA_FILE);

    for path in [&config_path, &schema_path] {
        if path.exists() && !args.force {
            anyhow::bail!("File already exists: {} (use --force to overwrite)", path.display());
        }
    }

    std::fs::write(&config_path, Config::example_yaml())?;
    println!("Created example configuration: {}", config_path.display());
    std::fs::write(&schema_path, ValidationSchema::example_yaml())?;
    println!("Created example schema: {}", schema_path.display());
    Ok(ExitCode::SUCCESS)
}

/// Directory name used as the document title.
fn module_name(path: &Path) -> String {
    let dir = if path.is_file() { path.parent() } else { Some(path) };
    dir.and_then(|d| std::fs::canonicalize(d).ok())
        .and_then(|d| d.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "module".to_string())
}
