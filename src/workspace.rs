//! Terraform file discovery and batch validation.
//!
//! A path given on the command line may be a single `.tf` file or a module
//! directory. Directories are walked recursively; hidden directories, tool
//! caches and anything matching `scan.exclude_patterns` are skipped.
//! Files are processed one after another and a file that fails to parse is
//! logged and skipped unless `scan.continue_on_error` is disabled.

use crate::config::ScanOptions;
use crate::error::{ErrorCollector, Result};
use crate::fixer::backup_path;
use crate::parser::{CommentParser, SKIP_DIRS, TERRAFORM_EXTENSION};
use crate::types::{Resource, ValidationResult};
use crate::validator::SchemaValidator;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Resources parsed from one file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// The Terraform file
    pub path: PathBuf,
    /// Resources declared in it, in source order
    pub resources: Vec<Resource>,
}

/// Outcome of validating every file below a path.
#[derive(Debug, Default)]
pub struct Batch {
    /// Files that parsed, in scan order
    pub files: Vec<ParsedFile>,

    /// Aggregated validation outcome
    pub result: ValidationResult,

    /// Per-file failures that were skipped
    pub skipped: ErrorCollector,
}

/// List the Terraform files at `path`, sorted.
///
/// # Errors
///
/// Returns `DirectoryNotFound` if `path` does not exist and
/// `NoTerraformFiles` if a directory holds no `.tf` file.
pub fn find_terraform_files(path: &Path, scan: &ScanOptions) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(crate::err!(DirectoryNotFound {
            path: path.to_path_buf(),
        }));
    }

    let files = walk(path, scan, is_terraform_file);
    if files.is_empty() {
        return Err(crate::err!(NoTerraformFiles {
            path: path.to_path_buf(),
        }));
    }

    tracing::debug!(path = %path.display(), files = files.len(), "Discovered Terraform files");
    Ok(files)
}

/// Files below `path` that have a backup with `suffix`.
///
/// Returns the original paths, not the backup paths.
///
/// # Errors
///
/// Returns `DirectoryNotFound` if `path` does not exist.
pub fn find_backups(path: &Path, scan: &ScanOptions, suffix: &str) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        let has_backup = backup_path(path, suffix).is_file();
        return Ok(if has_backup { vec![path.to_path_buf()] } else { Vec::new() });
    }
    if !path.is_dir() {
        return Err(crate::err!(DirectoryNotFound {
            path: path.to_path_buf(),
        }));
    }

    let backup_extension = format!(".{TERRAFORM_EXTENSION}{suffix}");
    let originals = walk(path, scan, |p| {
        p.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(&backup_extension))
    })
    .into_iter()
    .filter_map(|backup| {
        let name = backup.to_str()?.strip_suffix(suffix)?.to_string();
        Some(PathBuf::from(name))
    })
    .collect();

    Ok(originals)
}

/// Parse every Terraform file at `path`.
///
/// # Errors
///
/// Returns discovery errors, and the first per-file failure when
/// `continue_on_error` is off or the failure is not recoverable.
pub fn parse_path(path: &Path, parser: &CommentParser, scan: &ScanOptions) -> Result<(Vec<ParsedFile>, ErrorCollector)> {
    let mut parsed = Vec::new();
    let mut skipped = ErrorCollector::new();

    for file in find_terraform_files(path, scan)? {
        match parser.parse_file(&file) {
            Ok(resources) => parsed.push(ParsedFile { path: file, resources }),
            Err(e) if scan.continue_on_error && e.is_recoverable() => {
                tracing::warn!(file = %file.display(), "failed to parse file, continuing: {}", e);
                skipped.add(e);
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        files = parsed.len(),
        skipped = skipped.count(),
        "Parsing complete"
    );

    Ok((parsed, skipped))
}

/// Parse and validate every Terraform file at `path`.
///
/// # Errors
///
/// See [`parse_path`].
pub fn validate_path(
    path: &Path,
    parser: &CommentParser,
    validator: &SchemaValidator,
    scan: &ScanOptions,
) -> Result<Batch> {
    let (files, skipped) = parse_path(path, parser, scan)?;

    let mut result = ValidationResult::default();
    for file in &files {
        let mut file_result = validator.validate_resources(&file.resources);
        file_result.files.push(file.path.clone());
        result.merge(file_result);
    }

    tracing::info!(
        files = result.files.len(),
        resources = result.resources_checked,
        errors = result.errors.len(),
        "Validation complete"
    );

    Ok(Batch { files, result, skipped })
}

fn walk(root: &Path, scan: &ScanOptions, select: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !should_skip(e.path(), scan))
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read directory entry");
                continue;
            }
        };

        if entry.file_type().is_file() && select(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files
}

fn should_skip(path: &Path, scan: &ScanOptions) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    if name.starts_with('.') {
        tracing::debug!(path = %path.display(), reason = "hidden file/directory", "Skipping path");
        return true;
    }

    if SKIP_DIRS.contains(&name) {
        tracing::debug!(path = %path.display(), reason = "tool directory", "Skipping path");
        return true;
    }

    if scan.exclude_patterns.iter().any(|pattern| {
        glob::Pattern::new(pattern)
            .map(|p| p.matches(name))
            .unwrap_or(false)
    }) {
        tracing::debug!(path = %path.display(), reason = "matches exclude pattern", "Skipping path");
        return true;
    }

    false
}

fn is_terraform_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(TERRAFORM_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TerranotateError;
    use crate::validator::ValidationSchema;
    use std::fs;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"
global:
  required_prefixes: ["@metadata"]
"#;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("modules/vpc")).unwrap();
        fs::create_dir_all(root.join(".terraform/modules")).unwrap();
        fs::create_dir_all(root.join("vendor")).unwrap();

        fs::write(root.join("main.tf"), "# @metadata owner:a\nresource \"aws_vpc\" \"main\" {}\n").unwrap();
        fs::write(root.join("modules/vpc/vpc.tf"), "resource \"aws_subnet\" \"a\" {}\n").unwrap();
        fs::write(root.join(".terraform/modules/cached.tf"), "resource \"x\" \"y\" {}\n").unwrap();
        fs::write(root.join("vendor/lib.tf"), "resource \"x\" \"y\" {}\n").unwrap();
        fs::write(root.join("README.md"), "# docs\n").unwrap();
        dir
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_find_terraform_files_skips_tool_dirs_and_excludes() {
        let dir = tree();
        let scan = ScanOptions {
            exclude_patterns: vec!["vendor".to_string()],
            ..Default::default()
        };

        let files = find_terraform_files(dir.path(), &scan).unwrap();
        assert_eq!(names(dir.path(), &files), vec!["main.tf", "modules/vpc/vpc.tf"]);
    }

    #[test]
    fn test_find_single_file() {
        let dir = tree();
        let file = dir.path().join("main.tf");
        let files = find_terraform_files(&file, &ScanOptions::default()).unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_missing_and_empty_directories() {
        let dir = TempDir::new().unwrap();
        let scan = ScanOptions::default();

        let missing = find_terraform_files(&dir.path().join("nope"), &scan);
        assert!(matches!(missing, Err(TerranotateError::DirectoryNotFound { .. })));

        let empty = find_terraform_files(dir.path(), &scan);
        assert!(matches!(empty, Err(TerranotateError::NoTerraformFiles { .. })));
    }

    #[test]
    fn test_validate_path_skips_unparseable_files() {
        let dir = tree();
        fs::write(dir.path().join("broken.tf"), "resource \"a\" \"b\" {\n").unwrap();

        let parser = CommentParser::new(["@metadata"]);
        let validator = SchemaValidator::new(ValidationSchema::from_yaml(SCHEMA, "<inline>").unwrap());
        let scan = ScanOptions {
            exclude_patterns: vec!["vendor".to_string()],
            ..Default::default()
        };

        let batch = validate_path(dir.path(), &parser, &validator, &scan).unwrap();

        assert_eq!(batch.skipped.count(), 1);
        assert_eq!(batch.files.len(), 2);
        assert_eq!(batch.result.files.len(), 2);
        assert_eq!(batch.result.resources_checked, 2);
        assert_eq!(batch.result.errors.len(), 1);
        assert_eq!(batch.result.errors[0].resource_type, "aws_subnet");
        assert!(batch.result.errors[0]
            .file
            .as_deref()
            .is_some_and(|f| f.ends_with("modules/vpc/vpc.tf")));
    }

    #[test]
    fn test_fail_fast_stops_on_parse_error() {
        let dir = tree();
        fs::write(dir.path().join("broken.tf"), "resource \"a\" \"b\" {\n").unwrap();

        let parser = CommentParser::new(["@metadata"]);
        let scan = ScanOptions {
            continue_on_error: false,
            ..Default::default()
        };

        let result = parse_path(dir.path(), &parser, &scan);
        assert!(matches!(result, Err(TerranotateError::HclParse { .. })));
    }

    #[test]
    fn test_find_backups() {
        let dir = tree();
        fs::write(dir.path().join("main.tf.bak"), "").unwrap();

        let originals = find_backups(dir.path(), &ScanOptions::default(), ".bak").unwrap();
        assert_eq!(originals, vec![dir.path().join("main.tf")]);

        let single = find_backups(&dir.path().join("modules/vpc/vpc.tf"), &ScanOptions::default(), ".bak").unwrap();
        assert!(single.is_empty());
    }
}
