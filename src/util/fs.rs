//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glob::glob;
use walkdir::WalkDir;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Find files matching glob patterns relative to a base directory.
///
/// Returns absolute, sorted, deduplicated paths. Glob errors on
/// individual entries are logged and skipped.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        let full_pattern = base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in
            glob(&pattern_str).with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

/// Recursively collect all files under the given directories.
///
/// Unreadable entries are logged and skipped, never fatal.
pub fn walk_files(base: &Path, dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut results = Vec::new();

    for dir in dirs {
        let root = if dir.is_absolute() {
            dir.clone()
        } else {
            base.join(dir)
        };

        for entry in WalkDir::new(&root) {
            match entry {
                Ok(e) if e.file_type().is_file() => results.push(e.into_path()),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("skipping unreadable entry under {}: {}", root.display(), e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    results
}
