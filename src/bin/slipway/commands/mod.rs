//! Command implementations.

pub mod build;
pub mod clean;
pub mod completions;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use slipway::config::manifest::MANIFEST_FILENAME;
use slipway::config::{BuildConfiguration, Manifest};

/// Resolve the manifest path and load it into a configuration.
///
/// The working directory of the build is the manifest's directory.
pub fn load_configuration(manifest_path: Option<&Path>) -> Result<BuildConfiguration> {
    let manifest_path = match manifest_path {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(MANIFEST_FILENAME),
    };

    if !manifest_path.exists() {
        bail!(
            "manifest not found: {}\n\
             help: create a {} describing the build, or pass --manifest-path",
            manifest_path.display(),
            MANIFEST_FILENAME
        );
    }

    let working_dir = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let working_dir = working_dir.canonicalize().unwrap_or(working_dir);

    let manifest = Manifest::load(&manifest_path)?;
    let cfg = manifest.into_configuration(&working_dir)?;
    Ok(cfg)
}
