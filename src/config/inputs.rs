//! Build input descriptions: source selections, include paths,
//! preprocessor definitions, and library specifications.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::fs::{glob_files, walk_files};

/// One ordered source-file selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSet {
    /// A glob pattern relative to the working directory.
    Glob(String),
    /// A directory scanned recursively.
    Dir(PathBuf),
    /// Explicit file paths.
    Files(Vec<PathBuf>),
}

impl SourceSet {
    /// Enumerate the files this selection matches, as absolute paths.
    pub fn resolve(&self, base: &Path) -> Result<Vec<PathBuf>> {
        match self {
            SourceSet::Glob(pattern) => glob_files(base, std::slice::from_ref(pattern)),
            SourceSet::Dir(dir) => Ok(walk_files(base, std::slice::from_ref(dir))),
            SourceSet::Files(files) => Ok(files
                .iter()
                .map(|f| {
                    if f.is_absolute() {
                        f.clone()
                    } else {
                        base.join(f)
                    }
                })
                .collect()),
        }
    }
}

/// An ordered list of include directories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludePath {
    pub dirs: Vec<PathBuf>,
}

impl IncludePath {
    /// Create an include path from a list of directories.
    pub fn new(dirs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        IncludePath {
            dirs: dirs.into_iter().map(|d| d.into()).collect(),
        }
    }
}

/// A preprocessor symbol definition.
///
/// One raw definition may logically represent several: a value
/// containing commas explodes into multiple single-symbol definitions
/// before it reaches any compiler command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    raw: String,
}

impl Define {
    /// Create a definition from its raw text (`NAME` or `NAME=VALUE`,
    /// optionally comma-separated).
    pub fn new(raw: impl Into<String>) -> Self {
        Define { raw: raw.into() }
    }

    /// The raw definition text as configured.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Explode into independent single-symbol definitions.
    pub fn explode(&self) -> Vec<String> {
        self.raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Flatten a definition list into the single-symbol form handed to
/// toolchain adapters.
pub fn explode_defines(defines: &[Define]) -> Vec<String> {
    defines.iter().flat_map(|d| d.explode()).collect()
}

/// A library dependency: zero or more search paths plus zero or more
/// bare library names to link against.
///
/// A spec with names but no search paths is valid; the names are then
/// resolved only against caller-provided default paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySpec {
    pub search_dirs: Vec<PathBuf>,
    pub names: Vec<String>,
}

impl LibrarySpec {
    /// Create a library spec.
    pub fn new(
        search_dirs: impl IntoIterator<Item = impl Into<PathBuf>>,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        LibrarySpec {
            search_dirs: search_dirs.into_iter().map(|d| d.into()).collect(),
            names: names.into_iter().map(|n| n.into()).collect(),
        }
    }
}
