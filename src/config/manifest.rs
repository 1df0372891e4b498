//! `Slipway.toml` manifest loading.
//!
//! The manifest is the thin declarative layer that populates a
//! [`BuildConfiguration`]; everything past deserialization and
//! defaulting lives on the configuration itself.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{
    BuildConfiguration, Define, IncludePath, Jobs, LibrarySpec, MsvcVersion, OutputKind,
    SourceSet, TargetArch, ToolchainSpec,
};
use crate::builder::errors::BuildError;

/// Manifest file name looked up in the working directory.
pub const MANIFEST_FILENAME: &str = "Slipway.toml";

/// Deserialized `Slipway.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Manifest {
    pub build: BuildSection,
    #[serde(default)]
    pub toolchain: ToolchainSection,
    #[serde(default)]
    pub inputs: InputsSection,
    #[serde(default)]
    pub libraries: Vec<LibrarySection>,
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildSection {
    pub name: String,
    #[serde(default)]
    pub kind: OutputKind,
    pub arch: Option<TargetArch>,
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub incremental: bool,
    #[serde(default = "default_true")]
    pub fail_on_error: bool,
    pub jobs: Option<JobsField>,
}

/// `[toolchain]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ToolchainSection {
    #[serde(default)]
    pub family: FamilyField,
    pub compiler: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub compiler_args: Vec<String>,
    #[serde(default)]
    pub linker_args: Vec<String>,
    pub pre_command: Option<String>,
}

/// `[inputs]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct InputsSection {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub source_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub include_paths: Vec<Vec<PathBuf>>,
    #[serde(default)]
    pub defines: Vec<String>,
    #[serde(default)]
    pub default_lib_dirs: Vec<PathBuf>,
}

/// One `[[libraries]]` entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LibrarySection {
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
    #[serde(default)]
    pub names: Vec<String>,
}

/// Toolchain family tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyField {
    Gnu,
    Msvc,
}

impl Default for FamilyField {
    fn default() -> Self {
        FamilyField::Gnu
    }
}

/// `jobs` accepts either a number or the string `"auto"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JobsField {
    Count(usize),
    Name(String),
}

fn default_true() -> bool {
    true
}

impl Manifest {
    /// Load and parse a manifest file.
    pub fn load(path: &Path) -> Result<Manifest> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        let manifest: Manifest = toml::from_str(&content)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))?;
        Ok(manifest)
    }

    /// Convert into a validated build configuration rooted at
    /// `working_dir`.
    pub fn into_configuration(self, working_dir: &Path) -> Result<BuildConfiguration, BuildError> {
        let mut cfg = BuildConfiguration::new(working_dir, self.build.name);

        cfg.output_kind = self.build.kind;
        if let Some(arch) = self.build.arch {
            cfg.arch = arch;
        }
        cfg.output_dir = self.build.output_dir;
        cfg.incremental = self.build.incremental;
        cfg.fail_on_error = self.build.fail_on_error;
        cfg.jobs = match self.build.jobs {
            None => Jobs::default(),
            Some(JobsField::Count(n)) => Jobs::Count(n),
            Some(JobsField::Name(s)) => s.parse()?,
        };

        cfg.toolchain = match self.toolchain.family {
            FamilyField::Gnu => ToolchainSpec::Gnu {
                compiler: self.toolchain.compiler,
            },
            FamilyField::Msvc => {
                let version = self
                    .toolchain
                    .version
                    .as_deref()
                    .ok_or_else(|| {
                        BuildError::config("toolchain family `msvc` requires a `version`")
                    })?
                    .parse::<MsvcVersion>()?;
                ToolchainSpec::Msvc { version }
            }
        };
        cfg.compiler_args = self.toolchain.compiler_args;
        cfg.linker_args = self.toolchain.linker_args;
        cfg.pre_command = self.toolchain.pre_command;

        cfg.sources = self
            .inputs
            .sources
            .into_iter()
            .map(SourceSet::Glob)
            .chain(self.inputs.source_dirs.into_iter().map(SourceSet::Dir))
            .collect();
        cfg.include_paths = self
            .inputs
            .include_paths
            .into_iter()
            .map(|dirs| IncludePath { dirs })
            .collect();
        cfg.defines = self.inputs.defines.into_iter().map(Define::new).collect();
        cfg.default_lib_dirs = self.inputs.default_lib_dirs;
        cfg.libraries = self
            .libraries
            .into_iter()
            .map(|l| LibrarySpec {
                search_dirs: l.dirs,
                names: l.names,
            })
            .collect();

        cfg.validate()?;
        Ok(cfg)
    }
}
