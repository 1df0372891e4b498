//! Build configuration model.
//!
//! A [`BuildConfiguration`] is the single source of truth for one build
//! invocation: what to compile, with which toolchain, into which kind of
//! artifact. It is constructed once (by the manifest layer or
//! programmatically), validated before any toolchain runs, and read-only
//! for the rest of the build. The only derived state is the output
//! artifact path, computed once and memoized.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::builder::errors::BuildError;
use crate::util::platform::{self, HostOs};

pub mod inputs;
pub mod manifest;

pub use inputs::{Define, IncludePath, LibrarySpec, SourceSet};
pub use manifest::Manifest;

/// What kind of artifact the build produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    #[serde(rename = "exe")]
    Executable,
    #[serde(rename = "sharedlib")]
    SharedLibrary,
    #[serde(rename = "staticlib")]
    StaticLibrary,
}

impl Default for OutputKind {
    fn default() -> Self {
        OutputKind::Executable
    }
}

impl OutputKind {
    /// Get the artifact file extension for this kind on the given OS.
    pub fn extension(&self, os: HostOs) -> &'static str {
        match self {
            OutputKind::Executable => {
                if os == HostOs::Windows {
                    "exe"
                } else {
                    ""
                }
            }
            OutputKind::StaticLibrary => {
                if os == HostOs::Windows {
                    "lib"
                } else {
                    "a"
                }
            }
            OutputKind::SharedLibrary => match os {
                HostOs::Windows => "dll",
                HostOs::Macos => "dylib",
                HostOs::Linux => "so",
            },
        }
    }

    /// Get the artifact file prefix for this kind on the given OS.
    pub fn prefix(&self, os: HostOs) -> &'static str {
        match self {
            OutputKind::Executable => "",
            OutputKind::StaticLibrary | OutputKind::SharedLibrary => {
                if os == HostOs::Windows {
                    ""
                } else {
                    "lib"
                }
            }
        }
    }

    /// Resolve the platform-correct artifact file name for a base name.
    ///
    /// A base name that already carries the platform prefix is not
    /// prefixed a second time.
    pub fn artifact_filename(&self, name: &str, os: HostOs) -> String {
        let prefix = self.prefix(os);
        let ext = self.extension(os);

        let prefixed = if !prefix.is_empty() && name.starts_with(prefix) {
            name.to_string()
        } else {
            format!("{}{}", prefix, name)
        };

        if ext.is_empty() {
            prefixed
        } else {
            format!("{}.{}", prefixed, ext)
        }
    }
}

/// Target CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetArch {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "amd64")]
    Amd64,
}

impl TargetArch {
    /// Get the architecture name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetArch::X86 => "x86",
            TargetArch::Amd64 => "amd64",
        }
    }
}

impl Default for TargetArch {
    fn default() -> Self {
        platform::host_arch()
    }
}

/// A Visual Studio release tag, used to locate the matching
/// environment-bootstrap script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsvcVersion {
    #[serde(rename = "vs2015")]
    Vs2015,
    #[serde(rename = "vs2017")]
    Vs2017,
    #[serde(rename = "vs2019")]
    Vs2019,
    #[serde(rename = "vs2022")]
    Vs2022,
}

impl MsvcVersion {
    /// Get the version tag as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            MsvcVersion::Vs2015 => "vs2015",
            MsvcVersion::Vs2017 => "vs2017",
            MsvcVersion::Vs2019 => "vs2019",
            MsvcVersion::Vs2022 => "vs2022",
        }
    }
}

impl FromStr for MsvcVersion {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vs2015" => Ok(MsvcVersion::Vs2015),
            "vs2017" => Ok(MsvcVersion::Vs2017),
            "vs2019" => Ok(MsvcVersion::Vs2019),
            "vs2022" => Ok(MsvcVersion::Vs2022),
            other => Err(BuildError::config(format!(
                "unknown toolchain version `{}` (expected one of: vs2015, vs2017, vs2019, vs2022)",
                other
            ))),
        }
    }
}

/// Which toolchain family drives the build, and how to find it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolchainSpec {
    /// Unix-style compiler driver (gcc, g++, clang, ...).
    ///
    /// When no compiler name is given, resolution falls back to the CC
    /// environment variable and then the usual names on PATH.
    Gnu { compiler: Option<String> },
    /// Windows-style compiler requiring environment bootstrapping.
    Msvc { version: MsvcVersion },
}

impl Default for ToolchainSpec {
    fn default() -> Self {
        ToolchainSpec::Gnu { compiler: None }
    }
}

/// Worker count for the compile phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jobs {
    /// Fixed count, clamped to the host CPU count at resolution time.
    Count(usize),
    /// Resolve to the host CPU count.
    Auto,
}

impl Default for Jobs {
    fn default() -> Self {
        Jobs::Count(1)
    }
}

impl Jobs {
    /// Resolve to a concrete worker count for a host with `host_cpus` CPUs.
    pub fn resolve(&self, host_cpus: usize) -> usize {
        let host_cpus = host_cpus.max(1);
        match self {
            Jobs::Auto => host_cpus,
            Jobs::Count(n) => (*n).clamp(1, host_cpus),
        }
    }
}

impl FromStr for Jobs {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Jobs::Auto);
        }
        s.parse::<usize>()
            .map(Jobs::Count)
            .map_err(|_| BuildError::config(format!("invalid job count `{}` (expected a number or \"auto\")", s)))
    }
}

/// The complete description of one build invocation.
#[derive(Debug, Clone, Default)]
pub struct BuildConfiguration {
    /// Project working directory; all relative inputs resolve against it.
    pub working_dir: PathBuf,
    /// Output directory; defaults to `<working_dir>/complete`.
    pub output_dir: Option<PathBuf>,
    /// Base name of the output artifact, without prefix or extension.
    pub output_name: String,
    /// Artifact kind.
    pub output_kind: OutputKind,
    /// Target architecture.
    pub arch: TargetArch,
    /// Toolchain family and identity.
    pub toolchain: ToolchainSpec,
    /// Extra arguments appended to every compile invocation.
    pub compiler_args: Vec<String>,
    /// Extra arguments appended to the link invocation.
    pub linker_args: Vec<String>,
    /// Command prepended to every toolchain invocation.
    pub pre_command: Option<String>,
    /// Ordered source-file selections.
    pub sources: Vec<SourceSet>,
    /// Include-path entries.
    pub include_paths: Vec<IncludePath>,
    /// Preprocessor symbol definitions.
    pub defines: Vec<Define>,
    /// Library specifications.
    pub libraries: Vec<LibrarySpec>,
    /// Default library search paths, probed after each spec's own paths.
    pub default_lib_dirs: Vec<PathBuf>,
    /// Recompile only stale sources when true.
    pub incremental: bool,
    /// Abort the build on toolchain failures when true.
    pub fail_on_error: bool,
    /// Compile-phase worker count.
    pub jobs: Jobs,

    artifact_path: OnceLock<PathBuf>,
}

impl BuildConfiguration {
    /// Create a configuration with the mandatory fields and defaults
    /// everywhere else.
    pub fn new(working_dir: impl Into<PathBuf>, output_name: impl Into<String>) -> Self {
        BuildConfiguration {
            working_dir: working_dir.into(),
            output_name: output_name.into(),
            incremental: true,
            fail_on_error: true,
            ..Default::default()
        }
    }

    /// Check the configuration invariants.
    ///
    /// Mandatory-field absence is a configuration error, detected here
    /// before any toolchain invocation.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.output_name.trim().is_empty() {
            return Err(BuildError::config("output name is required"));
        }
        if self.working_dir.as_os_str().is_empty() {
            return Err(BuildError::config("working directory is required"));
        }
        Ok(())
    }

    /// Directory the final artifact lands in.
    pub fn output_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => self.working_dir.join(dir),
            None => self.working_dir.join("complete"),
        }
    }

    /// Directory object files land in: `<working>/obj/<arch>`.
    pub fn object_dir(&self) -> PathBuf {
        self.working_dir.join("obj").join(self.arch.as_str())
    }

    /// Resolve the final artifact path for the given OS.
    ///
    /// Computed on first use and memoized; the configuration is
    /// immutable for the rest of the build, so the cached value never
    /// goes stale.
    pub fn artifact_path(&self, os: HostOs) -> &Path {
        self.artifact_path.get_or_init(|| {
            self.output_dir()
                .join(self.output_kind.artifact_filename(&self.output_name, os))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_filename_table() {
        let kind = OutputKind::Executable;
        assert_eq!(kind.artifact_filename("foo", HostOs::Windows), "foo.exe");
        assert_eq!(kind.artifact_filename("foo", HostOs::Macos), "foo");
        assert_eq!(kind.artifact_filename("foo", HostOs::Linux), "foo");

        let kind = OutputKind::SharedLibrary;
        assert_eq!(kind.artifact_filename("foo", HostOs::Windows), "foo.dll");
        assert_eq!(kind.artifact_filename("foo", HostOs::Macos), "libfoo.dylib");
        assert_eq!(kind.artifact_filename("foo", HostOs::Linux), "libfoo.so");

        let kind = OutputKind::StaticLibrary;
        assert_eq!(kind.artifact_filename("foo", HostOs::Windows), "foo.lib");
        assert_eq!(kind.artifact_filename("foo", HostOs::Macos), "libfoo.a");
        assert_eq!(kind.artifact_filename("foo", HostOs::Linux), "libfoo.a");
    }

    #[test]
    fn test_artifact_filename_no_double_prefix() {
        let kind = OutputKind::SharedLibrary;
        assert_eq!(kind.artifact_filename("libfoo", HostOs::Linux), "libfoo.so");
        assert_eq!(kind.artifact_filename("libfoo", HostOs::Macos), "libfoo.dylib");
        // Windows has no prefix, so "lib" stays part of the name
        assert_eq!(kind.artifact_filename("libfoo", HostOs::Windows), "libfoo.dll");
    }

    #[test]
    fn test_validate_requires_output_name() {
        let cfg = BuildConfiguration::new("/tmp/project", "");
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, BuildError::Config { .. }));
    }

    #[test]
    fn test_validate_requires_working_dir() {
        let cfg = BuildConfiguration::new("", "myapp");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_ok() {
        let cfg = BuildConfiguration::new("/tmp/project", "myapp");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_output_dir_default() {
        let cfg = BuildConfiguration::new("/work", "app");
        assert_eq!(cfg.output_dir(), PathBuf::from("/work/complete"));
    }

    #[test]
    fn test_output_dir_relative_override() {
        let mut cfg = BuildConfiguration::new("/work", "app");
        cfg.output_dir = Some(PathBuf::from("dist"));
        assert_eq!(cfg.output_dir(), PathBuf::from("/work/dist"));
    }

    #[test]
    fn test_object_dir_includes_arch() {
        let mut cfg = BuildConfiguration::new("/work", "app");
        cfg.arch = TargetArch::X86;
        assert_eq!(cfg.object_dir(), PathBuf::from("/work/obj/x86"));
        cfg.arch = TargetArch::Amd64;
        assert_eq!(cfg.object_dir(), PathBuf::from("/work/obj/amd64"));
    }

    #[test]
    fn test_artifact_path_memoized() {
        let cfg = BuildConfiguration::new("/work", "app");
        let first = cfg.artifact_path(HostOs::Linux).to_path_buf();
        // A second call returns the same memoized value
        assert_eq!(cfg.artifact_path(HostOs::Linux), first.as_path());
        assert_eq!(first, PathBuf::from("/work/complete/app"));
    }

    #[test]
    fn test_jobs_resolution() {
        assert_eq!(Jobs::Auto.resolve(8), 8);
        assert_eq!(Jobs::Count(4).resolve(8), 4);
        // Clamped to host CPU count
        assert_eq!(Jobs::Count(64).resolve(8), 8);
        // Never zero
        assert_eq!(Jobs::Count(0).resolve(8), 1);
    }

    #[test]
    fn test_jobs_parse() {
        assert_eq!("auto".parse::<Jobs>().unwrap(), Jobs::Auto);
        assert_eq!("6".parse::<Jobs>().unwrap(), Jobs::Count(6));
        assert!("six".parse::<Jobs>().is_err());
    }

    #[test]
    fn test_msvc_version_parse() {
        assert_eq!("vs2022".parse::<MsvcVersion>().unwrap(), MsvcVersion::Vs2022);
        assert!("vs2013".parse::<MsvcVersion>().is_err());
    }
}
