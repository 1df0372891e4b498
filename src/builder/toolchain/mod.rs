//! Toolchain abstraction for native compilers.
//!
//! Two structurally different invocation models hide behind one trait:
//! the Unix family issues one flat command line per source file, while
//! the Windows family bootstraps a vendor environment and passes its
//! arguments through response files. The scheduler and the link
//! orchestrator depend only on the [`Toolchain`] contract and never
//! branch on the family.

use std::path::{Path, PathBuf};

use crate::builder::errors::BuildError;
use crate::config::{BuildConfiguration, ToolchainSpec};
use crate::util::platform;

mod gnu;
mod msvc;
mod registry;

pub use gnu::GnuToolchain;
pub use msvc::MsvcToolchain;
pub use registry::locate_environment_script;

/// The family of a toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainFamily {
    /// Unix-style single-invocation compilers (gcc, clang, ...).
    Gnu,
    /// Windows-style environment-bootstrapped compilers (cl.exe).
    Msvc,
}

impl ToolchainFamily {
    /// Get the family name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainFamily::Gnu => "gnu",
            ToolchainFamily::Msvc => "msvc",
        }
    }
}

/// One external command to execute: program plus arguments.
///
/// Environment bootstrapping and pre-commands are already folded in by
/// the adapter that built the invocation; running it is always a single
/// process launch.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// The program to run (e.g. "gcc", "cmd.exe").
    pub program: PathBuf,
    /// Command arguments.
    pub args: Vec<String>,
}

impl Invocation {
    /// Create a new invocation.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// The literal command line, for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// One schedulable unit of compilation work.
#[derive(Debug, Clone)]
pub struct CompileJob {
    /// Human-readable description for progress and error reporting.
    pub label: String,
    /// The command to run.
    pub invocation: Invocation,
    /// Source files this job consumes.
    pub sources: Vec<PathBuf>,
    /// Object files this job produces.
    pub objects: Vec<PathBuf>,
}

/// The compile phase as planned by a toolchain adapter.
#[derive(Debug, Clone, Default)]
pub struct CompilePlan {
    /// Jobs safe to run concurrently.
    pub parallel: Vec<CompileJob>,
    /// Jobs run one at a time after the parallel batch drains
    /// (the Windows resource pass).
    pub sequential: Vec<CompileJob>,
}

impl CompilePlan {
    /// Total number of jobs in the plan.
    pub fn job_count(&self) -> usize {
        self.parallel.len() + self.sequential.len()
    }

    /// Whether the plan contains no work at all.
    pub fn is_empty(&self) -> bool {
        self.parallel.is_empty() && self.sequential.is_empty()
    }

    /// All object files the plan will produce.
    pub fn objects(&self) -> Vec<PathBuf> {
        self.parallel
            .iter()
            .chain(self.sequential.iter())
            .flat_map(|j| j.objects.iter().cloned())
            .collect()
    }
}

/// Trait for toolchain adapters.
///
/// Each adapter fully encapsulates its own command construction,
/// environment bootstrapping, and file-naming quirks.
pub trait Toolchain: Send + Sync {
    /// Get the toolchain family.
    fn family(&self) -> ToolchainFamily;

    /// Object-file extension this adapter produces.
    ///
    /// Held on the adapter instance: two builds with different
    /// toolchains in one process must not see each other's value.
    fn object_extension(&self) -> &'static str;

    /// Extensions of files in the object directory that feed the link
    /// step (objects plus compiled resources).
    fn link_input_extensions(&self) -> &'static [&'static str];

    /// Object path a given source compiles to.
    fn object_path(&self, source: &Path, obj_dir: &Path) -> PathBuf;

    /// Plan the compile phase for the given stale sources.
    ///
    /// Any response files the plan needs are fully written before this
    /// returns, so every invocation in the plan is ready to execute.
    fn plan_compile(
        &self,
        cfg: &BuildConfiguration,
        sources: &[PathBuf],
        obj_dir: &Path,
    ) -> Result<CompilePlan, BuildError>;

    /// Build the single link or archive invocation.
    ///
    /// Library names that require pre-resolution (Windows family) are
    /// resolved here; an unresolvable name is a hard error and no
    /// invocation is produced.
    fn link_invocation(
        &self,
        cfg: &BuildConfiguration,
        objects: &[PathBuf],
        output: &Path,
        obj_dir: &Path,
    ) -> Result<Invocation, BuildError>;
}

/// Select and locate the toolchain for a configuration.
pub fn select_toolchain(cfg: &BuildConfiguration) -> Result<Box<dyn Toolchain>, BuildError> {
    match &cfg.toolchain {
        ToolchainSpec::Gnu { compiler } => {
            let toolchain = GnuToolchain::locate(compiler.as_deref(), platform::host_os())?;
            tracing::debug!(
                "using {} toolchain: {}",
                toolchain.family().as_str(),
                toolchain.compiler().display()
            );
            Ok(Box::new(toolchain))
        }
        ToolchainSpec::Msvc { version } => {
            let toolchain = MsvcToolchain::locate(*version, platform::host_arch())?;
            tracing::debug!(
                "using msvc toolchain: {}",
                toolchain.environment_script().display()
            );
            Ok(Box::new(toolchain))
        }
    }
}

/// Check whether a path names a Windows resource script.
pub(crate) fn is_resource_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("rc"))
}
