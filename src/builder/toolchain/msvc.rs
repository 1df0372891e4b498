//! Windows-family toolchain adapter (cl.exe, link.exe, lib.exe, rc.exe).
//!
//! Every invocation first sources the vendor environment-setup script
//! for the selected compiler release and resolved architecture, then
//! runs the real tool, all chained into one `cmd.exe /C` process.
//! Because the Windows command line is length-limited, file lists and
//! derived arguments always travel through a response file; the tool
//! itself is invoked with nothing but `@<responsefile>`.

use std::path::{Path, PathBuf};

use crate::builder::errors::BuildError;
use crate::config::inputs::explode_defines;
use crate::config::{BuildConfiguration, MsvcVersion, OutputKind, TargetArch};

use super::registry::locate_environment_script;
use super::{
    is_resource_source, CompileJob, CompilePlan, Invocation, Toolchain, ToolchainFamily,
};

/// Response file for the batched compile pass.
pub const COMPILE_RESPONSE_FILE: &str = "compile-files.rsp";
/// Response file for the link/archive pass.
pub const LINK_RESPONSE_FILE: &str = "linker-files.rsp";

/// Windows-family toolchain.
#[derive(Debug, Clone)]
pub struct MsvcToolchain {
    /// The environment-bootstrap script (vcvarsall.bat).
    env_script: PathBuf,
    /// Architecture of the machine running the build, which decides
    /// whether a cross-compiler string is needed.
    host_arch: TargetArch,
}

impl MsvcToolchain {
    /// Create an adapter for a known bootstrap script.
    pub fn new(env_script: impl Into<PathBuf>, host_arch: TargetArch) -> Self {
        MsvcToolchain {
            env_script: env_script.into(),
            host_arch,
        }
    }

    /// Locate the adapter for a compiler release via the install
    /// registry.
    pub fn locate(version: MsvcVersion, host_arch: TargetArch) -> Result<Self, BuildError> {
        let env_script = locate_environment_script(version)?;
        Ok(MsvcToolchain::new(env_script, host_arch))
    }

    /// Get the bootstrap script path.
    pub fn environment_script(&self) -> &Path {
        &self.env_script
    }

    /// The architecture argument handed to the bootstrap script:
    /// native when host and target match, a cross string otherwise.
    pub fn compiler_arch_string(&self, target: TargetArch) -> &'static str {
        match (self.host_arch, target) {
            (TargetArch::X86, TargetArch::X86) => "x86",
            (TargetArch::Amd64, TargetArch::Amd64) => "amd64",
            (TargetArch::X86, TargetArch::Amd64) => "x86_amd64",
            (TargetArch::Amd64, TargetArch::X86) => "amd64_x86",
        }
    }

    /// Chain environment bootstrap, optional pre-command, and the real
    /// tool into a single `cmd.exe` invocation.
    fn chained(&self, cfg: &BuildConfiguration, tool: &str, tool_args: &[String]) -> Invocation {
        let mut segments = vec![format!(
            "call \"{}\" {}",
            self.env_script.display(),
            self.compiler_arch_string(cfg.arch)
        )];

        if let Some(pre) = &cfg.pre_command {
            segments.push(pre.clone());
        }

        let mut command = vec![tool.to_string()];
        for arg in tool_args {
            if arg.contains(char::is_whitespace) && !arg.contains('"') {
                command.push(format!("\"{}\"", arg));
            } else {
                command.push(arg.clone());
            }
        }
        segments.push(command.join(" "));

        Invocation::new("cmd.exe")
            .arg("/C")
            .arg(segments.join(" && "))
    }

    /// `/MACHINE:` argument for the target architecture.
    fn machine_flag(target: TargetArch) -> &'static str {
        match target {
            TargetArch::X86 => "/MACHINE:X86",
            TargetArch::Amd64 => "/MACHINE:X64",
        }
    }

    /// Resolve one library name against the declared search paths.
    ///
    /// Paths are probed in declaration order, caller-provided default
    /// paths last; in each directory `<name>.lib` is preferred over
    /// `lib<name>.lib`. An unresolvable name is a hard error: the link
    /// is never attempted with a partially-specified library set.
    fn resolve_library(
        name: &str,
        search_dirs: &[PathBuf],
        default_dirs: &[PathBuf],
    ) -> Result<PathBuf, BuildError> {
        let mut searched = Vec::new();

        for dir in search_dirs.iter().chain(default_dirs.iter()) {
            for filename in [format!("{}.lib", name), format!("lib{}.lib", name)] {
                let candidate = dir.join(filename);
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
            searched.push(dir.clone());
        }

        Err(BuildError::LibraryNotFound {
            name: name.to_string(),
            searched,
        })
    }
}

/// Write a response file: one double-quoted token per line.
fn write_response_file(path: &Path, tokens: &[String]) -> Result<(), BuildError> {
    let mut content = String::new();
    for token in tokens {
        content.push('"');
        content.push_str(&token.replace('"', "\\\""));
        content.push('"');
        content.push('\n');
    }
    std::fs::write(path, content).map_err(|source| BuildError::Io {
        context: format!("failed to write response file {}", path.display()),
        source,
    })
}

impl Toolchain for MsvcToolchain {
    fn family(&self) -> ToolchainFamily {
        ToolchainFamily::Msvc
    }

    fn object_extension(&self) -> &'static str {
        "obj"
    }

    fn link_input_extensions(&self) -> &'static [&'static str] {
        &["obj", "res"]
    }

    fn object_path(&self, source: &Path, obj_dir: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.to_string_lossy().into_owned());
        let ext = if is_resource_source(source) {
            "res"
        } else {
            self.object_extension()
        };
        obj_dir.join(format!("{}.{}", stem, ext))
    }

    fn plan_compile(
        &self,
        cfg: &BuildConfiguration,
        sources: &[PathBuf],
        obj_dir: &Path,
    ) -> Result<CompilePlan, BuildError> {
        let mut plan = CompilePlan::default();

        let (resources, c_sources): (Vec<PathBuf>, Vec<PathBuf>) =
            sources.iter().cloned().partition(|s| is_resource_source(s));

        let defines = explode_defines(&cfg.defines);

        // Main compile pass: all non-resource sources batched into one
        // cl invocation through the response file. The file is fully
        // written here, before the invocation can start.
        if !c_sources.is_empty() {
            let mut tokens = vec!["/nologo".to_string(), "/c".to_string()];

            for path in &cfg.include_paths {
                for dir in &path.dirs {
                    tokens.push(format!("/I{}", dir.display()));
                }
            }
            for define in &defines {
                tokens.push(format!("/D{}", define));
            }
            tokens.extend(cfg.compiler_args.iter().cloned());
            tokens.push(format!(r"/Fo{}\", obj_dir.display()));
            for source in &c_sources {
                tokens.push(source.display().to_string());
            }

            let rsp = obj_dir.join(COMPILE_RESPONSE_FILE);
            write_response_file(&rsp, &tokens)?;

            let objects = c_sources
                .iter()
                .map(|s| self.object_path(s, obj_dir))
                .collect();

            plan.parallel.push(CompileJob {
                label: format!("{} source file(s) via {}", c_sources.len(), COMPILE_RESPONSE_FILE),
                invocation: self.chained(cfg, "cl", &[format!("@{}", rsp.display())]),
                sources: c_sources,
                objects,
            });
        }

        // Resource pass: rc takes one file at a time with its own flag
        // set, sequenced after the main batch.
        for source in resources {
            let object = self.object_path(&source, obj_dir);
            let mut args = vec!["/fo".to_string(), object.display().to_string()];
            for path in &cfg.include_paths {
                for dir in &path.dirs {
                    args.push(format!("/i{}", dir.display()));
                }
            }
            for define in &defines {
                args.push(format!("/d{}", define));
            }
            args.push(source.display().to_string());

            let label = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.display().to_string());

            plan.sequential.push(CompileJob {
                label,
                invocation: self.chained(cfg, "rc", &args),
                sources: vec![source],
                objects: vec![object],
            });
        }

        Ok(plan)
    }

    fn link_invocation(
        &self,
        cfg: &BuildConfiguration,
        objects: &[PathBuf],
        output: &Path,
        obj_dir: &Path,
    ) -> Result<Invocation, BuildError> {
        let mut tokens = vec![
            "/NOLOGO".to_string(),
            format!("/OUT:{}", output.display()),
        ];

        let tool = if cfg.output_kind == OutputKind::StaticLibrary {
            // Archiving: the object list is the whole input, no library
            // resolution.
            for object in objects {
                tokens.push(object.display().to_string());
            }
            "lib"
        } else {
            tokens.push(Self::machine_flag(cfg.arch).to_string());
            if cfg.output_kind == OutputKind::SharedLibrary {
                tokens.push("/DLL".to_string());
            }
            for object in objects {
                tokens.push(object.display().to_string());
            }
            // Resolve every declared library before the invocation is
            // built; a missing one aborts here.
            for lib in &cfg.libraries {
                for name in &lib.names {
                    let resolved =
                        Self::resolve_library(name, &lib.search_dirs, &cfg.default_lib_dirs)?;
                    tokens.push(resolved.display().to_string());
                }
            }
            tokens.extend(cfg.linker_args.iter().cloned());
            "link"
        };

        let rsp = obj_dir.join(LINK_RESPONSE_FILE);
        write_response_file(&rsp, &tokens)?;

        Ok(self.chained(cfg, tool, &[format!("@{}", rsp.display())]))
    }
}
