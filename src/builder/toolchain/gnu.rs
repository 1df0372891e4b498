//! Unix-family toolchain adapter (gcc, clang and friends).
//!
//! One flat command line per source file; no environment bootstrapping.
//! Windows resource scripts are special-cased through `windres`, and
//! static libraries go through the archiver instead of the link driver.

use std::path::{Path, PathBuf};

use crate::builder::errors::BuildError;
use crate::config::inputs::explode_defines;
use crate::config::{BuildConfiguration, OutputKind, TargetArch};
use crate::util::platform::HostOs;
use crate::util::process::{find_archiver, find_c_compiler, find_executable};

use super::{
    is_resource_source, CompileJob, CompilePlan, Invocation, Toolchain, ToolchainFamily,
};

/// Unix-family toolchain.
#[derive(Debug, Clone)]
pub struct GnuToolchain {
    /// Compiler driver, also used as the link driver.
    compiler: PathBuf,
    /// Archiver for static libraries.
    archiver: PathBuf,
    /// Resource compiler for `.rc` sources.
    resource_compiler: PathBuf,
    /// OS family, which decides architecture and shared-library flags.
    os: HostOs,
}

impl GnuToolchain {
    /// Create an adapter from explicit tool paths.
    pub fn new(compiler: impl Into<PathBuf>, archiver: impl Into<PathBuf>, os: HostOs) -> Self {
        GnuToolchain {
            compiler: compiler.into(),
            archiver: archiver.into(),
            resource_compiler: PathBuf::from("windres"),
            os,
        }
    }

    /// Locate the toolchain for the given compiler identifier.
    ///
    /// A configured name must resolve (as a path or on PATH). With no
    /// name, resolution falls back to the CC environment variable and
    /// then the usual compiler names.
    pub fn locate(compiler: Option<&str>, os: HostOs) -> Result<Self, BuildError> {
        let compiler = match compiler {
            Some(name) => {
                let as_path = Path::new(name);
                if as_path.is_absolute() && as_path.exists() {
                    as_path.to_path_buf()
                } else {
                    find_executable(name).ok_or_else(|| {
                        BuildError::toolchain_not_found(
                            name,
                            "check that the compiler is installed and on PATH",
                        )
                    })?
                }
            }
            None => find_c_compiler().ok_or_else(|| {
                BuildError::toolchain_not_found(
                    "cc",
                    "install gcc or clang, or point the CC environment variable at a compiler",
                )
            })?,
        };

        let archiver = find_archiver().unwrap_or_else(|| PathBuf::from("ar"));

        Ok(GnuToolchain::new(compiler, archiver, os))
    }

    /// Get the compiler path.
    pub fn compiler(&self) -> &Path {
        &self.compiler
    }

    /// Architecture-selection flags for the configured target.
    fn arch_args(&self, arch: TargetArch) -> Vec<String> {
        match self.os {
            HostOs::Macos => {
                let name = match arch {
                    TargetArch::X86 => "i386",
                    TargetArch::Amd64 => "x86_64",
                };
                vec!["-arch".to_string(), name.to_string()]
            }
            _ => {
                let flag = match arch {
                    TargetArch::X86 => "-m32",
                    TargetArch::Amd64 => "-m64",
                };
                vec![flag.to_string()]
            }
        }
    }

    /// Build the compile invocation for one source file.
    fn compile_invocation(
        &self,
        cfg: &BuildConfiguration,
        source: &Path,
        object: &Path,
    ) -> Invocation {
        if is_resource_source(source) {
            let mut inv = Invocation::new(&self.resource_compiler);
            for path in &cfg.include_paths {
                for dir in &path.dirs {
                    inv = inv.arg("--include-dir").arg(dir.display().to_string());
                }
            }
            for define in explode_defines(&cfg.defines) {
                inv = inv.arg("--define").arg(define);
            }
            inv = inv
                .arg(source.display().to_string())
                .arg("-O")
                .arg("coff")
                .arg("-o")
                .arg(object.display().to_string());
            return self.with_pre_command(cfg, inv);
        }

        let mut inv = Invocation::new(&self.compiler).arg("-c");
        inv = inv.args(self.arch_args(cfg.arch));

        for path in &cfg.include_paths {
            for dir in &path.dirs {
                inv = inv.arg(format!("-I{}", dir.display()));
            }
        }

        for define in explode_defines(&cfg.defines) {
            inv = inv.arg(format!("-D{}", define));
        }

        inv = inv.args(cfg.compiler_args.iter().cloned());

        inv = inv
            .arg(source.display().to_string())
            .arg("-o")
            .arg(object.display().to_string());

        self.with_pre_command(cfg, inv)
    }

    /// Chain the configured pre-command ahead of an invocation.
    fn with_pre_command(&self, cfg: &BuildConfiguration, inv: Invocation) -> Invocation {
        let Some(pre) = &cfg.pre_command else {
            return inv;
        };

        Invocation::new("sh")
            .arg("-c")
            .arg(format!("{} && {}", pre, shell_join(&inv)))
    }
}

/// Join an invocation into one shell command, quoting where needed.
fn shell_join(inv: &Invocation) -> String {
    let mut parts = vec![shell_quote(&inv.program.display().to_string())];
    parts.extend(inv.args.iter().map(|a| shell_quote(a)));
    parts.join(" ")
}

fn shell_quote(token: &str) -> String {
    if token.is_empty()
        || token
            .chars()
            .any(|c| c.is_whitespace() || "\"'$`\\!*?;&|<>()".contains(c))
    {
        format!("'{}'", token.replace('\'', "'\\''"))
    } else {
        token.to_string()
    }
}

impl Toolchain for GnuToolchain {
    fn family(&self) -> ToolchainFamily {
        ToolchainFamily::Gnu
    }

    fn object_extension(&self) -> &'static str {
        "o"
    }

    fn link_input_extensions(&self) -> &'static [&'static str] {
        &["o"]
    }

    fn object_path(&self, source: &Path, obj_dir: &Path) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.to_string_lossy().into_owned());
        obj_dir.join(format!("{}.{}", stem, self.object_extension()))
    }

    fn plan_compile(
        &self,
        cfg: &BuildConfiguration,
        sources: &[PathBuf],
        obj_dir: &Path,
    ) -> Result<CompilePlan, BuildError> {
        let mut plan = CompilePlan::default();

        for source in sources {
            let object = self.object_path(source, obj_dir);
            let label = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.display().to_string());

            plan.parallel.push(CompileJob {
                label,
                invocation: self.compile_invocation(cfg, source, &object),
                sources: vec![source.clone()],
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
        _obj_dir: &Path,
    ) -> Result<Invocation, BuildError> {
        if cfg.output_kind == OutputKind::StaticLibrary {
            // Replace members, create if missing, write the symbol index.
            let mut inv = Invocation::new(&self.archiver)
                .arg("rcs")
                .arg(output.display().to_string());
            inv = inv.args(objects.iter().map(|o| o.display().to_string()));
            return Ok(self.with_pre_command(cfg, inv));
        }

        let mut inv = Invocation::new(&self.compiler);
        inv = inv.args(self.arch_args(cfg.arch));

        if cfg.output_kind == OutputKind::SharedLibrary {
            match self.os {
                HostOs::Macos => {
                    let install_name = output
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| output.display().to_string());
                    inv = inv.arg("-dynamiclib").arg("-install_name").arg(install_name);
                }
                _ => {
                    inv = inv.arg("-shared");
                }
            }
        }

        inv = inv.arg("-o").arg(output.display().to_string());
        inv = inv.args(objects.iter().map(|o| o.display().to_string()));

        // No existence pre-check for this family: the linker reports
        // missing libraries itself.
        for lib in &cfg.libraries {
            for dir in &lib.search_dirs {
                inv = inv.arg(format!("-L{}", dir.display()));
            }
        }
        for dir in &cfg.default_lib_dirs {
            inv = inv.arg(format!("-L{}", dir.display()));
        }
        for lib in &cfg.libraries {
            for name in &lib.names {
                inv = inv.arg(format!("-l{}", name));
            }
        }

        inv = inv.args(cfg.linker_args.iter().cloned());

        Ok(self.with_pre_command(cfg, inv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Define, IncludePath, LibrarySpec};

    fn config(os_kind: OutputKind) -> BuildConfiguration {
        let mut cfg = BuildConfiguration::new("/work", "demo");
        cfg.output_kind = os_kind;
        cfg.arch = TargetArch::Amd64;
        cfg
    }

    fn linux_toolchain() -> GnuToolchain {
        GnuToolchain::new("gcc", "ar", HostOs::Linux)
    }

    #[test]
    fn test_compile_invocation_linux() {
        let mut cfg = config(OutputKind::Executable);
        cfg.include_paths = vec![IncludePath::new(["/usr/include", "/opt/include"])];
        cfg.defines = vec![Define::new("DEBUG"), Define::new("VERSION=1")];
        cfg.compiler_args = vec!["-Wall".to_string()];

        let tc = linux_toolchain();
        let inv = tc.compile_invocation(&cfg, Path::new("src/main.c"), Path::new("obj/main.o"));

        assert_eq!(inv.program, PathBuf::from("gcc"));
        assert!(inv.args.contains(&"-c".to_string()));
        assert!(inv.args.contains(&"-m64".to_string()));
        assert!(inv.args.contains(&"-I/usr/include".to_string()));
        assert!(inv.args.contains(&"-I/opt/include".to_string()));
        assert!(inv.args.contains(&"-DDEBUG".to_string()));
        assert!(inv.args.contains(&"-DVERSION=1".to_string()));
        assert!(inv.args.contains(&"-Wall".to_string()));
        // Source before -o object
        let src_pos = inv.args.iter().position(|a| a == "src/main.c").unwrap();
        let out_pos = inv.args.iter().position(|a| a == "-o").unwrap();
        assert!(src_pos < out_pos);
    }

    #[test]
    fn test_compile_invocation_x86_flag() {
        let mut cfg = config(OutputKind::Executable);
        cfg.arch = TargetArch::X86;

        let tc = linux_toolchain();
        let inv = tc.compile_invocation(&cfg, Path::new("a.c"), Path::new("a.o"));
        assert!(inv.args.contains(&"-m32".to_string()));
    }

    #[test]
    fn test_compile_invocation_macos_arch() {
        let cfg = config(OutputKind::Executable);
        let tc = GnuToolchain::new("clang", "ar", HostOs::Macos);
        let inv = tc.compile_invocation(&cfg, Path::new("a.c"), Path::new("a.o"));

        let pos = inv.args.iter().position(|a| a == "-arch").unwrap();
        assert_eq!(inv.args[pos + 1], "x86_64");
        assert!(!inv.args.contains(&"-m64".to_string()));
    }

    #[test]
    fn test_symbol_explosion_reaches_command_line() {
        let mut cfg = config(OutputKind::Executable);
        cfg.defines = vec![Define::new("A,B,C")];

        let tc = linux_toolchain();
        let inv = tc.compile_invocation(&cfg, Path::new("a.c"), Path::new("a.o"));
        assert!(inv.args.contains(&"-DA".to_string()));
        assert!(inv.args.contains(&"-DB".to_string()));
        assert!(inv.args.contains(&"-DC".to_string()));
    }

    #[test]
    fn test_resource_source_uses_windres() {
        let cfg = config(OutputKind::Executable);
        let tc = linux_toolchain();
        let inv = tc.compile_invocation(&cfg, Path::new("app.rc"), Path::new("obj/app.o"));

        assert_eq!(inv.program, PathBuf::from("windres"));
        assert!(inv.args.contains(&"coff".to_string()));
        assert!(!inv.args.contains(&"-c".to_string()));
    }

    #[test]
    fn test_link_executable() {
        let mut cfg = config(OutputKind::Executable);
        cfg.libraries = vec![LibrarySpec::new(["/opt/lib"], ["m", "z"])];
        cfg.linker_args = vec!["-Wl,-rpath,/opt/lib".to_string()];

        let tc = linux_toolchain();
        let inv = tc
            .link_invocation(
                &cfg,
                &[PathBuf::from("obj/a.o"), PathBuf::from("obj/b.o")],
                Path::new("complete/demo"),
                Path::new("obj"),
            )
            .unwrap();

        assert_eq!(inv.program, PathBuf::from("gcc"));
        assert!(!inv.args.contains(&"-shared".to_string()));
        assert!(inv.args.contains(&"-L/opt/lib".to_string()));
        assert!(inv.args.contains(&"-lm".to_string()));
        assert!(inv.args.contains(&"-lz".to_string()));
        assert!(inv.args.contains(&"-Wl,-rpath,/opt/lib".to_string()));
    }

    #[test]
    fn test_link_shared_linux() {
        let cfg = config(OutputKind::SharedLibrary);
        let tc = linux_toolchain();
        let inv = tc
            .link_invocation(
                &cfg,
                &[PathBuf::from("obj/a.o")],
                Path::new("complete/libdemo.so"),
                Path::new("obj"),
            )
            .unwrap();
        assert!(inv.args.contains(&"-shared".to_string()));
        assert!(!inv.args.contains(&"-dynamiclib".to_string()));
    }

    #[test]
    fn test_link_shared_macos() {
        let cfg = config(OutputKind::SharedLibrary);
        let tc = GnuToolchain::new("clang", "ar", HostOs::Macos);
        let inv = tc
            .link_invocation(
                &cfg,
                &[PathBuf::from("obj/a.o")],
                Path::new("complete/libdemo.dylib"),
                Path::new("obj"),
            )
            .unwrap();
        assert!(inv.args.contains(&"-dynamiclib".to_string()));
        let pos = inv.args.iter().position(|a| a == "-install_name").unwrap();
        assert_eq!(inv.args[pos + 1], "libdemo.dylib");
    }

    #[test]
    fn test_static_output_uses_archiver() {
        let mut cfg = config(OutputKind::StaticLibrary);
        // Libraries declared, but archiving must ignore them entirely
        cfg.libraries = vec![LibrarySpec::new(["/opt/lib"], ["m"])];

        let tc = linux_toolchain();
        let inv = tc
            .link_invocation(
                &cfg,
                &[PathBuf::from("obj/a.o")],
                Path::new("complete/libdemo.a"),
                Path::new("obj"),
            )
            .unwrap();

        assert_eq!(inv.program, PathBuf::from("ar"));
        assert_eq!(inv.args[0], "rcs");
        assert!(!inv.args.iter().any(|a| a.starts_with("-l")));
        assert!(!inv.args.iter().any(|a| a.starts_with("-L")));
        assert!(!inv.args.contains(&"-shared".to_string()));
    }

    #[test]
    fn test_pre_command_chains_through_shell() {
        let mut cfg = config(OutputKind::Executable);
        cfg.pre_command = Some("source env.sh".to_string());

        let tc = linux_toolchain();
        let inv = tc.compile_invocation(&cfg, Path::new("a.c"), Path::new("a.o"));

        assert_eq!(inv.program, PathBuf::from("sh"));
        assert_eq!(inv.args[0], "-c");
        assert!(inv.args[1].starts_with("source env.sh && "));
        assert!(inv.args[1].contains("gcc"));
    }

    #[test]
    fn test_object_path() {
        let tc = linux_toolchain();
        assert_eq!(
            tc.object_path(Path::new("src/main.c"), Path::new("/work/obj/amd64")),
            PathBuf::from("/work/obj/amd64/main.o")
        );
        // No extension: still mapped without panicking
        assert_eq!(
            tc.object_path(Path::new("src/weird"), Path::new("/o")),
            PathBuf::from("/o/weird.o")
        );
    }

    #[test]
    fn test_plan_is_one_job_per_source() {
        let cfg = config(OutputKind::Executable);
        let tc = linux_toolchain();
        let sources = vec![PathBuf::from("a.c"), PathBuf::from("b.c")];
        let plan = tc
            .plan_compile(&cfg, &sources, Path::new("/work/obj/amd64"))
            .unwrap();
        assert_eq!(plan.parallel.len(), 2);
        assert!(plan.sequential.is_empty());
        assert_eq!(plan.parallel[0].objects.len(), 1);
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain"), "plain");
        assert_eq!(shell_quote("has space"), "'has space'");
        assert_eq!(shell_quote("a'b"), "'a'\\''b'");
    }
}
