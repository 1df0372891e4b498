//! Link and archive orchestration.
//!
//! Runs strictly after the compile phase has fully succeeded. Gathers
//! the link unit (freshly compiled objects plus any object files the
//! caller dropped into the object directory without a corresponding
//! source), resolves the platform-correct artifact path, and drives the
//! single link or archive invocation.

use std::path::{Path, PathBuf};

use crate::builder::errors::BuildError;
use crate::builder::execute_invocation;
use crate::builder::toolchain::Toolchain;
use crate::config::BuildConfiguration;
use crate::util::platform;

/// The complete input of one link or archive invocation.
#[derive(Debug, Clone)]
pub struct LinkUnit {
    /// Object files, in deterministic (sorted) order.
    pub objects: Vec<PathBuf>,
}

/// Collect the objects feeding the link step.
///
/// Everything in the object directory with a link-input extension
/// participates, which is how caller-supplied objects without a source
/// ride along; `compiled` covers objects the scheduler just produced in
/// case the directory listing races against slow filesystems.
pub fn gather_link_unit(
    obj_dir: &Path,
    toolchain: &dyn Toolchain,
    compiled: &[PathBuf],
) -> LinkUnit {
    let mut objects: Vec<PathBuf> = Vec::new();

    if let Ok(entries) = std::fs::read_dir(obj_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let is_input = path.extension().and_then(|e| e.to_str()).is_some_and(|e| {
                toolchain
                    .link_input_extensions()
                    .iter()
                    .any(|x| e.eq_ignore_ascii_case(x))
            });
            if is_input {
                objects.push(path);
            }
        }
    }

    objects.extend(compiled.iter().cloned());
    objects.sort();
    objects.dedup();

    LinkUnit { objects }
}

/// Drives the single link or archive invocation.
pub struct LinkOrchestrator<'a> {
    cfg: &'a BuildConfiguration,
    toolchain: &'a dyn Toolchain,
}

impl<'a> LinkOrchestrator<'a> {
    /// Create a new orchestrator.
    pub fn new(cfg: &'a BuildConfiguration, toolchain: &'a dyn Toolchain) -> Self {
        LinkOrchestrator { cfg, toolchain }
    }

    /// Produce the final artifact from a fully built link unit.
    pub fn link(&self, unit: &LinkUnit) -> Result<PathBuf, BuildError> {
        if unit.objects.is_empty() {
            return Err(BuildError::config(format!(
                "no object files to link for `{}`",
                self.cfg.output_name
            )));
        }

        let artifact = self.cfg.artifact_path(platform::host_os()).to_path_buf();

        if let Some(parent) = artifact.parent() {
            std::fs::create_dir_all(parent).map_err(|source| BuildError::Io {
                context: format!("failed to create output directory {}", parent.display()),
                source,
            })?;
        }

        let invocation = self.toolchain.link_invocation(
            self.cfg,
            &unit.objects,
            &artifact,
            &self.cfg.object_dir(),
        )?;

        tracing::info!("linking {}", artifact.display());
        execute_invocation(&invocation)?;

        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::GnuToolchain;
    use crate::util::platform::HostOs;
    use std::fs;
    use tempfile::TempDir;

    fn toolchain() -> GnuToolchain {
        GnuToolchain::new("true", "true", HostOs::Linux)
    }

    #[test]
    fn test_gather_includes_caller_supplied_objects() {
        let tmp = TempDir::new().unwrap();
        let compiled = tmp.path().join("a.o");
        let extra = tmp.path().join("vendor.o");
        fs::write(&compiled, "").unwrap();
        fs::write(&extra, "").unwrap();

        let tc = toolchain();
        let unit = gather_link_unit(tmp.path(), &tc, &[compiled.clone()]);

        assert_eq!(unit.objects, vec![compiled, extra]);
    }

    #[test]
    fn test_gather_ignores_non_objects() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.o"), "").unwrap();
        fs::write(tmp.path().join("compile-files.rsp"), "").unwrap();
        fs::write(tmp.path().join("stray.c"), "").unwrap();

        let tc = toolchain();
        let unit = gather_link_unit(tmp.path(), &tc, &[]);

        assert_eq!(unit.objects, vec![tmp.path().join("a.o")]);
    }

    #[test]
    fn test_empty_unit_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let cfg = BuildConfiguration::new(tmp.path(), "demo");
        let tc = toolchain();
        let orchestrator = LinkOrchestrator::new(&cfg, &tc);

        let err = orchestrator.link(&LinkUnit { objects: vec![] }).unwrap_err();
        assert!(matches!(err, BuildError::Config { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_link_creates_output_directory() {
        let tmp = TempDir::new().unwrap();
        let cfg = BuildConfiguration::new(tmp.path(), "demo");
        let tc = toolchain();
        let orchestrator = LinkOrchestrator::new(&cfg, &tc);

        let unit = LinkUnit {
            objects: vec![tmp.path().join("a.o")],
        };
        let artifact = orchestrator.link(&unit).unwrap();

        assert!(artifact.parent().unwrap().is_dir());
        assert!(artifact.starts_with(tmp.path().join("complete")));
    }
}
