//! The clean operation.

use anyhow::Result;

use crate::config::BuildConfiguration;
use crate::util::fs::remove_dir_all_if_exists;

/// Remove all build outputs: the object tree and the output directory.
pub fn clean(cfg: &BuildConfiguration) -> Result<()> {
    let obj_root = cfg.working_dir.join("obj");
    remove_dir_all_if_exists(&obj_root)?;
    tracing::info!("removed {}", obj_root.display());

    let output_dir = cfg.output_dir();
    remove_dir_all_if_exists(&output_dir)?;
    tracing::info!("removed {}", output_dir.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_build_outputs() {
        let tmp = TempDir::new().unwrap();
        let cfg = BuildConfiguration::new(tmp.path(), "demo");

        fs::create_dir_all(cfg.object_dir()).unwrap();
        fs::create_dir_all(cfg.output_dir()).unwrap();
        fs::write(cfg.object_dir().join("a.o"), "").unwrap();

        clean(&cfg).unwrap();

        assert!(!tmp.path().join("obj").exists());
        assert!(!cfg.output_dir().exists());
    }

    #[test]
    fn test_clean_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let cfg = BuildConfiguration::new(tmp.path(), "demo");

        clean(&cfg).unwrap();
        clean(&cfg).unwrap();
    }
}
