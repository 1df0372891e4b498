//! Visual Studio installation registry.
//!
//! Maps each supported compiler release to the environment variable and
//! default install-path templates used to locate its
//! environment-bootstrap script. New releases are additive entries in
//! the table.

use std::path::{Path, PathBuf};

use crate::builder::errors::BuildError;
use crate::config::MsvcVersion;

/// Where a release's `vcvarsall.bat` can be found.
#[derive(Debug, Clone, Copy)]
pub struct InstallLocation {
    /// Well-known environment variable pointing into the installation.
    pub env_var: &'static str,
    /// Path from the variable's value to the bootstrap script.
    pub env_relative: &'static str,
    /// Absolute install paths tried in order when the variable is unset.
    pub defaults: &'static [&'static str],
}

/// Look up the install location entry for a release.
pub fn install_location(version: MsvcVersion) -> InstallLocation {
    match version {
        MsvcVersion::Vs2015 => InstallLocation {
            env_var: "VS140COMNTOOLS",
            env_relative: "../../VC/vcvarsall.bat",
            defaults: &[
                r"C:\Program Files (x86)\Microsoft Visual Studio 14.0\VC\vcvarsall.bat",
            ],
        },
        MsvcVersion::Vs2017 => InstallLocation {
            env_var: "VS2017INSTALLDIR",
            env_relative: "VC/Auxiliary/Build/vcvarsall.bat",
            defaults: &[
                r"C:\Program Files (x86)\Microsoft Visual Studio\2017\Enterprise\VC\Auxiliary\Build\vcvarsall.bat",
                r"C:\Program Files (x86)\Microsoft Visual Studio\2017\Professional\VC\Auxiliary\Build\vcvarsall.bat",
                r"C:\Program Files (x86)\Microsoft Visual Studio\2017\Community\VC\Auxiliary\Build\vcvarsall.bat",
                r"C:\Program Files (x86)\Microsoft Visual Studio\2017\BuildTools\VC\Auxiliary\Build\vcvarsall.bat",
            ],
        },
        MsvcVersion::Vs2019 => InstallLocation {
            env_var: "VS2019INSTALLDIR",
            env_relative: "VC/Auxiliary/Build/vcvarsall.bat",
            defaults: &[
                r"C:\Program Files (x86)\Microsoft Visual Studio\2019\Enterprise\VC\Auxiliary\Build\vcvarsall.bat",
                r"C:\Program Files (x86)\Microsoft Visual Studio\2019\Professional\VC\Auxiliary\Build\vcvarsall.bat",
                r"C:\Program Files (x86)\Microsoft Visual Studio\2019\Community\VC\Auxiliary\Build\vcvarsall.bat",
                r"C:\Program Files (x86)\Microsoft Visual Studio\2019\BuildTools\VC\Auxiliary\Build\vcvarsall.bat",
            ],
        },
        MsvcVersion::Vs2022 => InstallLocation {
            env_var: "VS2022INSTALLDIR",
            env_relative: "VC/Auxiliary/Build/vcvarsall.bat",
            defaults: &[
                r"C:\Program Files\Microsoft Visual Studio\2022\Enterprise\VC\Auxiliary\Build\vcvarsall.bat",
                r"C:\Program Files\Microsoft Visual Studio\2022\Professional\VC\Auxiliary\Build\vcvarsall.bat",
                r"C:\Program Files\Microsoft Visual Studio\2022\Community\VC\Auxiliary\Build\vcvarsall.bat",
                r"C:\Program Files\Microsoft Visual Studio\2022\BuildTools\VC\Auxiliary\Build\vcvarsall.bat",
            ],
        },
    }
}

/// Locate the environment-bootstrap script for a release.
///
/// The environment variable wins when it points at an existing script;
/// otherwise the default install paths are tried in order. Absence of
/// all of them is a hard error naming the expected locations.
pub fn locate_environment_script(version: MsvcVersion) -> Result<PathBuf, BuildError> {
    let location = install_location(version);

    if let Ok(root) = std::env::var(location.env_var) {
        let candidate = Path::new(&root).join(location.env_relative);
        if candidate.exists() {
            return Ok(candidate);
        }
        tracing::warn!(
            "{} is set but {} does not exist",
            location.env_var,
            candidate.display()
        );
    }

    for default in location.defaults {
        let candidate = Path::new(default);
        if candidate.exists() {
            return Ok(candidate.to_path_buf());
        }
    }

    Err(BuildError::toolchain_not_found(
        "vcvarsall.bat",
        format!(
            "no {} installation found: set {} to the installation directory, \
             or install to the default location ({})",
            version.as_str(),
            location.env_var,
            location.defaults[0],
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_version_has_an_entry() {
        for version in [
            MsvcVersion::Vs2015,
            MsvcVersion::Vs2017,
            MsvcVersion::Vs2019,
            MsvcVersion::Vs2022,
        ] {
            let location = install_location(version);
            assert!(!location.env_var.is_empty());
            assert!(!location.defaults.is_empty());
            assert!(location
                .defaults
                .iter()
                .all(|d| d.ends_with("vcvarsall.bat")));
        }
    }

    #[test]
    fn test_2022_lives_under_program_files() {
        let location = install_location(MsvcVersion::Vs2022);
        assert!(location.defaults[0].starts_with(r"C:\Program Files\"));
    }

    #[test]
    fn test_locate_error_names_expected_path() {
        // VS2019INSTALLDIR is not set in test environments and the
        // default paths do not exist off Windows.
        if std::env::var("VS2019INSTALLDIR").is_ok() || cfg!(target_os = "windows") {
            return;
        }
        let err = locate_environment_script(MsvcVersion::Vs2019).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("VS2019INSTALLDIR"));
        assert!(msg.contains(r"2019\Enterprise"));
    }

    #[test]
    fn test_locate_via_env_var() {
        let tmp = tempfile::TempDir::new().unwrap();
        let script_dir = tmp.path().join("VC").join("Auxiliary").join("Build");
        std::fs::create_dir_all(&script_dir).unwrap();
        let script = script_dir.join("vcvarsall.bat");
        std::fs::write(&script, "@echo off\r\n").unwrap();

        std::env::set_var("VS2017INSTALLDIR", tmp.path());
        let found = locate_environment_script(MsvcVersion::Vs2017);
        std::env::remove_var("VS2017INSTALLDIR");

        let found = found.unwrap();
        assert!(found.ends_with("vcvarsall.bat"));
    }
}
