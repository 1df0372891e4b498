//! Build error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

/// Error raised by the build engine.
///
/// Configuration and library-resolution errors are detected eagerly and
/// are always fatal. Toolchain-exit and scheduling errors are subject to
/// the configuration's fail-on-error policy. Nothing is ever retried.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A mandatory configuration field is missing or malformed.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// An external tool could not be launched at all.
    #[error("toolchain not found: `{program}`\n{hint}")]
    ToolchainNotFound { program: String, hint: String },

    /// An external tool ran and returned a non-zero exit code.
    #[error("`{command}` exited with code {code}")]
    ToolchainExit { code: i32, command: String },

    /// A declared library name could not be located in any search path.
    #[error("library `{name}` not found in any search path")]
    LibraryNotFound { name: String, searched: Vec<PathBuf> },

    /// One or more parallel compile units failed.
    #[error("{failed} compile job(s) failed")]
    Scheduling {
        failed: usize,
        #[source]
        first: Box<BuildError>,
    },

    /// Filesystem work the build itself needs (response files, output
    /// directories) failed.
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        BuildError::Config {
            message: message.into(),
        }
    }

    /// Create a toolchain-not-found error with remediation guidance.
    pub fn toolchain_not_found(program: impl Into<String>, hint: impl Into<String>) -> Self {
        BuildError::ToolchainNotFound {
            program: program.into(),
            hint: hint.into(),
        }
    }

    /// Whether this error is subject to the fail-on-error policy.
    ///
    /// Only failures of toolchain invocations themselves can be
    /// downgraded to a logged build failure; everything else aborts
    /// regardless of the policy flag.
    pub fn respects_fail_policy(&self) -> bool {
        matches!(
            self,
            BuildError::ToolchainExit { .. } | BuildError::Scheduling { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_scope() {
        assert!(BuildError::ToolchainExit {
            code: 2,
            command: "cc -c a.c".to_string()
        }
        .respects_fail_policy());

        assert!(BuildError::Scheduling {
            failed: 1,
            first: Box::new(BuildError::ToolchainExit {
                code: 1,
                command: "cc".to_string()
            }),
        }
        .respects_fail_policy());

        assert!(!BuildError::config("missing name").respects_fail_policy());
        assert!(!BuildError::LibraryNotFound {
            name: "z".to_string(),
            searched: vec![]
        }
        .respects_fail_policy());
        assert!(!BuildError::toolchain_not_found("cl", "check PATH").respects_fail_policy());
    }

    #[test]
    fn test_exit_error_carries_command() {
        let err = BuildError::ToolchainExit {
            code: 3,
            command: "link /OUT:foo.dll".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("link /OUT:foo.dll"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_scheduling_keeps_first_cause() {
        let err = BuildError::Scheduling {
            failed: 2,
            first: Box::new(BuildError::ToolchainExit {
                code: 1,
                command: "cc -c bad.c".to_string(),
            }),
        };
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("bad.c"));
    }
}
