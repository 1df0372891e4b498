//! The build engine.
//!
//! Staleness selection, toolchain adapters, the parallel compile
//! scheduler, and the link/archive orchestrator.

use crate::util::process::ProcessBuilder;

pub mod compile_commands;
pub mod errors;
pub mod link;
pub mod scheduler;
pub mod staleness;
pub mod toolchain;

pub use errors::BuildError;
pub use link::{gather_link_unit, LinkOrchestrator, LinkUnit};
pub use scheduler::{BuildProgress, CompileScheduler};
pub use toolchain::{select_toolchain, Invocation, Toolchain, ToolchainFamily};

/// Run one toolchain invocation through the process runner and map its
/// outcome onto the build-error taxonomy.
pub(crate) fn execute_invocation(invocation: &Invocation) -> Result<(), BuildError> {
    let command = ProcessBuilder::new(&invocation.program).args(&invocation.args);

    tracing::debug!("running `{}`", command.display_command());

    let status = command.stream().map_err(|err| {
        let program = invocation.program.display().to_string();
        let hint = if err.kind() == std::io::ErrorKind::NotFound {
            format!(
                "check that `{}` is installed and reachable via PATH \
                 (or that the configured toolchain matches this machine)",
                program
            )
        } else {
            format!("the process could not be launched: {}", err)
        };
        BuildError::toolchain_not_found(program, hint)
    })?;

    if !status.success() {
        return Err(BuildError::ToolchainExit {
            code: status.code().unwrap_or(-1),
            command: invocation.display_command(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_execute_invocation_success() {
        assert!(execute_invocation(&Invocation::new("true")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_execute_invocation_exit_code() {
        let err = execute_invocation(&Invocation::new("false")).unwrap_err();
        match err {
            BuildError::ToolchainExit { code, command } => {
                assert_ne!(code, 0);
                assert_eq!(command, "false");
            }
            other => panic!("expected exit error, got {:?}", other),
        }
    }

    #[test]
    fn test_execute_invocation_not_found() {
        let err = execute_invocation(&Invocation::new("slipway-missing-tool")).unwrap_err();
        assert!(matches!(err, BuildError::ToolchainNotFound { .. }));
        assert!(err.to_string().contains("PATH"));
    }
}
