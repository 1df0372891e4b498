//! `slipway build` command

use anyhow::Result;

use slipway::config::Jobs;
use slipway::ops::{run_build, BuildOptions};

use crate::cli::BuildArgs;

pub fn execute(args: BuildArgs) -> Result<()> {
    let cfg = super::load_configuration(args.manifest_path.as_deref())?;

    let jobs = args
        .jobs
        .as_deref()
        .map(str::parse::<Jobs>)
        .transpose()?;

    let opts = BuildOptions {
        jobs,
        incremental: if args.no_incremental { Some(false) } else { None },
        emit_compile_commands: args.emit_compile_commands,
        progress: true,
    };

    let outcome = run_build(&cfg, &opts)?;

    if outcome.succeeded {
        let artifact = outcome
            .artifact
            .as_ref()
            .map(|a| a.display().to_string())
            .unwrap_or_default();
        eprintln!(
            "    Finished {} ({} file(s) compiled) in {:.2}s",
            artifact,
            outcome.compiled,
            outcome.elapsed.as_secs_f64()
        );
    } else {
        // fail-on-error is disabled: the failure was already logged,
        // the overall invocation carries on.
        eprintln!(
            "    Build failed after {:.2}s (continuing per fail-on-error=false)",
            outcome.elapsed.as_secs_f64()
        );
    }

    Ok(())
}
