//! The build operation.
//!
//! Wires the phases together: validate the configuration, enumerate
//! sources, select stale ones, schedule the compile plan across the
//! worker pool, then hand the link unit to the orchestrator. The
//! fail-on-error policy is applied here: toolchain failures either
//! abort or are logged and reported as a failed outcome.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::builder::compile_commands::emit_compile_commands;
use crate::builder::staleness::select_stale;
use crate::builder::{
    gather_link_unit, select_toolchain, BuildError, BuildProgress, CompileScheduler,
    LinkOrchestrator,
};
use crate::config::{BuildConfiguration, Jobs};
use crate::util::fs::ensure_dir;

/// Per-invocation overrides and switches for the build operation.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Override the configured worker count.
    pub jobs: Option<Jobs>,
    /// Override the configured incremental flag.
    pub incremental: Option<bool>,
    /// Write compile_commands.json next to the manifest.
    pub emit_compile_commands: bool,
    /// Show a progress bar while compiling.
    pub progress: bool,
}

/// What one build invocation produced.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// Final artifact path, when the build got that far.
    pub artifact: Option<PathBuf>,
    /// False when a policy-downgraded toolchain failure occurred.
    pub succeeded: bool,
    /// Number of compile jobs that ran.
    pub compiled: usize,
    /// Wall-clock build time.
    pub elapsed: Duration,
}

/// Run one complete build.
pub fn run_build(cfg: &BuildConfiguration, opts: &BuildOptions) -> Result<BuildOutcome> {
    let start = Instant::now();

    cfg.validate()?;
    let toolchain = select_toolchain(cfg)?;

    // Enumerate the configured source selections.
    let mut sources = Vec::new();
    for set in &cfg.sources {
        sources.extend(set.resolve(&cfg.working_dir)?);
    }
    sources.sort();
    sources.dedup();

    let obj_dir = cfg.object_dir();
    ensure_dir(&obj_dir)?;

    let incremental = opts.incremental.unwrap_or(cfg.incremental);
    let stale = select_stale(&sources, &obj_dir, incremental);
    tracing::info!(
        "{} of {} source file(s) need compilation",
        stale.len(),
        sources.len()
    );

    let plan = toolchain.plan_compile(cfg, &stale, &obj_dir)?;

    if opts.emit_compile_commands {
        let path = cfg.working_dir.join("compile_commands.json");
        emit_compile_commands(cfg, &plan, &path)?;
        tracing::info!("wrote {}", path.display());
    }

    let progress = BuildProgress::new();
    let bar = if opts.progress && plan.job_count() > 1 {
        let bar = ProgressBar::new(plan.job_count() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(bar)
    } else {
        None
    };

    let scheduler = CompileScheduler::new(opts.jobs.unwrap_or(cfg.jobs));
    let compile_result = scheduler.run(&plan, |job| {
        progress.compiled();
        if let Some(bar) = &bar {
            bar.set_message(job.label.clone());
            bar.inc(1);
        }
    });

    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    if let Err(err) = compile_result {
        // If any compile failed, no link is attempted.
        return downgrade_or_raise(cfg, err, &progress, start);
    }

    let unit = gather_link_unit(&obj_dir, toolchain.as_ref(), &plan.objects());
    let orchestrator = LinkOrchestrator::new(cfg, toolchain.as_ref());

    match orchestrator.link(&unit) {
        Ok(artifact) => {
            progress.linked();
            Ok(BuildOutcome {
                artifact: Some(artifact),
                succeeded: true,
                compiled: progress.compile_count(),
                elapsed: start.elapsed(),
            })
        }
        Err(err) => downgrade_or_raise(cfg, err, &progress, start),
    }
}

/// Apply the fail-on-error policy to a build failure.
fn downgrade_or_raise(
    cfg: &BuildConfiguration,
    err: BuildError,
    progress: &BuildProgress,
    start: Instant,
) -> Result<BuildOutcome> {
    if cfg.fail_on_error || !err.respects_fail_policy() {
        return Err(err.into());
    }

    tracing::error!("build failed (continuing): {}", err);
    Ok(BuildOutcome {
        artifact: None,
        succeeded: false,
        compiled: progress.compile_count(),
        elapsed: start.elapsed(),
    })
}
