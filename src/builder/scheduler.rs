//! Parallel compile scheduling.
//!
//! Drives the compile plan through a bounded worker pool. Every job
//! returns a result the scheduler inspects: success is reported only
//! when all jobs succeeded, the first failure becomes the overall
//! result, and later failures are logged rather than discarded. On the
//! first failure, jobs that have not started yet are skipped.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rayon::prelude::*;

use crate::builder::errors::BuildError;
use crate::builder::execute_invocation;
use crate::builder::toolchain::{CompileJob, CompilePlan};
use crate::config::Jobs;
use crate::util::platform;

/// Shared progress counters for one build.
#[derive(Clone, Default)]
pub struct BuildProgress {
    compiled: Arc<AtomicUsize>,
    linked: Arc<AtomicUsize>,
}

impl BuildProgress {
    /// Create a new progress tracker.
    pub fn new() -> Self {
        BuildProgress::default()
    }

    /// Record a completed compile job.
    pub fn compiled(&self) {
        self.compiled.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a completed link.
    pub fn linked(&self) {
        self.linked.fetch_add(1, Ordering::SeqCst);
    }

    /// Get the completed compile-job count.
    pub fn compile_count(&self) -> usize {
        self.compiled.load(Ordering::SeqCst)
    }

    /// Get the completed link count.
    pub fn link_count(&self) -> usize {
        self.linked.load(Ordering::SeqCst)
    }
}

/// Bounded-pool compile scheduler.
pub struct CompileScheduler {
    workers: usize,
}

impl CompileScheduler {
    /// Create a scheduler for the configured job count, clamped to the
    /// host CPU count.
    pub fn new(jobs: Jobs) -> Self {
        CompileScheduler {
            workers: jobs.resolve(platform::host_cpu_count()),
        }
    }

    /// Create a scheduler with an explicit worker count.
    pub fn with_workers(workers: usize) -> Self {
        CompileScheduler {
            workers: workers.max(1),
        }
    }

    /// Get the resolved worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Execute every job in the plan.
    ///
    /// Parallel jobs run concurrently up to the worker count and may
    /// finish in any order; the scheduler waits for all of them.
    /// Sequential jobs run one at a time afterwards. `on_done` fires
    /// once per successfully finished job.
    pub fn run(
        &self,
        plan: &CompilePlan,
        on_done: impl Fn(&CompileJob) + Sync,
    ) -> Result<(), BuildError> {
        if plan.is_empty() {
            return Ok(());
        }

        let cancelled = AtomicBool::new(false);
        let failures: Mutex<Vec<BuildError>> = Mutex::new(Vec::new());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| BuildError::config(format!("failed to create worker pool: {}", e)))?;

        pool.install(|| {
            plan.parallel.par_iter().for_each(|job| {
                self.run_job(job, &cancelled, &failures, &on_done);
            });
        });

        for job in &plan.sequential {
            self.run_job(job, &cancelled, &failures, &on_done);
        }

        let mut failures = failures.into_inner().unwrap_or_default();
        if failures.is_empty() {
            Ok(())
        } else {
            let failed = failures.len();
            Err(BuildError::Scheduling {
                failed,
                first: Box::new(failures.remove(0)),
            })
        }
    }

    fn run_job(
        &self,
        job: &CompileJob,
        cancelled: &AtomicBool,
        failures: &Mutex<Vec<BuildError>>,
        on_done: &(impl Fn(&CompileJob) + Sync),
    ) {
        if cancelled.load(Ordering::SeqCst) {
            tracing::debug!("skipping {} after earlier failure", job.label);
            return;
        }

        tracing::debug!("compiling {}", job.label);

        match execute_invocation(&job.invocation) {
            Ok(()) => on_done(job),
            Err(err) => {
                // Cancel not-yet-started jobs, but record every failure
                // that does surface.
                cancelled.store(true, Ordering::SeqCst);
                tracing::error!("compilation failed for {}: {}", job.label, err);
                if let Ok(mut failures) = failures.lock() {
                    failures.push(err);
                }
            }
        }
    }
}
