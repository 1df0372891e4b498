//! Slipway - A declarative build orchestrator for native C/C++ code
//!
//! This crate turns a declarative description of one compilation unit
//! (sources, include paths, symbol definitions, libraries, output kind)
//! into the minimal sequence of external toolchain invocations needed
//! to produce an executable, shared library, or static library.

pub mod builder;
pub mod config;
pub mod ops;
pub mod util;

pub use builder::errors::BuildError;
pub use builder::{BuildProgress, CompileScheduler, LinkOrchestrator, Toolchain};
pub use config::{BuildConfiguration, Jobs, Manifest, OutputKind, TargetArch};
