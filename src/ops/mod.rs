//! High-level operations.
//!
//! This module contains the implementation of Slipway commands.

pub mod build;
pub mod clean;

pub use build::{run_build, BuildOptions, BuildOutcome};
pub use clean::clean;
