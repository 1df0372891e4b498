//! Shared utilities

pub mod fs;
pub mod platform;
pub mod process;

pub use platform::HostOs;
pub use process::ProcessBuilder;
