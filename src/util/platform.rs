//! Host platform detection.
//!
//! Thin wrapper over `std::env::consts` so the rest of the crate can
//! dispatch on OS family and architecture without string comparisons.

use crate::config::TargetArch;

/// Operating-system family the build is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Macos,
    Linux,
}

impl HostOs {
    /// Get the OS name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            HostOs::Windows => "windows",
            HostOs::Macos => "macos",
            HostOs::Linux => "linux",
        }
    }
}

/// Detect the current operating system family.
///
/// Anything that is not Windows or macOS is treated as Linux-like;
/// the Unix toolchain flags apply to the BSDs equally well.
pub fn host_os() -> HostOs {
    match std::env::consts::OS {
        "windows" => HostOs::Windows,
        "macos" => HostOs::Macos,
        _ => HostOs::Linux,
    }
}

/// Detect the current CPU architecture.
///
/// Only x86 and amd64 are meaningful build targets here; 64-bit hosts
/// that are neither report as amd64 so clamping and cross-detection
/// still behave sensibly.
pub fn host_arch() -> TargetArch {
    match std::env::consts::ARCH {
        "x86" => TargetArch::X86,
        _ => TargetArch::Amd64,
    }
}

/// Number of usable CPUs on this host.
pub fn host_cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
