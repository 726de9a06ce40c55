//! CLI command implementations.

pub mod analyze;
pub mod output;

/// Exit code for a missing archive or unusable configuration.
pub const EXIT_USAGE: u8 = 1;

/// Exit code for an I/O failure while reading the archive.
pub const EXIT_IO: u8 = 2;
