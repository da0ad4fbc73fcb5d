//! I/O helpers behind the runner: child processes, `PATH` lookup, marker scans, config.

pub mod config;
pub mod lookup;
pub mod process;
pub mod scan;
