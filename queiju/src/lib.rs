//! Run Quantum ESPRESSO binaries from Rust.
//!
//! A [`Runner`] holds an input deck and feeds it to `pw.x` or `bands.x` on
//! stdin, capturing stdout, timing the run and listing the files the binary
//! touched in the working directory:
//!
//! - **[`runner`]**: the runner itself (path configuration, run, save output).
//! - **[`command`]**: the allow-list of QE executables.
//! - **[`io`]**: side-effecting helpers (child processes, `PATH` lookup,
//!   marker-file scans, TOML config).
//! - **[`report`]**: JSON summaries of completed runs.
//!
//! ```no_run
//! # fn main() -> queiju::Result<()> {
//! let mut qe = queiju::Runner::new("&CONTROL\n  calculation = 'scf'\n/\n", "/opt/qe/bin")?;
//! let elapsed = qe.run("pw.x")?;
//! println!("pw.x took {:.1}s, touched:\n{}", elapsed.as_secs_f64(), qe.modified_files());
//! qe.save_output("scf.out")?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod report;
pub mod runner;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use command::QeCommand;
pub use error::{Error, ErrorKind, Result};
pub use runner::{ExitPolicy, RunOptions, Runner, RunnerBuilder};
