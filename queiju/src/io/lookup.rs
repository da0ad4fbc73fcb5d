//! `PATH` resolution for bare executable names.
//!
//! [`ExecutableLookup`] keeps the runner independent of how names are resolved.
//! Production code shells out to `which`; tests script the answer.

use std::process::{Command, Stdio};

use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// Answers whether a bare name is resolvable through the process `PATH`.
pub trait ExecutableLookup {
    fn is_resolvable(&self, name: &str) -> Result<bool>;
}

/// Lookup backed by the external `which` utility (exit status 0 = found).
#[derive(Debug, Clone, Copy, Default)]
pub struct WhichLookup;

impl ExecutableLookup for WhichLookup {
    #[instrument(skip(self))]
    fn is_resolvable(&self, name: &str) -> Result<bool> {
        let status = Command::new("which")
            .arg(name)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| Error::Lookup {
                command: name.to_string(),
                source,
            })?;
        debug!(exit_code = ?status.code(), "which finished");
        Ok(status.success())
    }
}
