//! Machine-readable summary of a completed run.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::command::QeCommand;
use crate::io::lookup::ExecutableLookup;
use crate::runner::Runner;

/// Summary of the most recent run of a [`Runner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub command: QeCommand,
    /// Invocation target: bare name when resolved through `PATH`, else directory + name.
    pub target: String,
    pub elapsed_seconds: f64,
    pub exit_code: Option<i32>,
    /// Files touched by the run, `./`-relative to the working directory.
    pub modified_files: Vec<String>,
}

impl RunReport {
    /// Build a report from `runner`; `None` if it has not completed a run yet.
    pub fn from_runner<L: ExecutableLookup>(runner: &Runner<L>) -> Option<Self> {
        let (command, target) = runner.last_run()?;
        Some(Self {
            command,
            target: target.to_string(),
            elapsed_seconds: runner.elapsed_seconds(),
            exit_code: runner.exit_code(),
            modified_files: runner
                .modified_files()
                .lines()
                .map(str::to_string)
                .collect(),
        })
    }

    /// Pretty-printed JSON with trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = serde_json::to_string_pretty(self).context("serialize run report")?;
        buf.push('\n');
        Ok(buf)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let buf = self.to_json()?;
        fs::write(path, buf).with_context(|| format!("write run report {}", path.display()))
    }
}
