//! The fixed set of QE executables the runner is allowed to launch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Executable used to validate a binary directory or `PATH` setup.
pub const REFERENCE_COMMAND: QeCommand = QeCommand::Pw;

/// A recognized QE executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QeCommand {
    /// `pw.x`, the plane-wave self-consistent-field solver.
    #[serde(rename = "pw.x")]
    Pw,
    /// `bands.x`, band-structure post-processing of `pw.x` output.
    #[serde(rename = "bands.x")]
    Bands,
}

impl QeCommand {
    pub const ALL: [QeCommand; 2] = [QeCommand::Pw, QeCommand::Bands];

    /// File name of the executable.
    pub fn binary_name(self) -> &'static str {
        match self {
            QeCommand::Pw => "pw.x",
            QeCommand::Bands => "bands.x",
        }
    }
}

impl fmt::Display for QeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

impl FromStr for QeCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QeCommand::ALL
            .into_iter()
            .find(|cmd| cmd.binary_name() == s)
            .ok_or_else(|| Error::InvalidCommand {
                command: s.to_string(),
            })
    }
}
