//! The QE runner: binary location, synchronous execution, output capture.
//!
//! A [`Runner`] owns one input deck and replays it against `pw.x` or `bands.x`.
//! Each run touches a marker file in the working directory, blocks until the
//! child exits, then records stdout, elapsed wall-clock time and the files the
//! child created or modified.
//!
//! Runs sharing a working directory must not overlap: the marker file is the
//! only reference point for the modified-file scan.

use std::fs;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::command::{QeCommand, REFERENCE_COMMAND};
use crate::error::{Error, Result};
use crate::io::lookup::{ExecutableLookup, WhichLookup};
use crate::io::process;
use crate::io::scan::{DEFAULT_MARKER_NAME, Marker, files_newer_than};

/// How a non-zero child exit status is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitPolicy {
    /// Capture output and succeed regardless of the exit status.
    #[default]
    Permissive,
    /// Capture output, then fail with [`Error::CommandFailed`].
    Strict,
}

/// Per-run behavior knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Marker file name, created in the working directory.
    pub marker_name: String,
    /// Kill the child once this elapses. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub exit_policy: ExitPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            marker_name: DEFAULT_MARKER_NAME.to_string(),
            timeout: None,
            exit_policy: ExitPolicy::Permissive,
        }
    }
}

/// Wrapper around the QE command-line binaries.
#[derive(Debug)]
pub struct Runner<L = WhichLookup> {
    input_text: String,
    output_text: String,
    modified_files: String,
    elapsed_seconds: f64,
    binary_search_path: String,
    workdir: PathBuf,
    exit_code: Option<i32>,
    last_run: Option<(QeCommand, String)>,
    options: RunOptions,
    lookup: L,
}

/// Builder for a [`Runner`] with a non-default working directory, options or lookup.
#[derive(Debug)]
pub struct RunnerBuilder<L = WhichLookup> {
    input_text: String,
    path: String,
    workdir: Option<PathBuf>,
    options: RunOptions,
    lookup: L,
}

impl Runner<WhichLookup> {
    /// Create a runner for `input_text`, validating `path` as the QE binary directory.
    ///
    /// An empty `path` means the binaries are expected on `PATH`.
    pub fn new(input_text: impl Into<String>, path: &str) -> Result<Self> {
        Self::builder(input_text).path(path).build()
    }

    pub fn builder(input_text: impl Into<String>) -> RunnerBuilder<WhichLookup> {
        RunnerBuilder {
            input_text: input_text.into(),
            path: String::new(),
            workdir: None,
            options: RunOptions::default(),
            lookup: WhichLookup,
        }
    }
}

impl<L: ExecutableLookup> RunnerBuilder<L> {
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Directory the child runs in and the marker scan covers. Defaults to the process cwd.
    pub fn workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn lookup<M: ExecutableLookup>(self, lookup: M) -> RunnerBuilder<M> {
        RunnerBuilder {
            input_text: self.input_text,
            path: self.path,
            workdir: self.workdir,
            options: self.options,
            lookup,
        }
    }

    pub fn build(self) -> Result<Runner<L>> {
        // Absolute so a configured binary path stays valid once the child changes directory.
        let workdir = match self.workdir {
            Some(dir) => std::path::absolute(&dir)
                .map_err(|e| Error::io(format!("could not resolve {}", dir.display()), e))?,
            None => std::env::current_dir()
                .map_err(|e| Error::io("could not determine current directory", e))?,
        };
        let mut runner = Runner {
            input_text: self.input_text,
            output_text: String::new(),
            modified_files: String::new(),
            elapsed_seconds: 0.0,
            binary_search_path: String::new(),
            workdir,
            exit_code: None,
            last_run: None,
            options: self.options,
            lookup: self.lookup,
        };
        runner.set_path(&self.path)?;
        Ok(runner)
    }
}

impl<L: ExecutableLookup> Runner<L> {
    /// Point the runner at a directory holding the QE binaries.
    ///
    /// An empty `path` requires `pw.x` on `PATH`. Otherwise `path` must be an existing directory
    /// containing `pw.x`; it is stored with exactly one trailing separator. Relative paths are
    /// resolved against the working directory. On error the stored path is left unchanged.
    #[instrument(skip(self))]
    pub fn set_path(&mut self, path: &str) -> Result<()> {
        if path.is_empty() {
            if !self.lookup.is_resolvable(REFERENCE_COMMAND.binary_name())? {
                warn!("pw.x not resolvable through PATH");
                return Err(Error::QeNotInPath);
            }
            self.binary_search_path.clear();
            debug!("using PATH for QE binaries");
            return Ok(());
        }

        if !self.resolve(path).is_dir() {
            return Err(Error::InvalidPath {
                path: path.to_string(),
            });
        }
        let normalized = with_trailing_separator(path);
        if !self
            .resolve(&normalized)
            .join(REFERENCE_COMMAND.binary_name())
            .is_file()
        {
            return Err(Error::BinariesNotFound { path: normalized });
        }
        info!(path = %normalized, "QE binary directory set");
        self.binary_search_path = normalized;
        Ok(())
    }

    /// Run the allow-listed executable `name` against the stored input.
    ///
    /// Anything other than `pw.x` or `bands.x` is rejected before a process is spawned.
    pub fn run(&mut self, name: &str) -> Result<Duration> {
        let command: QeCommand = name.parse()?;
        self.run_command(command)
    }

    /// Run `command`, blocking until it exits, and record its output.
    ///
    /// Returns the elapsed wall-clock time. Validation errors leave the recorded output, file
    /// listing, elapsed time and exit code from the previous run untouched.
    #[instrument(skip(self), fields(workdir = %self.workdir.display()))]
    pub fn run_command(&mut self, command: QeCommand) -> Result<Duration> {
        let target = self.resolve_target(command)?;

        let start = Instant::now();
        let marker = Marker::touch(&self.workdir, &self.options.marker_name)
            .map_err(|e| Error::io("could not create marker file", e))?;

        let program = if self.binary_search_path.is_empty() {
            PathBuf::from(&target)
        } else {
            self.resolve(&target)
        };
        let mut cmd = Command::new(program);
        cmd.current_dir(&self.workdir);
        info!(%target, "starting QE command");
        let output = process::run_command(cmd, self.input_text.as_bytes(), self.options.timeout)
            .map_err(|source| Error::Execute {
                target: target.clone(),
                source: source.into(),
            })?;
        if output.timed_out {
            return Err(Error::Timeout {
                command: command.to_string(),
                timeout: self.options.timeout.unwrap_or_default(),
            });
        }

        let modified_files = files_newer_than(&self.workdir, &marker)
            .map_err(|e| Error::io("could not scan for modified files", e))?;
        let elapsed = start.elapsed();

        self.output_text = output.stdout_text();
        self.modified_files = modified_files;
        self.elapsed_seconds = elapsed.as_secs_f64();
        self.exit_code = output.status.code();
        self.last_run = Some((command, target));
        info!(
            elapsed_secs = self.elapsed_seconds,
            exit_code = ?self.exit_code,
            "QE command finished"
        );

        if !output.status.success() {
            warn!(exit_code = ?self.exit_code, "QE command reported failure");
            if self.options.exit_policy == ExitPolicy::Strict {
                return Err(Error::CommandFailed {
                    command: command.to_string(),
                    code: self.exit_code,
                });
            }
        }
        Ok(elapsed)
    }

    /// Write the captured output to `file`, followed by a newline.
    ///
    /// Like the binary directory, a relative `file` is resolved against the working directory.
    pub fn save_output(&self, file: impl AsRef<Path>) -> Result<()> {
        let file = self.workdir.join(file);
        let mut contents = String::with_capacity(self.output_text.len() + 1);
        contents.push_str(&self.output_text);
        contents.push('\n');
        fs::write(&file, contents).map_err(|source| Error::SaveOutput {
            path: file.clone(),
            source,
        })?;
        debug!(path = %file.display(), "output saved");
        Ok(())
    }

    fn resolve_target(&self, command: QeCommand) -> Result<String> {
        let name = command.binary_name();
        if self.binary_search_path.is_empty() {
            if !self.lookup.is_resolvable(name)? {
                return Err(Error::CommandNotInPath {
                    command: name.to_string(),
                });
            }
            return Ok(name.to_string());
        }

        if !self.resolve(&self.binary_search_path).is_dir() {
            return Err(Error::InvalidPath {
                path: self.binary_search_path.clone(),
            });
        }
        let target = format!("{}{}", self.binary_search_path, name);
        if !self.resolve(&target).is_file() {
            return Err(Error::MissingExecutable { path: target });
        }
        Ok(target)
    }

    /// Resolve a configured path against the working directory.
    fn resolve(&self, path: &str) -> PathBuf {
        self.workdir.join(path)
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    /// Stdout of the most recent run; empty before the first run.
    pub fn output_text(&self) -> &str {
        &self.output_text
    }

    /// `find`-style listing of files touched by the most recent run.
    pub fn modified_files(&self) -> &str {
        &self.modified_files
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// Stored binary directory, with trailing separator, or empty when using `PATH`.
    pub fn binary_search_path(&self) -> &str {
        &self.binary_search_path
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Exit code of the most recent child; `None` before a run or after a signal.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Command and invocation target of the most recent completed run.
    pub fn last_run(&self) -> Option<(QeCommand, &str)> {
        self.last_run
            .as_ref()
            .map(|(command, target)| (*command, target.as_str()))
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }
}

fn with_trailing_separator(path: &str) -> String {
    let trimmed = path.trim_end_matches(['/', MAIN_SEPARATOR]);
    let mut normalized = String::with_capacity(trimmed.len() + 1);
    normalized.push_str(trimmed);
    normalized.push(MAIN_SEPARATOR);
    normalized
}
