//! Runner configuration stored in `queiju.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::io::scan::DEFAULT_MARKER_NAME;
use crate::runner::{ExitPolicy, RunOptions};

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "queiju.toml";

/// Runner configuration (TOML).
///
/// Missing fields fall back to the behavior of a bare `Runner::new`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueijuConfig {
    /// Directory holding `pw.x` and friends. Empty means resolve through `PATH`.
    pub bin_dir: String,

    /// Name of the marker file touched in the working directory before each run.
    pub marker_name: String,

    /// Kill the child after this many seconds. `0` waits indefinitely.
    pub timeout_secs: u64,

    pub exit_policy: ExitPolicy,
}

impl Default for QueijuConfig {
    fn default() -> Self {
        Self {
            bin_dir: String::new(),
            marker_name: DEFAULT_MARKER_NAME.to_string(),
            timeout_secs: 0,
            exit_policy: ExitPolicy::Permissive,
        }
    }
}

impl QueijuConfig {
    pub fn validate(&self) -> Result<()> {
        let name = self.marker_name.trim();
        if name.is_empty() {
            return Err(anyhow!("marker_name must be non-empty"));
        }
        if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            return Err(anyhow!("marker_name must be a bare file name, got {name:?}"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Options for a [`crate::Runner`] built from this config.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            marker_name: self.marker_name.trim().to_string(),
            timeout: self.timeout(),
            exit_policy: self.exit_policy,
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `QueijuConfig::default()`.
pub fn load_config(path: &Path) -> Result<QueijuConfig> {
    if !path.exists() {
        let cfg = QueijuConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: QueijuConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &QueijuConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, QueijuConfig::default());
        assert_eq!(cfg.timeout(), None);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("queiju.toml");
        let cfg = QueijuConfig {
            bin_dir: "/opt/qe/bin".to_string(),
            timeout_secs: 3600,
            exit_policy: ExitPolicy::Strict,
            ..QueijuConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.timeout(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("queiju.toml");
        fs::write(&path, "exit_policy = \"strict\"\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.exit_policy, ExitPolicy::Strict);
        assert_eq!(cfg.marker_name, DEFAULT_MARKER_NAME);
        assert!(cfg.bin_dir.is_empty());
    }

    #[test]
    fn rejects_marker_outside_workdir() {
        let cfg = QueijuConfig {
            marker_name: "../escape".to_string(),
            ..QueijuConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("bare file name"));
    }
}
