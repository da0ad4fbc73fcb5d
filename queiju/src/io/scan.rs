//! Marker-file bookkeeping for detecting files touched by a run.
//!
//! Before a run the marker is created or rewritten in place so the filesystem stamps it with its
//! own clock; afterwards every regular file under the working directory with a strictly newer
//! modification time is reported. Comparing filesystem timestamps with each other avoids mixing
//! them with the process clock, which can be finer grained.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use tracing::{debug, instrument};
use walkdir::WalkDir;

/// Default marker file name, created in the working directory.
pub const DEFAULT_MARKER_NAME: &str = ".lastwatch";

/// A touched marker file and the timestamp it was stamped with.
#[derive(Debug, Clone)]
pub struct Marker {
    path: PathBuf,
    stamped: SystemTime,
}

impl Marker {
    /// Create or refresh `name` inside `dir`, returning its new modification time.
    ///
    /// An existing marker keeps its contents; only its timestamp moves.
    #[instrument(skip_all, fields(dir = %dir.display(), name = %name))]
    pub fn touch(dir: &Path, name: &str) -> Result<Self> {
        let path = dir.join(name);
        let previous = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("read marker {}", path.display()));
            }
        };
        // Writing the old bytes back lets the filesystem clock stamp the marker.
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("touch marker {}", path.display()))?;
        file.write_all(&previous)
            .with_context(|| format!("touch marker {}", path.display()))?;
        let stamped = file
            .metadata()
            .and_then(|meta| meta.modified())
            .with_context(|| format!("read marker mtime {}", path.display()))?;
        debug!(?stamped, "marker touched");
        Ok(Self { path, stamped })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stamped(&self) -> SystemTime {
        self.stamped
    }
}

/// List regular files under `root` modified strictly after `marker`, `find`-style.
///
/// Each entry is rendered as `./relative/path` followed by a newline, sorted by path. The marker
/// itself is always listed. Entries that vanish mid-scan are skipped.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn files_newer_than(root: &Path, marker: &Marker) -> Result<String> {
    let mut found = vec![marker.path().to_path_buf()];

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() || entry.path() == marker.path() {
            continue;
        }
        let Some(modified) = entry.metadata().ok().and_then(|meta| meta.modified().ok()) else {
            continue;
        };
        if modified > marker.stamped() {
            found.push(entry.into_path());
        }
    }

    let mut lines: Vec<String> = found
        .iter()
        .map(|path| render_relative(root, path))
        .collect();
    lines.sort();
    debug!(count = lines.len(), "modified files collected");

    let mut listing = String::new();
    for line in lines {
        listing.push_str(&line);
        listing.push('\n');
    }
    Ok(listing)
}

/// Render `path` relative to `root` with a leading `./`, using `/` as separator.
fn render_relative(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("./{}", parts.join("/"))
}
