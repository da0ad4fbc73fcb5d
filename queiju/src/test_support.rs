//! Test-only helpers: fake QE installs and scripted `PATH` lookups.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::command::QeCommand;
use crate::error::Result;
use crate::io::lookup::ExecutableLookup;

/// Default `pw.x` stand-in: echoes its input between banner lines and writes a save file.
///
/// The short sleep keeps the written files' timestamps clear of the marker's on filesystems
/// with coarse mtime resolution.
pub const FAKE_PW_SCRIPT: &str = "sleep 0.1
echo '     Program PWSCF v.7.2 starts on fake'
cat
mkdir -p out/pwscf.save
echo '<qes:espresso/>' > out/pwscf.save/data-file-schema.xml
echo '     JOB DONE.'
";

/// Default `bands.x` stand-in: consumes its input and writes a bands file.
pub const FAKE_BANDS_SCRIPT: &str = "sleep 0.1
cat > /dev/null
echo '     Program BANDS v.7.2 starts on fake'
echo '&plot nbnd=  8, nks=  40 /' > bands.dat
echo '     JOB DONE.'
";

/// A directory of executable shell scripts named like the QE binaries.
pub struct FakeQeInstall {
    _temp: Option<TempDir>,
    bin_dir: PathBuf,
}

impl FakeQeInstall {
    /// Create a fresh temp directory holding `pw.x` and `bands.x`.
    pub fn new() -> io::Result<Self> {
        let temp = tempfile::tempdir()?;
        let bin_dir = temp.path().to_path_buf();
        let install = Self {
            _temp: Some(temp),
            bin_dir,
        };
        install.write_defaults()?;
        Ok(install)
    }

    /// Install the fake binaries into `dir`, creating it if needed. The caller owns cleanup.
    pub fn in_dir(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let install = Self {
            _temp: None,
            bin_dir: dir.to_path_buf(),
        };
        install.write_defaults()?;
        Ok(install)
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    /// The binary directory as a string without trailing separator.
    pub fn bin_dir_str(&self) -> String {
        self.bin_dir.to_string_lossy().into_owned()
    }

    /// Replace the script for `command` with `body` (a `/bin/sh` script body).
    pub fn write_script(&self, command: QeCommand, body: &str) -> io::Result<()> {
        let path = self.bin_dir.join(command.binary_name());
        // Write to a sibling and rename so no writable descriptor to the executable stays open.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, format!("#!/bin/sh\n{body}"))?;
        make_executable(&tmp)?;
        fs::rename(&tmp, &path)
    }

    fn write_defaults(&self) -> io::Result<()> {
        self.write_script(QeCommand::Pw, FAKE_PW_SCRIPT)?;
        self.write_script(QeCommand::Bands, FAKE_BANDS_SCRIPT)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Lookup that answers from a fixed list of resolvable names.
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    found: Vec<String>,
}

impl StaticLookup {
    /// Nothing resolves.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn found(names: &[&str]) -> Self {
        Self {
            found: names.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl ExecutableLookup for StaticLookup {
    fn is_resolvable(&self, name: &str) -> Result<bool> {
        Ok(self.found.iter().any(|found| found == name))
    }
}
