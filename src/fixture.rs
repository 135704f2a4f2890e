// Fixture file used to exercise the upload endpoint. The file only lives
// for the duration of the upload check: `FixtureFile` removes it either
// explicitly through `remove` or, failing that, when it is dropped.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name used when no other fixture path is configured.
pub const DEFAULT_FIXTURE_NAME: &str = "system_test.csv";

const HEADER: &str = "Department,Date,Task,Status,Notes";

const ROWS: [&str; 3] = [
    "IT,2024-01-15,Server maintenance,Completed,All systems working fine",
    "IT,2024-01-15,Database backup,Completed,Backup finished successfully",
    "IT,2024-01-15,Security update,In Progress,Minor issue with legacy client",
];

/// The fixed CSV document: header plus three rows, each record
/// terminated by CRLF.
pub fn fixture_csv() -> String {
    let mut out = String::new();
    for line in std::iter::once(HEADER).chain(ROWS) {
        out.push_str(line);
        out.push_str("\r\n");
    }
    out
}

/// Owns the on-disk fixture until it is removed.
#[derive(Debug)]
pub struct FixtureFile {
    path: PathBuf,
    removed: bool,
}

impl FixtureFile {
    /// Write the fixture to `path`, replacing any existing file.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::write(&path, fixture_csv())
            .with_context(|| format!("Failed to write fixture {}", path.display()))?;
        tracing::debug!(path = %path.display(), "fixture created");
        Ok(FixtureFile { path, removed: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now. Returns `false` when it was already gone.
    pub fn remove(mut self) -> io::Result<bool> {
        self.removed = true;
        remove_if_exists(&self.path)
    }
}

impl Drop for FixtureFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = remove_if_exists(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove fixture");
        }
    }
}

fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "fixture removed");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
