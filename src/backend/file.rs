//! JSON file backend
//!
//! The state lives in a single JSON document. A sibling `<state>.lock` file is
//! created exclusively on `load` and removed on `close` or drop, so a second
//! run against the same state file fails fast with `BackendLocked`.

use super::{Backend, BackendState};
use crate::error::{Result, TopologyError};

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    lock_path: PathBuf,
    lock: Option<File>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = sibling_with_suffix(&path, ".lock");
        Self {
            path,
            lock_path,
            lock: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    fn acquire(&mut self) -> Result<()> {
        if self.lock.is_some() {
            return Ok(());
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
        {
            Ok(mut file) => {
                writeln!(file, "{}", std::process::id())?;
                self.lock = Some(file);
                debug!(path = %self.lock_path.display(), "Acquired state lock");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(TopologyError::BackendLocked(self.lock_path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn release(&mut self) -> Result<()> {
        if let Some(file) = self.lock.take() {
            drop(file);
            match fs::remove_file(&self.lock_path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            debug!(path = %self.lock_path.display(), "Released state lock");
        }
        Ok(())
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

impl Backend for FileBackend {
    fn load(&mut self) -> Result<Option<BackendState>> {
        self.acquire()?;

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let state: BackendState = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    fn save(&mut self, state: &BackendState) -> Result<()> {
        self.acquire()?;

        let bytes = serde_json::to_vec_pretty(state)?;
        let temp_file = sibling_with_suffix(&self.path, ".tmp");

        // Write to temp file first, then rename for atomicity
        fs::write(&temp_file, bytes)?;
        fs::rename(&temp_file, &self.path)?;

        debug!(
            path = %self.path.display(),
            count = state.bindings.len(),
            "Saved state file"
        );
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.release()
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(path = %self.lock_path.display(), error = %e, "Failed to release state lock");
        }
    }
}
