use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::Config;
use crate::error::DocResult;
use crate::paths;
use crate::session::{DocumentSession, OpenMode};
use crate::tracker::ConversionTracker;

/// One mutex per resolved document path, created on first use.
#[derive(Debug, Default)]
pub struct PathLocks {
    table: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(table.entry(path.to_path_buf()).or_default())
    }
}

/// State shared by every tool call for the lifetime of the server.
#[derive(Debug)]
pub struct ServerState {
    base_dir: PathBuf,
    pub tracker: ConversionTracker,
    locks: PathLocks,
}

impl ServerState {
    pub fn new(config: Config) -> Self {
        Self {
            base_dir: config.base_dir,
            tracker: ConversionTracker::new(),
            locks: PathLocks::default(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn resolve(&self, name: &str) -> DocResult<PathBuf> {
        paths::resolve(name, Some(&self.base_dir))
    }

    /// Opens `path` read-only for the duration of `f`. Saves replace files
    /// atomically, so readers never need the path lock.
    pub fn read<T>(
        &self,
        path: &Path,
        f: impl FnOnce(&DocumentSession) -> DocResult<T>,
    ) -> DocResult<T> {
        let session = DocumentSession::open(path, OpenMode::Existing)?;
        f(&session)
    }

    /// Runs open, `f` and save as one unit under the path lock. Nothing is
    /// written when `f` fails.
    pub fn mutate<T>(
        &self,
        path: &Path,
        f: impl FnOnce(&mut DocumentSession) -> DocResult<T>,
    ) -> DocResult<T> {
        self.exclusive(path, || {
            let mut session = DocumentSession::open(path, OpenMode::Existing)?;
            let value = f(&mut session)?;
            session.save()?;
            Ok(value)
        })
    }

    /// Holds the lock for `path` while `f` runs.
    pub fn exclusive<T>(&self, path: &Path, f: impl FnOnce() -> DocResult<T>) -> DocResult<T> {
        let lock = self.locks.lock_for(path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}
