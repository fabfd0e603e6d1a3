use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create store directory {0}: {1}")]
    CreateDir(PathBuf, io::Error),

    #[error("Failed to write {0}: {1}")]
    Write(PathBuf, io::Error),
}

/// A single named slot of persisted text. No schema: callers parse.
pub trait PreferenceStore: Send + Sync {
    fn get(&self) -> Option<String>;

    fn set(&self, text: &str) -> Result<(), StoreError>;
}

/// Keeps the slot as `<dir>/<key>.json`.
pub struct FileStore {
    dir: PathBuf,
    path: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let path = dir.join(format!("{}.json", key));
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FileStore {
    fn get(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No stored preferences at {}", self.path.display());
                None
            }
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, text: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::CreateDir(self.dir.clone(), e))?;

        // Write then rename so a reader never sees a torn file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(|e| StoreError::Write(tmp.clone(), e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::Write(self.path.clone(), e))
    }
}

#[cfg(test)]
pub use memory::MemoryStore;
