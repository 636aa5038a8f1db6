/// Save targets: where finished archives end up

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::{Error, Result};

/// Accepts a finished blob under a suggested file name.
///
/// Returns a description of where the blob went (a path for file-backed
/// targets).
pub trait SaveTarget: Send + Sync {
    fn save(&self, file_name: String, blob: Vec<u8>) -> BoxFuture<'static, Result<String>>;
}

/// Writes blobs into a directory, creating it when missing
#[derive(Debug, Clone)]
pub struct DirectorySaveTarget {
    dir: PathBuf,
}

impl DirectorySaveTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SaveTarget for DirectorySaveTarget {
    fn save(&self, file_name: String, blob: Vec<u8>) -> BoxFuture<'static, Result<String>> {
        let dir = self.dir.clone();
        async move {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| Error::SaveError(format!("{}: {}", dir.display(), e)))?;
            let path = dir.join(&file_name);
            tokio::fs::write(&path, &blob)
                .await
                .map_err(|e| Error::SaveError(format!("{}: {}", path.display(), e)))?;
            Ok(path.display().to_string())
        }
        .boxed()
    }
}

/// A saved blob held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedBlob {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// In-memory target that keeps every saved blob; clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySaveTarget {
    saved: Arc<Mutex<Vec<SavedBlob>>>,
}

impl MemorySaveTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<SavedBlob> {
        self.saved.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl SaveTarget for MemorySaveTarget {
    fn save(&self, file_name: String, blob: Vec<u8>) -> BoxFuture<'static, Result<String>> {
        let saved = self.saved.clone();
        async move {
            let mut guard = saved
                .lock()
                .map_err(|e| Error::SaveError(format!("memory target poisoned: {}", e)))?;
            guard.push(SavedBlob {
                file_name: file_name.clone(),
                bytes: blob,
            });
            Ok(format!("memory://{}", file_name))
        }
        .boxed()
    }
}
