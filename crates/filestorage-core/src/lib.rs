use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Flat, filename-addressed store rooted at a single directory.
///
/// Clones share the lifetime upload counter, so one instance can be handed to
/// every request handler.
#[derive(Clone, Debug)]
pub struct FileStorage {
    root: PathBuf,
    stored_total: Arc<AtomicU64>,
}

/// Result of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub filename: String,
    pub size: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StorageMetrics {
    pub files_current: u64,
    pub files_stored_total: u64,
    pub total_storage_bytes: u64,
    pub total_storage_mb: f64,
}

impl FileStorage {
    pub async fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        info!(root = %root.display(), "storage directory ready");
        Ok(Self {
            root,
            stored_total: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of successful uploads since this store was opened.
    pub fn files_stored_total(&self) -> u64 {
        self.stored_total.load(Ordering::Relaxed)
    }

    /// Writes `data` under `filename`, replacing any existing file.
    ///
    /// The counter only moves once the write has landed; overwrites count.
    pub async fn put(&self, filename: &str, data: &[u8]) -> Result<StoredFile, StorageError> {
        let path = self.path_for(filename)?;
        fs::write(&path, data).await?;
        self.stored_total.fetch_add(1, Ordering::Relaxed);
        debug!(filename, size = data.len(), "stored file");
        Ok(StoredFile {
            filename: filename.to_string(),
            size: data.len() as u64,
        })
    }

    pub async fn get(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(filename)?;
        let not_found = || StorageError::NotFound(filename.to_string());

        match fs::symlink_metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(not_found()),
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(err) => return Err(StorageError::from(err)),
        }

        match fs::read(&path).await {
            Ok(bytes) => {
                debug!(filename, size = bytes.len(), "read file");
                Ok(bytes)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Err(not_found()),
            Err(err) => Err(StorageError::from(err)),
        }
    }

    /// Names of the regular files directly under the root, sorted.
    ///
    /// Names that are not valid UTF-8 are reported lossily.
    pub async fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut names: Vec<String> = self
            .scan()
            .await?
            .into_iter()
            .map(|(name, _)| name.to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Rescans the directory on every call; nothing is cached.
    pub async fn metrics(&self) -> Result<StorageMetrics, StorageError> {
        let entries = self.scan().await?;
        let total_storage_bytes: u64 = entries.iter().map(|(_, len)| len).sum();
        Ok(StorageMetrics {
            files_current: entries.len() as u64,
            files_stored_total: self.files_stored_total(),
            total_storage_bytes,
            total_storage_mb: bytes_to_mb(total_storage_bytes),
        })
    }

    /// Every regular file directly under the root with its length.
    async fn scan(&self) -> Result<Vec<(OsString, u64)>, StorageError> {
        let mut dir = fs::read_dir(&self.root).await?;
        let mut entries = Vec::new();

        while let Some(entry) = dir.next_entry().await? {
            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                // Removed between read_dir and stat.
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(StorageError::from(err)),
            };
            if meta.is_file() {
                entries.push((entry.file_name(), meta.len()));
            }
        }

        Ok(entries)
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf, StorageError> {
        validate_filename(filename)?;
        Ok(self.root.join(filename))
    }
}

/// Accepts only bare file names that cannot escape the storage directory.
pub fn validate_filename(filename: &str) -> Result<(), StorageError> {
    let reject = |reason: &str| StorageError::InvalidFilename(format!("`{filename}` {reason}"));

    if filename.is_empty() {
        return Err(reject("is empty"));
    }
    if filename == "." {
        return Err(reject("names the storage directory itself"));
    }
    if filename.contains('/') || filename.contains('\\') {
        return Err(reject("contains a path separator"));
    }
    if filename.contains("..") {
        return Err(reject("contains a parent-directory reference"));
    }
    if filename.contains('\0') {
        return Err(reject("contains a NUL byte"));
    }

    Ok(())
}

fn bytes_to_mb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid filename: {0}")]
    InvalidFilename(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}
