//! Filesystem-backed blob store.
//!
//! Each blob is one file directly under the store's root directory, named
//! after its key. The root is created owner-only (0700) and blob files are
//! owner-only (0600) on Unix.
//!
//! Writes are atomic: bytes go to a hidden temp file in the same directory,
//! which is fsynced and then renamed over the target, so a reader never
//! sees a half-written blob.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use super::BlobStore;
use crate::errors::{Result, SecureStoreError};

/// Pause between attempts after a transient I/O failure.
const RETRY_BACKOFF: Duration = Duration::from_millis(20);

/// A `BlobStore` rooted at a private directory.
pub struct FileBlobStore {
    root: PathBuf,
    io_retries: u32,
}

impl FileBlobStore {
    /// Open (creating if needed) a blob store rooted at `root`.
    pub fn open(root: &Path, io_retries: u32) -> Result<Self> {
        fs::create_dir_all(root).map_err(|e| SecureStoreError::storage(root.display().to_string(), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o700);
            fs::set_permissions(root, perms)
                .map_err(|e| SecureStoreError::storage(root.display().to_string(), e))?;
        }

        Ok(Self {
            root: root.to_path_buf(),
            io_retries,
        })
    }

    /// The directory blobs are stored in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to its file path, rejecting keys that could escape
    /// the root or clash with temp files.
    fn blob_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    /// Run `op`, retrying a bounded number of times on transient failures.
    fn with_retries<T>(&self, key: &str, mut op: impl FnMut() -> io::Result<T>) -> Result<T> {
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) && attempt < self.io_retries => {
                    attempt += 1;
                    tracing::warn!(key, attempt, error = %e, "transient blob I/O failure, retrying");
                    thread::sleep(RETRY_BACKOFF * attempt);
                }
                Err(e) => return Err(SecureStoreError::storage(key, e)),
            }
        }
    }
}

/// Blob keys may only use `[A-Za-z0-9._-]`, must be non-empty, and must not
/// start with `.` (reserved for temp files).
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(SecureStoreError::Validation("blob key cannot be empty".into()));
    }
    if key.starts_with('.') {
        return Err(SecureStoreError::Validation(format!(
            "blob key '{key}' cannot start with a period"
        )));
    }
    if !key
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
    {
        return Err(SecureStoreError::Validation(format!(
            "blob key '{key}' contains invalid characters"
        )));
    }
    Ok(())
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

fn write_atomic(path: &Path, tmp_path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(tmp_path, path)
}

impl BlobStore for FileBlobStore {
    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.blob_path(key)?;
        let tmp_path = self
            .root
            .join(format!(".{key}.{}.tmp", std::process::id()));

        tracing::debug!(key, len = bytes.len(), "writing blob");
        let result = self.with_retries(key, || write_atomic(&path, &tmp_path, bytes));
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }

    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(key)?;
        match self.with_retries(key, || fs::read(&path)) {
            Err(SecureStoreError::Storage { source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                Err(SecureStoreError::BlobNotFound {
                    key: key.to_string(),
                })
            }
            other => other,
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let path = self.blob_path(key)?;
        self.with_retries(key, || path.try_exists())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.blob_path(key)?;
        let removed = self.with_retries(key, || match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        })?;
        if removed {
            tracing::debug!(key, "deleted blob");
        }
        Ok(())
    }
}
