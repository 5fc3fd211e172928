//! Per-alias mutual exclusion.
//!
//! Operations on the same alias are serialized; operations on different
//! aliases only contend on the short critical section that looks up the
//! alias's mutex.
//!
//! `AliasLocks` covers threads of one process. `LockFiles` extends the
//! same exclusion to other processes sharing a store directory through
//! an advisory lock on one file per alias.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs4::fs_std::FileExt;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};

use crate::errors::{Result, SecureStoreError};
use crate::store::naming::encode_alias;

/// Prune idle entries once the table grows past this many aliases.
const PRUNE_THRESHOLD: usize = 1024;

/// Guard returned by [`AliasLocks::acquire`]; the alias is unlocked on drop.
pub type AliasGuard = ArcMutexGuard<RawMutex, ()>;

/// A table of lazily created per-alias mutexes.
#[derive(Default)]
pub struct AliasLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AliasLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `alias` is free, then hold it until the guard drops.
    pub fn acquire(&self, alias: &str) -> AliasGuard {
        let lock = {
            let mut table = self.table.lock();
            if table.len() >= PRUNE_THRESHOLD {
                // Only the table holds a reference to idle entries.
                table.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(table.entry(alias.to_string()).or_default())
        };
        lock.lock_arc()
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.table.lock().len()
    }
}

// ---------------------------------------------------------------------------
// Cross-process locks
// ---------------------------------------------------------------------------

/// A directory of per-alias lock files.
///
/// Lock files are never removed: deleting one while another process
/// waits on it would let a third process lock a fresh file and run
/// alongside the waiter.
pub struct LockFiles {
    dir: PathBuf,
}

/// Holds the advisory lock taken by [`LockFiles::acquire`]; closing the
/// file on drop releases it.
#[derive(Debug)]
pub struct LockFileGuard {
    _file: File,
}

impl LockFiles {
    /// Open (creating if needed) the lock directory.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| SecureStoreError::storage(dir.display().to_string(), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
                .map_err(|e| SecureStoreError::storage(dir.display().to_string(), e))?;
        }

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Block until no other holder of `alias`'s lock file remains.
    pub fn acquire(&self, alias: &str) -> Result<LockFileGuard> {
        let path = self.dir.join(format!("{}.lock", encode_alias(alias)));
        let key = path.display().to_string();

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let file = options
            .open(&path)
            .map_err(|e| SecureStoreError::storage(key.clone(), e))?;
        file.lock_exclusive()
            .map_err(|e| SecureStoreError::storage(key, e))?;
        Ok(LockFileGuard { _file: file })
    }
}
