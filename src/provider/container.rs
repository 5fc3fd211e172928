//! Where provider key pairs live.
//!
//! A `KeyContainer` persists one PKCS#8 DER private key per alias. The
//! bytes never leave the provider module; callers only ever see handles.

use std::collections::HashMap;
use std::path::Path;

use parking_lot::RwLock;
use zeroize::Zeroizing;

use crate::blob::{BlobStore, FileBlobStore};
use crate::errors::{Result, SecureStoreError};
use crate::store::naming::encode_alias;

/// Storage for serialized key pairs, addressed by alias.
pub trait KeyContainer: Send + Sync {
    /// Return the stored key pair for `alias`, or `None` if there is none.
    fn load(&self, alias: &str) -> Result<Option<Zeroizing<Vec<u8>>>>;

    /// Persist the key pair for `alias`.
    fn store(&self, alias: &str, key_der: &[u8]) -> Result<()>;

    /// Remove the key pair for `alias`; absent entries are not an error.
    fn delete(&self, alias: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// File container
// ---------------------------------------------------------------------------

/// Key pairs as owner-only files in a private directory.
///
/// This is the software fallback: the key material is protected by file
/// permissions only.
pub struct FileKeyContainer {
    files: FileBlobStore,
}

impl FileKeyContainer {
    /// Open (creating if needed) the container directory.
    pub fn open(dir: &Path, io_retries: u32) -> Result<Self> {
        Ok(Self {
            files: FileBlobStore::open(dir, io_retries)?,
        })
    }

    fn file_key(alias: &str) -> String {
        format!("{}.p8", encode_alias(alias))
    }
}

impl KeyContainer for FileKeyContainer {
    fn load(&self, alias: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
        match self.files.read(&Self::file_key(alias)) {
            Ok(bytes) => Ok(Some(Zeroizing::new(bytes))),
            Err(SecureStoreError::BlobNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn store(&self, alias: &str, key_der: &[u8]) -> Result<()> {
        self.files.write(&Self::file_key(alias), key_der)
    }

    fn delete(&self, alias: &str) -> Result<()> {
        self.files.delete(&Self::file_key(alias))
    }
}

// ---------------------------------------------------------------------------
// Memory container
// ---------------------------------------------------------------------------

/// Process-local key pairs; gone when the container is dropped.
#[derive(Default)]
pub struct MemoryKeyContainer {
    keys: RwLock<HashMap<String, Zeroizing<Vec<u8>>>>,
}

impl MemoryKeyContainer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyContainer for MemoryKeyContainer {
    fn load(&self, alias: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
        Ok(self.keys.read().get(alias).cloned())
    }

    fn store(&self, alias: &str, key_der: &[u8]) -> Result<()> {
        self.keys
            .write()
            .insert(alias.to_string(), Zeroizing::new(key_der.to_vec()));
        Ok(())
    }

    fn delete(&self, alias: &str) -> Result<()> {
        self.keys.write().remove(alias);
        Ok(())
    }
}
