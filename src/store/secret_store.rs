//! High-level secret operations.
//!
//! `SecretStore` is the only type most callers need:
//! `store.set("db-password", b"hunter2")`, `store.get("db-password")`,
//! `store.remove("db-password")`.
//!
//! Per alias the store keeps two blob families (see `naming`):
//! the wrapped symmetric key and the encrypted, possibly chunked, payload.
//! All operations on one alias are serialized; different aliases proceed
//! in parallel. A store opened from a directory also serializes against
//! other processes using the same directory.

use std::path::Path;
use std::sync::Arc;

use zeroize::Zeroizing;

use super::naming;
use crate::blob::{BlobStore, ChunkLayout, ChunkedBlobs, FileBlobStore};
use crate::config::Settings;
use crate::crypto::{EnvelopeCipher, SymmetricKey};
use crate::errors::{CryptoOp, ErrorKind, Result, SecureStoreError};
use crate::locks::{AliasGuard, AliasLocks, LockFileGuard, LockFiles};
use crate::provider::{self, KeyProvider, ProviderId};

/// Longest accepted alias, in bytes. Keeps the longest derived blob file
/// name well under the usual 255-byte limit.
pub const MAX_ALIAS_LEN: usize = 128;

/// Encrypted key/value store over a blob store and a key provider.
pub struct SecretStore {
    blobs: Arc<dyn BlobStore>,
    cipher: EnvelopeCipher,
    max_blob_len: usize,
    locks: AliasLocks,
    lock_files: Option<LockFiles>,
}

/// Exclusive hold on one alias. Field order releases the lock file before
/// the in-process mutex.
struct AliasHold {
    _file: Option<LockFileGuard>,
    _thread: AliasGuard,
}

impl SecretStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Build a store from its parts. `max_blob_len` is the largest blob
    /// written before a payload is chunked.
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        provider: Arc<dyn KeyProvider>,
        max_blob_len: usize,
    ) -> Result<Self> {
        if max_blob_len == 0 {
            return Err(SecureStoreError::Config(
                "max_blob_len must be greater than zero".into(),
            ));
        }
        Ok(Self {
            blobs,
            cipher: EnvelopeCipher::new(provider),
            max_blob_len,
            locks: AliasLocks::new(),
            lock_files: None,
        })
    }

    /// Open the on-disk store rooted at `store_dir`.
    ///
    /// Creates `blobs/` and `locks/` if needed and resolves the key
    /// provider from `settings.provider_order`. The provider stays fixed
    /// for the lifetime of the returned store.
    pub fn open(store_dir: &Path, settings: &Settings) -> Result<Self> {
        settings.validate()?;

        let blobs = FileBlobStore::open(&settings.blob_dir(store_dir), settings.io_retries)?;
        let lock_files = LockFiles::open(&settings.lock_dir(store_dir))?;
        let provider = provider::resolve_provider(
            &settings.provider_order,
            &settings.provider_context(store_dir),
        )?;

        tracing::debug!(
            store_dir = %store_dir.display(),
            provider = %provider.id(),
            "opened secret store"
        );
        let mut store = Self::new(Arc::new(blobs), provider, settings.max_blob_len)?;
        store.lock_files = Some(lock_files);
        Ok(store)
    }

    /// The key provider this store was opened with.
    pub fn provider_id(&self) -> ProviderId {
        self.cipher.provider_id()
    }

    // ------------------------------------------------------------------
    // Secret operations
    // ------------------------------------------------------------------

    /// Encrypt and persist `plaintext` under `alias`, replacing any
    /// previous value.
    ///
    /// An alias that already has a wrapped key keeps its symmetric key;
    /// if that key cannot be unwrapped the call fails instead of
    /// generating a new one.
    pub fn set(&self, alias: &str, plaintext: &[u8]) -> Result<()> {
        validate_alias(alias)?;
        let _hold = self.hold(alias)?;

        let key_blob = naming::key_blob(alias);
        let data_blob = naming::data_blob(alias);

        let (key, new_wrapped) = self.symmetric_key_for_set(alias, &key_blob)?;
        let sealed = self.cipher.encrypt_payload(alias, &key, plaintext)?;

        // Payload before key: a crash in between leaves the alias unset
        // rather than pointing at a payload it cannot decrypt.
        let layout = self.chunked()?.write(&data_blob, &sealed)?;
        if let Some(wrapped) = new_wrapped {
            self.blobs.write(&key_blob, &wrapped)?;
        }

        tracing::debug!(alias, len = plaintext.len(), ?layout, "stored secret");
        Ok(())
    }

    /// Decrypt and return the secret stored under `alias`.
    ///
    /// Fails with `NotFound` if the alias was never set (or was removed).
    pub fn get(&self, alias: &str) -> Result<Zeroizing<Vec<u8>>> {
        validate_alias(alias)?;
        let _hold = self.hold(alias)?;

        let wrapped = self
            .blobs
            .read(&naming::key_blob(alias))
            .map_err(|e| not_found(alias, e))?;
        let sealed = self
            .chunked()?
            .read(&naming::data_blob(alias))
            .map_err(|e| not_found(alias, e))?;

        let key = self
            .cipher
            .unwrap_symmetric_key(alias, &wrapped)
            .map_err(|e| not_found(alias, e))?;
        let plaintext = self.cipher.decrypt_payload(alias, &key, &sealed)?;

        tracing::debug!(alias, len = plaintext.len(), "read secret");
        Ok(plaintext)
    }

    /// Delete the wrapped key and the payload for `alias`.
    ///
    /// Removing an alias that is not set is not an error. The key pair in
    /// the provider is kept; see `purge`.
    pub fn remove(&self, alias: &str) -> Result<()> {
        validate_alias(alias)?;
        let _hold = self.hold(alias)?;
        self.remove_blobs(alias)
    }

    /// `remove`, then destroy the alias's key pair in the provider.
    pub fn purge(&self, alias: &str) -> Result<()> {
        validate_alias(alias)?;
        let _hold = self.hold(alias)?;
        self.remove_blobs(alias)?;
        self.cipher.delete_key_pair(alias)
    }

    /// Whether `alias` currently has both a wrapped key and a payload.
    /// Does not touch any key material.
    pub fn contains(&self, alias: &str) -> Result<bool> {
        validate_alias(alias)?;
        let _hold = self.hold(alias)?;

        if !self.blobs.exists(&naming::key_blob(alias))? {
            return Ok(false);
        }
        let layout = self.chunked()?.layout(&naming::data_blob(alias))?;
        Ok(layout != ChunkLayout::Absent)
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    /// Take `alias` away from other threads, then from other processes.
    fn hold(&self, alias: &str) -> Result<AliasHold> {
        let thread = self.locks.acquire(alias);
        let file = match &self.lock_files {
            Some(lock_files) => Some(lock_files.acquire(alias)?),
            None => None,
        };
        Ok(AliasHold {
            _file: file,
            _thread: thread,
        })
    }

    fn chunked(&self) -> Result<ChunkedBlobs<'_>> {
        ChunkedBlobs::new(self.blobs.as_ref(), self.max_blob_len)
    }

    /// The key to encrypt with, plus its wrapped form if it is new and
    /// still has to be persisted.
    fn symmetric_key_for_set(
        &self,
        alias: &str,
        key_blob: &str,
    ) -> Result<(SymmetricKey, Option<Vec<u8>>)> {
        match self.blobs.read(key_blob) {
            Ok(wrapped) => {
                let key = self
                    .cipher
                    .unwrap_symmetric_key(alias, &wrapped)
                    .map_err(|e| match e {
                        SecureStoreError::KeyNotFound { .. } => SecureStoreError::crypto(
                            CryptoOp::UnwrapKey,
                            alias,
                            "a wrapped key exists but its key pair is gone from the provider",
                        ),
                        other => other,
                    })?;
                tracing::debug!(alias, "reusing existing symmetric key");
                Ok((key, None))
            }
            Err(SecureStoreError::BlobNotFound { .. }) => {
                let (key, wrapped) = self.cipher.wrap_new_symmetric_key(alias)?;
                Ok((key, Some(wrapped)))
            }
            Err(e) => Err(e),
        }
    }

    /// Key first: once it is gone the alias reads as unset, whatever
    /// happens to the payload deletion.
    fn remove_blobs(&self, alias: &str) -> Result<()> {
        self.blobs.delete(&naming::key_blob(alias))?;
        self.chunked()?.delete(&naming::data_blob(alias))?;
        tracing::debug!(alias, "removed secret");
        Ok(())
    }
}

/// Aliases must be non-empty and at most `MAX_ALIAS_LEN` bytes.
fn validate_alias(alias: &str) -> Result<()> {
    if alias.is_empty() {
        return Err(SecureStoreError::Validation("alias cannot be empty".into()));
    }
    if alias.len() > MAX_ALIAS_LEN {
        return Err(SecureStoreError::Validation(format!(
            "alias is {} bytes long, the maximum is {MAX_ALIAS_LEN}",
            alias.len()
        )));
    }
    Ok(())
}

/// Collapse every flavour of "missing" onto `NotFound { alias }`.
fn not_found(alias: &str, err: SecureStoreError) -> SecureStoreError {
    if err.kind() == ErrorKind::NotFound {
        SecureStoreError::NotFound {
            alias: alias.to_string(),
        }
    } else {
        err
    }
}
