//! Envelope encryption.
//!
//! Each alias gets its own random 256-bit symmetric key. That key encrypts
//! the payload (AES-256-GCM) and is itself stored only in wrapped form:
//! encrypted under the alias's RSA public key by the key provider.

use std::sync::Arc;

use super::encryption;
use super::keys::{SymmetricKey, SYMMETRIC_KEY_LEN};
use crate::errors::{CryptoOp, Result, SecureStoreError};
use crate::provider::{KeyProvider, ProviderId};

/// Wraps symmetric keys with a key provider and seals payloads with them.
#[derive(Clone)]
pub struct EnvelopeCipher {
    provider: Arc<dyn KeyProvider>,
}

impl EnvelopeCipher {
    pub fn new(provider: Arc<dyn KeyProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_id(&self) -> ProviderId {
        self.provider.id()
    }

    /// Generate a fresh symmetric key and return it with its wrapped form.
    pub fn wrap_new_symmetric_key(&self, alias: &str) -> Result<(SymmetricKey, Vec<u8>)> {
        let key = SymmetricKey::generate();
        let public = self.provider.get_or_create_public_key(alias)?;
        let wrapped = self.provider.encrypt(&public, key.as_bytes())?;
        tracing::debug!(alias, wrapped_len = wrapped.len(), "wrapped new symmetric key");
        Ok((key, wrapped))
    }

    /// Recover the symmetric key from its wrapped form.
    ///
    /// A missing key pair is reported as `KeyNotFound`; anything that
    /// unwraps to the wrong length is treated as tampering.
    pub fn unwrap_symmetric_key(&self, alias: &str, wrapped: &[u8]) -> Result<SymmetricKey> {
        let private = self.provider.get_private_key(alias)?;
        let raw = self.provider.decrypt(&private, wrapped)?;
        SymmetricKey::from_slice(&raw).ok_or_else(|| {
            SecureStoreError::crypto(
                CryptoOp::UnwrapKey,
                alias,
                format!(
                    "unwrapped key is {} bytes, expected {SYMMETRIC_KEY_LEN}",
                    raw.len()
                ),
            )
        })
    }

    /// Encrypt `plaintext` for `alias`. The result is bound to the alias.
    pub fn encrypt_payload(
        &self,
        alias: &str,
        key: &SymmetricKey,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        encryption::encrypt(key.as_bytes(), plaintext, alias.as_bytes())
            .map_err(|e| SecureStoreError::crypto(CryptoOp::EncryptPayload, alias, e.to_string()))
    }

    /// Decrypt a payload written by `encrypt_payload` for the same alias.
    pub fn decrypt_payload(
        &self,
        alias: &str,
        key: &SymmetricKey,
        sealed: &[u8],
    ) -> Result<zeroize::Zeroizing<Vec<u8>>> {
        encryption::decrypt(key.as_bytes(), sealed, alias.as_bytes())
            .map_err(|e| SecureStoreError::crypto(CryptoOp::DecryptPayload, alias, e.to_string()))
    }

    /// Destroy the alias's key pair in the provider.
    pub fn delete_key_pair(&self, alias: &str) -> Result<()> {
        self.provider.delete_key_pair(alias)
    }
}
