//! RSA key provider.
//!
//! Key pairs are generated in-process, serialized as PKCS#8 DER and handed
//! to a `KeyContainer`; from then on they are loaded from the container on
//! every use. Wrapping uses RSA-OAEP with SHA-256.
//!
//! Get-or-create holds a per-alias lock across the load/generate/store
//! sequence so two first-time callers in this process can never both
//! generate a key pair for the same alias. Across processes the same
//! guarantee comes from the lock file `SecretStore` holds around every
//! alias operation.

use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::rand_core::OsRng;
use rsa::{Oaep, RsaPrivateKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::container::KeyContainer;
use super::{KeyProvider, PrivateKeyHandle, ProviderId, PublicKeyHandle};
use crate::errors::{CryptoOp, Result, SecureStoreError};
use crate::locks::AliasLocks;

/// A `KeyProvider` doing RSA-OAEP over key pairs kept in a `KeyContainer`.
pub struct RsaKeyProvider {
    id: ProviderId,
    container: Box<dyn KeyContainer>,
    key_bits: usize,
    locks: AliasLocks,
}

impl RsaKeyProvider {
    pub fn new(id: ProviderId, container: Box<dyn KeyContainer>, key_bits: usize) -> Self {
        Self {
            id,
            container,
            key_bits,
            locks: AliasLocks::new(),
        }
    }

    fn load_private(&self, alias: &str) -> Result<Option<RsaPrivateKey>> {
        let Some(der) = self.container.load(alias)? else {
            return Ok(None);
        };
        RsaPrivateKey::from_pkcs8_der(&der)
            .map(Some)
            .map_err(|e| {
                SecureStoreError::crypto(
                    CryptoOp::LoadKeyPair,
                    alias,
                    format!("stored key pair is unreadable: {e}"),
                )
            })
    }

    fn generate(&self, alias: &str) -> Result<RsaPrivateKey> {
        let key = RsaPrivateKey::new(&mut OsRng, self.key_bits)
            .map_err(|e| SecureStoreError::crypto(CryptoOp::GenerateKeyPair, alias, e.to_string()))?;
        let der = key
            .to_pkcs8_der()
            .map_err(|e| SecureStoreError::crypto(CryptoOp::GenerateKeyPair, alias, e.to_string()))?;
        self.container.store(alias, der.as_bytes())?;
        Ok(key)
    }
}

impl KeyProvider for RsaKeyProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn get_or_create_public_key(&self, alias: &str) -> Result<PublicKeyHandle> {
        let _guard = self.locks.acquire(alias);

        if let Some(private) = self.load_private(alias)? {
            return Ok(PublicKeyHandle::new(alias, private.to_public_key()));
        }

        tracing::info!(alias, provider = %self.id, "no existing key pair for alias");
        let private = self.generate(alias)?;
        tracing::info!(alias, provider = %self.id, bits = self.key_bits, "created new key pair for alias");

        Ok(PublicKeyHandle::new(alias, private.to_public_key()))
    }

    fn get_private_key(&self, alias: &str) -> Result<PrivateKeyHandle> {
        let _guard = self.locks.acquire(alias);
        match self.load_private(alias)? {
            Some(private) => Ok(PrivateKeyHandle::new(alias, private)),
            None => Err(SecureStoreError::KeyNotFound {
                alias: alias.to_string(),
            }),
        }
    }

    fn encrypt(&self, key: &PublicKeyHandle, plaintext: &[u8]) -> Result<Vec<u8>> {
        key.key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
            .map_err(|e| SecureStoreError::crypto(CryptoOp::WrapKey, &key.alias, e.to_string()))
    }

    fn decrypt(&self, key: &PrivateKeyHandle, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        key.key
            .decrypt(Oaep::new::<Sha256>(), ciphertext)
            .map(Zeroizing::new)
            .map_err(|e| SecureStoreError::crypto(CryptoOp::UnwrapKey, &key.alias, e.to_string()))
    }

    fn delete_key_pair(&self, alias: &str) -> Result<()> {
        let _guard = self.locks.acquire(alias);
        self.container.delete(alias)?;
        tracing::warn!(alias, provider = %self.id, "deleted key pair; data wrapped under it is now unrecoverable");
        Ok(())
    }
}
