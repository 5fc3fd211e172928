//! Asymmetric key providers.
//!
//! A provider owns one RSA key pair per alias inside some protected
//! container and performs the public/private operations on behalf of the
//! envelope cipher. The private key never leaves the provider: callers get
//! an opaque `PrivateKeyHandle` they can only hand back to `decrypt`.
//!
//! Which container backs the provider is chosen once, from an ordered list
//! of `ProviderId`s; the first one that can be instantiated wins.

pub mod container;
#[cfg(feature = "keyring-store")]
pub mod keyring;
pub mod rsa_provider;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use ::rsa::pkcs8::EncodePublicKey;
use ::rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::errors::{CryptoOp, Result, SecureStoreError};

pub use container::{FileKeyContainer, KeyContainer, MemoryKeyContainer};
pub use rsa_provider::RsaKeyProvider;

/// Named key containers, in the order they are usually preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    /// The operating system's credential store.
    OsKeyring,
    /// Owner-only files in the store's `keys/` directory.
    File,
    /// Process memory; keys vanish on exit.
    Memory,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [ProviderId::OsKeyring, ProviderId::File, ProviderId::Memory];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::OsKeyring => "os-keyring",
            ProviderId::File => "file",
            ProviderId::Memory => "memory",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = SecureStoreError;

    fn from_str(s: &str) -> Result<Self> {
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| {
                SecureStoreError::Config(format!(
                    "unknown key provider '{s}' — supported: os-keyring, file, memory"
                ))
            })
    }
}

/// A public key bound to the alias it belongs to.
#[derive(Clone)]
pub struct PublicKeyHandle {
    alias: String,
    key: RsaPublicKey,
}

impl PublicKeyHandle {
    pub(crate) fn new(alias: &str, key: RsaPublicKey) -> Self {
        Self {
            alias: alias.to_string(),
            key,
        }
    }

    /// DER-encoded SubjectPublicKeyInfo, e.g. to compare key identity.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.key
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| SecureStoreError::crypto(CryptoOp::LoadKeyPair, &self.alias, e.to_string()))
    }
}

impl fmt::Debug for PublicKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyHandle")
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}

/// An opaque private key. Zeroized on drop; the key bytes are not exposed.
pub struct PrivateKeyHandle {
    alias: String,
    key: RsaPrivateKey,
}

impl PrivateKeyHandle {
    pub(crate) fn new(alias: &str, key: RsaPrivateKey) -> Self {
        Self {
            alias: alias.to_string(),
            key,
        }
    }
}

impl fmt::Debug for PrivateKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyHandle")
            .field("alias", &self.alias)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// The capabilities the envelope cipher needs from a key container.
pub trait KeyProvider: Send + Sync {
    /// Which container backs this provider.
    fn id(&self) -> ProviderId;

    /// Return the public key for `alias`, generating a key pair first if
    /// none exists. An existing pair is never replaced.
    fn get_or_create_public_key(&self, alias: &str) -> Result<PublicKeyHandle>;

    /// Return the private key for `alias`; `KeyNotFound` if there is none.
    fn get_private_key(&self, alias: &str) -> Result<PrivateKeyHandle>;

    /// Encrypt a short message (a symmetric key) under `key`.
    fn encrypt(&self, key: &PublicKeyHandle, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt a message produced by `encrypt` with the matching public key.
    fn decrypt(&self, key: &PrivateKeyHandle, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// Destroy the key pair for `alias`. Only ever done on explicit request.
    fn delete_key_pair(&self, alias: &str) -> Result<()>;
}

/// What a provider needs to come up.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    /// Directory for the `file` container.
    pub key_dir: PathBuf,
    /// Modulus size for new key pairs.
    pub rsa_key_bits: usize,
    /// Service name for the `os-keyring` container.
    pub keyring_service: String,
    /// Extra attempts for transient I/O in the `file` container.
    pub io_retries: u32,
}

/// Build the provider named by `id`, failing if its container is unusable.
pub fn instantiate(id: ProviderId, ctx: &ProviderContext) -> Result<Arc<dyn KeyProvider>> {
    let container: Box<dyn KeyContainer> = match id {
        ProviderId::OsKeyring => open_keyring(ctx)?,
        ProviderId::File => Box::new(FileKeyContainer::open(&ctx.key_dir, ctx.io_retries)?),
        ProviderId::Memory => Box::new(MemoryKeyContainer::new()),
    };
    Ok(Arc::new(RsaKeyProvider::new(id, container, ctx.rsa_key_bits)))
}

#[cfg(feature = "keyring-store")]
fn open_keyring(ctx: &ProviderContext) -> Result<Box<dyn KeyContainer>> {
    Ok(Box::new(keyring::KeyringKeyContainer::probe(
        &ctx.keyring_service,
    )?))
}

#[cfg(not(feature = "keyring-store"))]
fn open_keyring(_ctx: &ProviderContext) -> Result<Box<dyn KeyContainer>> {
    Err(SecureStoreError::ProviderUnavailable {
        provider: ProviderId::OsKeyring.to_string(),
        reason: "built without the keyring-store feature".into(),
    })
}

/// Check whether the provider named by `id` could be used right now.
pub fn probe(id: ProviderId, ctx: &ProviderContext) -> Result<()> {
    instantiate(id, ctx).map(|_| ())
}

/// Instantiate the first usable provider from `order`.
///
/// Called once when a store is opened; the result is owned by the store
/// for its whole lifetime.
pub fn resolve_provider(order: &[ProviderId], ctx: &ProviderContext) -> Result<Arc<dyn KeyProvider>> {
    for id in order {
        match instantiate(*id, ctx) {
            Ok(provider) => {
                tracing::info!(provider = %id, "selected key provider");
                return Ok(provider);
            }
            Err(e) => {
                tracing::debug!(provider = %id, error = %e, "key provider unavailable, trying next");
            }
        }
    }

    let tried: Vec<&str> = order.iter().map(|id| id.as_str()).collect();
    Err(SecureStoreError::NoProviderAvailable(tried.join(", ")))
}
