//! OS keyring key container.
//!
//! Stores each alias's key pair in the operating system's secure
//! credential store:
//! - macOS: Keychain
//! - Windows: Credential Manager
//! - Linux: kernel keyutils
//!
//! Only compiled with the `keyring-store` feature.

use zeroize::Zeroizing;

use super::container::KeyContainer;
use super::ProviderId;
use crate::errors::{Result, SecureStoreError};

/// Account name used to check that the keyring answers at all.
const PROBE_ACCOUNT: &str = "__sks_probe__";

/// Key pairs held in the OS keyring under a fixed service name.
pub struct KeyringKeyContainer {
    service: String,
}

impl KeyringKeyContainer {
    /// Connect to the OS keyring, failing if it cannot be reached.
    ///
    /// A lookup of a never-written account must come back as "no entry";
    /// anything else means the platform store is unusable.
    pub fn probe(service: &str) -> Result<Self> {
        let container = Self {
            service: service.to_string(),
        };
        match container.entry(PROBE_ACCOUNT)?.get_secret() {
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(container),
            Err(e) => Err(unavailable(format!("keyring did not answer: {e}"))),
        }
    }

    fn entry(&self, alias: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, alias)
            .map_err(|e| unavailable(format!("failed to create keyring entry: {e}")))
    }
}

fn unavailable(reason: String) -> SecureStoreError {
    SecureStoreError::ProviderUnavailable {
        provider: ProviderId::OsKeyring.to_string(),
        reason,
    }
}

impl KeyContainer for KeyringKeyContainer {
    fn load(&self, alias: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
        match self.entry(alias)?.get_secret() {
            Ok(secret) => Ok(Some(Zeroizing::new(secret))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(unavailable(format!("failed to read from keyring: {e}"))),
        }
    }

    fn store(&self, alias: &str, key_der: &[u8]) -> Result<()> {
        self.entry(alias)?
            .set_secret(key_der)
            .map_err(|e| unavailable(format!("failed to store key pair in keyring: {e}")))
    }

    fn delete(&self, alias: &str) -> Result<()> {
        match self.entry(alias)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Already gone, that's fine.
            Err(e) => Err(unavailable(format!("failed to delete from keyring: {e}"))),
        }
    }
}
