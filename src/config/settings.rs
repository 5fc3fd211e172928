use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SecureStoreError};
use crate::provider::{ProviderContext, ProviderId};

/// Smallest RSA modulus we accept; OAEP-SHA256 needs room for a 32-byte key.
const MIN_RSA_KEY_BITS: usize = 1024;

/// Largest RSA modulus we accept.
const MAX_RSA_KEY_BITS: usize = 8192;

/// Store-level configuration, loaded from `<store_dir>/keystore.toml`.
///
/// Every field has a sensible default so the store works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Key providers to try, highest priority first.
    #[serde(default = "default_provider_order")]
    pub provider_order: Vec<ProviderId>,

    /// Modulus size for newly generated RSA key pairs.
    #[serde(default = "default_rsa_key_bits")]
    pub rsa_key_bits: usize,

    /// Largest single blob written before a payload is split into chunks.
    #[serde(default = "default_max_blob_len")]
    pub max_blob_len: usize,

    /// Extra attempts for transient I/O failures.
    #[serde(default = "default_io_retries")]
    pub io_retries: u32,

    /// Service name for entries in the OS keyring.
    #[serde(default = "default_keyring_service")]
    pub keyring_service: String,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_provider_order() -> Vec<ProviderId> {
    vec![ProviderId::OsKeyring, ProviderId::File]
}

fn default_rsa_key_bits() -> usize {
    2048
}

fn default_max_blob_len() -> usize {
    65_536 // 64 KiB
}

fn default_io_retries() -> u32 {
    2
}

fn default_keyring_service() -> String {
    "secure-keystore".to_string()
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider_order: default_provider_order(),
            rsa_key_bits: default_rsa_key_bits(),
            max_blob_len: default_max_blob_len(),
            io_retries: default_io_retries(),
            keyring_service: default_keyring_service(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the store directory.
    pub const FILE_NAME: &'static str = "keystore.toml";

    /// Load settings from `<store_dir>/keystore.toml`.
    ///
    /// If the file does not exist, defaults are returned. If it exists but
    /// cannot be parsed or holds out-of-range values, an error is returned.
    pub fn load(store_dir: &Path) -> Result<Self> {
        let config_path = store_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            SecureStoreError::Config(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate()?;
        tracing::debug!(path = %config_path.display(), "loaded settings");
        Ok(settings)
    }

    /// Reject settings the store cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.provider_order.is_empty() {
            return Err(SecureStoreError::Config(
                "provider_order must name at least one provider".into(),
            ));
        }
        if !(MIN_RSA_KEY_BITS..=MAX_RSA_KEY_BITS).contains(&self.rsa_key_bits) {
            return Err(SecureStoreError::Config(format!(
                "rsa_key_bits must be between {MIN_RSA_KEY_BITS} and {MAX_RSA_KEY_BITS} (got {})",
                self.rsa_key_bits
            )));
        }
        if self.max_blob_len == 0 {
            return Err(SecureStoreError::Config(
                "max_blob_len must be greater than zero".into(),
            ));
        }
        if self.keyring_service.is_empty() {
            return Err(SecureStoreError::Config(
                "keyring_service cannot be empty".into(),
            ));
        }
        Ok(())
    }

    /// Directory holding the blob files: `<store_dir>/blobs`.
    pub fn blob_dir(&self, store_dir: &Path) -> PathBuf {
        store_dir.join("blobs")
    }

    /// Directory holding file-container key pairs: `<store_dir>/keys`.
    pub fn key_dir(&self, store_dir: &Path) -> PathBuf {
        store_dir.join("keys")
    }

    /// Directory holding per-alias lock files: `<store_dir>/locks`.
    pub fn lock_dir(&self, store_dir: &Path) -> PathBuf {
        store_dir.join("locks")
    }

    /// Everything a provider needs to instantiate itself.
    pub fn provider_context(&self, store_dir: &Path) -> ProviderContext {
        ProviderContext {
            key_dir: self.key_dir(store_dir),
            rsa_key_bits: self.rsa_key_bits,
            keyring_service: self.keyring_service.clone(),
            io_retries: self.io_retries,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
