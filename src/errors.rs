use std::fmt;

use thiserror::Error;

/// Which cryptographic step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoOp {
    GenerateKeyPair,
    LoadKeyPair,
    WrapKey,
    UnwrapKey,
    EncryptPayload,
    DecryptPayload,
}

impl fmt::Display for CryptoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CryptoOp::GenerateKeyPair => "generate key pair",
            CryptoOp::LoadKeyPair => "load key pair",
            CryptoOp::WrapKey => "wrap key",
            CryptoOp::UnwrapKey => "unwrap key",
            CryptoOp::EncryptPayload => "encrypt payload",
            CryptoOp::DecryptPayload => "decrypt payload",
        };
        f.write_str(name)
    }
}

/// All errors that can occur in the secure key store.
#[derive(Debug, Error)]
pub enum SecureStoreError {
    // --- Caller errors ---
    #[error("Invalid input: {0}")]
    Validation(String),

    // --- Absence ---
    #[error("No secret stored under alias '{alias}'")]
    NotFound { alias: String },

    #[error("Blob '{key}' not found")]
    BlobNotFound { key: String },

    #[error("No key pair for alias '{alias}' in the key provider")]
    KeyNotFound { alias: String },

    // --- Crypto errors ---
    #[error("Failed to {op} for alias '{alias}': {reason}")]
    Crypto {
        op: CryptoOp,
        alias: String,
        reason: String,
    },

    #[error("Key provider '{provider}' is unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("No key provider available (tried: {0})")]
    NoProviderAvailable(String),

    // --- Storage errors ---
    #[error("Storage error on '{key}': {source}")]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Blob '{key}' is corrupt: {reason}")]
    CorruptBlob { key: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Config errors ---
    #[error("Config error: {0}")]
    Config(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

/// The error taxonomy callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Crypto,
    Storage,
    Config,
}

impl ErrorKind {
    /// Process exit code used by the `sks` binary.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::NotFound => 2,
            ErrorKind::Validation => 64,
            ErrorKind::Config => 78,
            ErrorKind::Crypto | ErrorKind::Storage => 1,
        }
    }
}

impl SecureStoreError {
    /// Collapse this error onto the public taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SecureStoreError::Validation(_) | SecureStoreError::CommandFailed(_) => {
                ErrorKind::Validation
            }
            SecureStoreError::NotFound { .. }
            | SecureStoreError::BlobNotFound { .. }
            | SecureStoreError::KeyNotFound { .. } => ErrorKind::NotFound,
            SecureStoreError::Crypto { .. }
            | SecureStoreError::ProviderUnavailable { .. }
            | SecureStoreError::NoProviderAvailable(_) => ErrorKind::Crypto,
            SecureStoreError::Storage { .. }
            | SecureStoreError::CorruptBlob { .. }
            | SecureStoreError::Io(_) => ErrorKind::Storage,
            SecureStoreError::Config(_) => ErrorKind::Config,
        }
    }

    /// Shorthand for building a `Crypto` error.
    pub fn crypto(op: CryptoOp, alias: &str, reason: impl Into<String>) -> Self {
        SecureStoreError::Crypto {
            op,
            alias: alias.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for wrapping an I/O failure on a blob or key file.
    pub fn storage(key: impl Into<String>, source: std::io::Error) -> Self {
        SecureStoreError::Storage {
            key: key.into(),
            source,
        }
    }
}

/// Convenience type alias for key store results.
pub type Result<T> = std::result::Result<T, SecureStoreError>;
