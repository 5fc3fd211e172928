//! The per-alias symmetric key.

use std::fmt;

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the symmetric key in bytes (256 bits, for AES-256).
pub const SYMMETRIC_KEY_LEN: usize = 32;

/// A 32-byte AES key that zeroes its memory when dropped.
///
/// Only ever lives in memory; what gets persisted is its wrapped form.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; SYMMETRIC_KEY_LEN],
}

impl SymmetricKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SYMMETRIC_KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Rebuild a key from unwrapped bytes; `None` if the length is wrong.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; SYMMETRIC_KEY_LEN] = bytes.try_into().ok()?;
        Some(Self { bytes })
    }

    /// Access the raw key bytes (e.g. to pass to the cipher or to wrap).
    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}
