//! Cryptographic primitives for the key store.
//!
//! This module provides:
//! - AES-256-GCM payload encryption and decryption (`encryption`)
//! - The zeroize-on-drop per-alias symmetric key (`keys`)
//! - Envelope encryption over a key provider (`envelope`)

pub mod encryption;
pub mod envelope;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{EnvelopeCipher, SymmetricKey};
pub use envelope::EnvelopeCipher;
pub use keys::SymmetricKey;
