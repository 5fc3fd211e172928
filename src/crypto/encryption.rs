//! AES-256-GCM authenticated encryption of secret payloads.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it, behind a one-byte format tag, to the ciphertext. `decrypt`
//! splits both back out before decrypting.
//!
//! Layout of the returned byte buffer:
//!   [ 1-byte format | 12-byte nonce | ciphertext + 16-byte auth tag ]
//!
//! The caller's associated data (the alias) is authenticated but not
//! stored, so a payload only decrypts under the alias it was written for.

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use thiserror::Error;
use zeroize::Zeroizing;

/// Format tag of the current payload layout.
pub const FORMAT_V1: u8 = 0x01;

/// Size of the AES-256-GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
const TAG_LEN: usize = 16;

/// Why a payload could not be sealed or opened.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("invalid key length")]
    InvalidKey,

    #[error("payload is truncated")]
    Truncated,

    #[error("unsupported payload format {0:#04x}")]
    UnsupportedFormat(u8),

    #[error("authentication failed — payload corrupted or bound to another alias")]
    Authentication,

    #[error("cipher failure")]
    Cipher,
}

/// Encrypt `plaintext` with a 32-byte `key`, authenticating `aad`.
///
/// Returns `format || nonce || ciphertext`.
pub fn encrypt(key: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, PayloadError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| PayloadError::InvalidKey)?;

    // Generate a random 12-byte nonce.
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, Payload { msg: plaintext, aad })
        .map_err(|_| PayloadError::Cipher)?;

    let mut output = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
    output.push(FORMAT_V1);
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data that was produced by `encrypt` with the same `aad`.
pub fn decrypt(key: &[u8], sealed: &[u8], aad: &[u8]) -> Result<Zeroizing<Vec<u8>>, PayloadError> {
    let (&format, rest) = sealed.split_first().ok_or(PayloadError::Truncated)?;
    if format != FORMAT_V1 {
        return Err(PayloadError::UnsupportedFormat(format));
    }
    if rest.len() < NONCE_LEN + TAG_LEN {
        return Err(PayloadError::Truncated);
    }

    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| PayloadError::InvalidKey)?;

    cipher
        .decrypt(nonce, Payload { msg: ciphertext, aad })
        .map(Zeroizing::new)
        .map_err(|_| PayloadError::Authentication)
}
