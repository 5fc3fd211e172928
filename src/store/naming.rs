//! Storage-key naming.
//!
//! Every alias owns two disjoint blob-key families:
//!
//! ```text
//! SKS_KEY_<alias>    wrapped symmetric key
//! SKS_DATA_<alias>   encrypted payload (plus .N chunks / .chunk_count)
//! ```
//!
//! The alias is written in unpadded url-safe base64. That alphabet has no
//! `.` or `/`, so an alias can neither escape the blob directory nor collide
//! with another alias's chunk keys (`"a.0"` vs chunk 0 of `"a"`).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Prefix of the wrapped-key blob family.
pub const KEY_BLOB_PREFIX: &str = "SKS_KEY_";

/// Prefix of the encrypted-payload blob family.
pub const DATA_BLOB_PREFIX: &str = "SKS_DATA_";

/// Filesystem-safe, reversible encoding of an alias.
pub fn encode_alias(alias: &str) -> String {
    URL_SAFE_NO_PAD.encode(alias.as_bytes())
}

/// Blob key of the wrapped symmetric key for `alias`.
pub fn key_blob(alias: &str) -> String {
    format!("{KEY_BLOB_PREFIX}{}", encode_alias(alias))
}

/// Blob key of the encrypted payload for `alias`.
pub fn data_blob(alias: &str) -> String {
    format!("{DATA_BLOB_PREFIX}{}", encode_alias(alias))
}
