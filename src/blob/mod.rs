//! Blob module — durable byte storage under string keys.
//!
//! This module provides:
//! - The `BlobStore` trait every backend implements
//! - A private-directory filesystem backend (`file`)
//! - An in-process backend for tests and embedding (`memory`)
//! - The chunking policy layered over any backend (`chunked`)
//!
//! Nothing here knows about encryption; blobs are opaque bytes.

pub mod chunked;
pub mod file;
pub mod memory;

pub use chunked::{ChunkLayout, ChunkedBlobs};
pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;

use crate::errors::Result;

/// Durable key → bytes storage.
///
/// `read` of a missing key fails with `BlobNotFound`; `delete` of a missing
/// key succeeds.
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous blob.
    fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Return the blob stored under `key`.
    fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Whether a blob is stored under `key`.
    fn exists(&self, key: &str) -> Result<bool>;

    /// Remove the blob stored under `key`, if any.
    fn delete(&self, key: &str) -> Result<()>;
}
