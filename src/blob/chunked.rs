//! Chunked persistence over any `BlobStore`.
//!
//! A payload no larger than `max_len` is stored as a single blob under its
//! key. A larger payload is split into `ceil(len / max_len)` chunks:
//!
//! ```text
//! <key>.0, <key>.1, ... <key>.<n-1>   chunk bytes, each at most max_len
//! <key>.chunk_count                   decimal chunk count as UTF-8 text
//! ```
//!
//! The presence of the count blob is the only signal that a payload is
//! chunked. It is written after every chunk, and any blobs left over from
//! a previous, differently shaped payload are deleted after the new one is
//! in place.
//!
//! The count is only trusted for reading. Cleanup walks the chunks that
//! actually exist, so a damaged count blob can always be overwritten or
//! deleted.

use super::BlobStore;
use crate::errors::{Result, SecureStoreError};

/// Suffix of the blob recording how many chunks a payload has.
pub const CHUNK_COUNT_SUFFIX: &str = ".chunk_count";

/// Key of chunk `index` of the payload stored under `key`.
pub fn chunk_key(key: &str, index: usize) -> String {
    format!("{key}.{index}")
}

/// Key of the chunk-count blob for the payload stored under `key`.
pub fn chunk_count_key(key: &str) -> String {
    format!("{key}{CHUNK_COUNT_SUFFIX}")
}

/// Number of chunks needed for `len` bytes; exact multiples of `max_len`
/// do not get an extra empty chunk.
pub fn chunk_count(len: usize, max_len: usize) -> usize {
    len.div_ceil(max_len)
}

/// How a payload is currently laid out in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkLayout {
    Absent,
    Single,
    Chunked(usize),
}

/// Applies the chunking policy on top of a borrowed `BlobStore`.
pub struct ChunkedBlobs<'a> {
    store: &'a dyn BlobStore,
    max_len: usize,
}

impl<'a> ChunkedBlobs<'a> {
    /// `max_len` must be non-zero.
    pub fn new(store: &'a dyn BlobStore, max_len: usize) -> Result<Self> {
        if max_len == 0 {
            return Err(SecureStoreError::Validation(
                "maximum blob length must be greater than zero".into(),
            ));
        }
        Ok(Self { store, max_len })
    }

    /// Store `bytes` under `key`, chunking when they exceed `max_len`.
    ///
    /// Returns the resulting layout.
    pub fn write(&self, key: &str, bytes: &[u8]) -> Result<ChunkLayout> {
        let layout = if bytes.len() > self.max_len {
            let count = chunk_count(bytes.len(), self.max_len);
            for (index, chunk) in bytes.chunks(self.max_len).enumerate() {
                self.store.write(&chunk_key(key, index), chunk)?;
            }
            self.store
                .write(&chunk_count_key(key), count.to_string().as_bytes())?;
            // A single blob from an earlier generation would be shadowed
            // by the count blob; drop it.
            self.store.delete(key)?;
            self.remove_chunks_from(key, count)?;
            ChunkLayout::Chunked(count)
        } else {
            self.store.write(key, bytes)?;
            self.store.delete(&chunk_count_key(key))?;
            self.remove_chunks_from(key, 0)?;
            ChunkLayout::Single
        };

        tracing::debug!(key, len = bytes.len(), ?layout, "stored payload");
        Ok(layout)
    }

    /// Read the payload stored under `key`, reassembling chunks in order.
    ///
    /// Fails with `BlobNotFound` when nothing is stored, and with
    /// `CorruptBlob` when the chunk set is incomplete.
    pub fn read(&self, key: &str) -> Result<Vec<u8>> {
        match self.layout(key)? {
            ChunkLayout::Absent => Err(SecureStoreError::BlobNotFound {
                key: key.to_string(),
            }),
            ChunkLayout::Single => self.store.read(key),
            ChunkLayout::Chunked(count) => {
                if !self.store.exists(&chunk_key(key, count - 1))? {
                    return Err(SecureStoreError::CorruptBlob {
                        key: key.to_string(),
                        reason: format!("chunk count {count} does not match the stored chunks"),
                    });
                }
                let mut out = Vec::new();
                for index in 0..count {
                    let chunk_key = chunk_key(key, index);
                    match self.store.read(&chunk_key) {
                        Ok(chunk) => out.extend_from_slice(&chunk),
                        Err(SecureStoreError::BlobNotFound { .. }) => {
                            return Err(SecureStoreError::CorruptBlob {
                                key: key.to_string(),
                                reason: format!("chunk {index} of {count} is missing"),
                            });
                        }
                        Err(e) => return Err(e),
                    }
                }
                Ok(out)
            }
        }
    }

    /// Remove the payload under `key`: the count blob, every chunk, and the
    /// single blob. Removing an absent payload is not an error.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(&chunk_count_key(key))?;
        self.remove_chunks_from(key, 0)?;
        self.store.delete(key)
    }

    /// Inspect how the payload under `key` is stored.
    pub fn layout(&self, key: &str) -> Result<ChunkLayout> {
        let count_key = chunk_count_key(key);
        if self.store.exists(&count_key)? {
            let raw = self.store.read(&count_key)?;
            let count = std::str::from_utf8(&raw)
                .ok()
                .and_then(|s| s.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| SecureStoreError::CorruptBlob {
                    key: count_key.clone(),
                    reason: "chunk count is not a positive decimal number".into(),
                })?;
            return Ok(ChunkLayout::Chunked(count));
        }
        if self.store.exists(key)? {
            Ok(ChunkLayout::Single)
        } else {
            Ok(ChunkLayout::Absent)
        }
    }

    /// Delete the contiguous run of chunks starting at `start`.
    ///
    /// Deletes from the end backwards so an interrupted cleanup still
    /// leaves a run that begins at `start` for the next attempt.
    fn remove_chunks_from(&self, key: &str, start: usize) -> Result<()> {
        let mut end = start;
        while self.store.exists(&chunk_key(key, end))? {
            end += 1;
        }
        for index in (start..end).rev() {
            self.store.delete(&chunk_key(key, index))?;
        }
        if end > start {
            tracing::debug!(key, removed = end - start, "removed stale chunks");
        }
        Ok(())
    }
}
