//! Integration tests for the secret store façade.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use secure_keystore::blob::{ChunkLayout, ChunkedBlobs, FileBlobStore, MemoryBlobStore};
use secure_keystore::config::Settings;
use secure_keystore::errors::{ErrorKind, SecureStoreError};
use secure_keystore::provider::{self, KeyProvider, ProviderContext, ProviderId};
use secure_keystore::store::naming;
use secure_keystore::store::SecretStore;
use tempfile::TempDir;

/// Settings for a fast, hermetic on-disk store.
fn test_settings() -> Settings {
    Settings {
        provider_order: vec![ProviderId::File],
        rsa_key_bits: 1024,
        max_blob_len: 4096,
        ..Settings::default()
    }
}

fn open(dir: &Path) -> SecretStore {
    SecretStore::open(dir, &test_settings()).expect("store should open")
}

/// A file-backed store plus a handle on its key provider.
fn store_with_provider(dir: &Path) -> (SecretStore, Arc<dyn KeyProvider>) {
    let settings = test_settings();
    let ctx: ProviderContext = settings.provider_context(dir);
    let provider = provider::instantiate(ProviderId::File, &ctx).unwrap();
    let blobs = FileBlobStore::open(&settings.blob_dir(dir), 0).unwrap();
    let store = SecretStore::new(Arc::new(blobs), provider.clone(), settings.max_blob_len).unwrap();
    (store, provider)
}

// ---------------------------------------------------------------------------
// Round-trip
// ---------------------------------------------------------------------------

#[test]
fn roundtrip_of_assorted_sizes() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());

    let multi_mb: Vec<u8> = (0..3 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    let cases: Vec<(&str, Vec<u8>)> = vec![
        ("empty", Vec::new()),
        ("one-byte", vec![0x42]),
        ("text", b"postgres://user:pw@localhost/db".to_vec()),
        ("binary", (0..=255u8).collect()),
        ("multi-mb", multi_mb),
    ];

    for (alias, value) in &cases {
        store.set(alias, value).unwrap();
    }
    for (alias, value) in &cases {
        assert_eq!(store.get(alias).unwrap().as_slice(), value.as_slice(), "alias {alias}");
    }
}

#[test]
fn large_secret_is_stored_in_chunks() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());
    store.set("big", &vec![9u8; 20_000]).unwrap();

    let blobs = FileBlobStore::open(&tmp.path().join("blobs"), 0).unwrap();
    let chunked = ChunkedBlobs::new(&blobs, 4096).unwrap();
    assert!(matches!(
        chunked.layout(&naming::data_blob("big")).unwrap(),
        ChunkLayout::Chunked(n) if n >= 5
    ));
}

#[test]
fn secrets_survive_reopening_the_store() {
    let tmp = TempDir::new().unwrap();
    open(tmp.path()).set("api", b"persisted").unwrap();

    let reopened = open(tmp.path());
    assert_eq!(reopened.get("api").unwrap().as_slice(), b"persisted");
    assert_eq!(reopened.provider_id(), ProviderId::File);
}

// ---------------------------------------------------------------------------
// Overwrite
// ---------------------------------------------------------------------------

#[test]
fn overwrite_returns_latest_value_and_keeps_key_pair() {
    let tmp = TempDir::new().unwrap();
    let (store, provider) = store_with_provider(tmp.path());

    store.set("api", b"first").unwrap();
    let before = provider.get_or_create_public_key("api").unwrap().to_der().unwrap();

    store.set("api", b"second").unwrap();
    let after = provider.get_or_create_public_key("api").unwrap().to_der().unwrap();

    assert_eq!(store.get("api").unwrap().as_slice(), b"second");
    assert_eq!(before, after);
}

#[test]
fn shrinking_from_chunks_to_single_blob_cleans_up() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());

    store.set("big", &vec![1u8; 50_000]).unwrap();
    store.set("big", b"small").unwrap();

    let mut files: Vec<String> = fs::read_dir(tmp.path().join("blobs"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files, vec![naming::data_blob("big"), naming::key_blob("big")]);
    assert_eq!(store.get("big").unwrap().as_slice(), b"small");
}

// ---------------------------------------------------------------------------
// Not found / remove
// ---------------------------------------------------------------------------

#[test]
fn get_of_unset_alias_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());

    let err = store.get("never-set").unwrap_err();
    assert!(matches!(err, SecureStoreError::NotFound { ref alias } if alias == "never-set"));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn remove_then_get_is_not_found_and_remove_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());

    store.set("api", &vec![3u8; 10_000]).unwrap();
    store.remove("api").unwrap();
    assert_eq!(store.get("api").unwrap_err().kind(), ErrorKind::NotFound);

    store.remove("api").unwrap();
    store.remove("never-set").unwrap();

    let left = fs::read_dir(tmp.path().join("blobs")).unwrap().count();
    assert_eq!(left, 0);
}

#[test]
fn empty_alias_is_a_validation_error() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());

    assert_eq!(store.set("", b"v").unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(store.get("").unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(store.remove("").unwrap_err().kind(), ErrorKind::Validation);
}

#[test]
fn aliases_with_path_characters_stay_inside_the_store() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());

    for alias in ["../escape", "a/b", "a.0", ".hidden", "ключ"] {
        store.set(alias, alias.as_bytes()).unwrap();
    }
    for alias in ["../escape", "a/b", "a.0", ".hidden", "ключ"] {
        assert_eq!(store.get(alias).unwrap().as_slice(), alias.as_bytes());
    }
    assert!(!tmp.path().join("escape").exists());
}

// ---------------------------------------------------------------------------
// Isolation & concurrency
// ---------------------------------------------------------------------------

#[test]
fn aliases_are_isolated() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());

    store.set("a", b"alpha").unwrap();
    assert_eq!(store.get("b").unwrap_err().kind(), ErrorKind::NotFound);

    store.set("b", b"beta").unwrap();
    store.remove("b").unwrap();
    assert_eq!(store.get("a").unwrap().as_slice(), b"alpha");
}

#[test]
fn concurrent_sets_on_distinct_aliases() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());

    thread::scope(|s| {
        for i in 0..8 {
            let store = &store;
            s.spawn(move || {
                let alias = format!("alias-{i}");
                store.set(&alias, alias.as_bytes()).unwrap();
            });
        }
    });

    for i in 0..8 {
        let alias = format!("alias-{i}");
        assert_eq!(store.get(&alias).unwrap().as_slice(), alias.as_bytes());
    }
}

#[test]
fn concurrent_get_during_remove_sees_all_or_nothing() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let tmp = TempDir::new().unwrap();
    let ctx = test_settings().provider_context(tmp.path());
    let provider = provider::instantiate(ProviderId::Memory, &ctx).unwrap();
    let store = SecretStore::new(blobs, provider, 64).unwrap();

    let value = vec![5u8; 1000];
    store.set("shared", &value).unwrap();

    thread::scope(|s| {
        let readers: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    for _ in 0..20 {
                        match store.get("shared") {
                            Ok(v) => assert_eq!(v.as_slice(), value.as_slice()),
                            Err(e) => assert_eq!(e.kind(), ErrorKind::NotFound),
                        }
                    }
                })
            })
            .collect();
        s.spawn(|| store.remove("shared").unwrap());
        for reader in readers {
            reader.join().unwrap();
        }
    });

    assert_eq!(store.get("shared").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn stores_sharing_a_directory_never_break_a_new_alias() {
    let tmp = TempDir::new().unwrap();
    // Separate instances share no in-process state, like two processes.
    let first = open(tmp.path());
    let second = open(tmp.path());

    for round in 0..6 {
        let alias = format!("fresh-{round}");
        thread::scope(|s| {
            s.spawn(|| first.set(&alias, b"from-first").unwrap());
            s.spawn(|| second.set(&alias, b"from-second").unwrap());
        });

        let value = first.get(&alias).unwrap();
        assert!(
            value.as_slice() == b"from-first" || value.as_slice() == b"from-second",
            "alias {alias} read back {:?}",
            value.as_slice()
        );
        assert_eq!(second.get(&alias).unwrap().as_slice(), value.as_slice());
    }
}

#[test]
fn opened_store_keeps_lock_files_under_locks_dir() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());
    store.set("api", b"v").unwrap();

    let locks: Vec<_> = fs::read_dir(tmp.path().join("locks")).unwrap().collect();
    assert_eq!(locks.len(), 1);
    assert_eq!(fs::read_dir(tmp.path().join("blobs")).unwrap().count(), 2);
}

// ---------------------------------------------------------------------------
// Corruption
// ---------------------------------------------------------------------------

#[test]
fn flipped_byte_in_wrapped_key_is_a_crypto_error() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());
    store.set("api", b"s3cr3t").unwrap();

    let path = tmp.path().join("blobs").join(naming::key_blob("api"));
    let mut wrapped = fs::read(&path).unwrap();
    let mid = wrapped.len() / 2;
    wrapped[mid] ^= 0x01;
    fs::write(&path, &wrapped).unwrap();

    let err = store.get("api").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Crypto);
}

#[test]
fn flipped_byte_in_payload_is_a_crypto_error() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());
    store.set("api", b"s3cr3t").unwrap();

    let path = tmp.path().join("blobs").join(naming::data_blob("api"));
    let mut payload = fs::read(&path).unwrap();
    let last = payload.len() - 1;
    payload[last] ^= 0x80;
    fs::write(&path, &payload).unwrap();

    assert_eq!(store.get("api").unwrap_err().kind(), ErrorKind::Crypto);
}

#[test]
fn missing_chunk_is_a_storage_error() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());
    store.set("big", &vec![7u8; 20_000]).unwrap();

    let chunk = format!("{}.1", naming::data_blob("big"));
    fs::remove_file(tmp.path().join("blobs").join(chunk)).unwrap();

    assert_eq!(store.get("big").unwrap_err().kind(), ErrorKind::Storage);
}

/// Overwrite the chunk-count blob of `alias` with `u64::MAX`.
fn corrupt_chunk_count(dir: &Path, alias: &str) {
    let count = format!("{}.chunk_count", naming::data_blob(alias));
    fs::write(dir.join("blobs").join(count), u64::MAX.to_string()).unwrap();
}

#[test]
fn huge_chunk_count_is_a_storage_error_on_get() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());
    store.set("api", &vec![3u8; 10_000]).unwrap();
    corrupt_chunk_count(tmp.path(), "api");

    assert_eq!(store.get("api").unwrap_err().kind(), ErrorKind::Storage);
}

#[test]
fn remove_clears_an_alias_with_a_huge_chunk_count() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());
    store.set("api", &vec![3u8; 10_000]).unwrap();
    corrupt_chunk_count(tmp.path(), "api");

    store.remove("api").unwrap();
    assert!(!store.contains("api").unwrap());
    assert_eq!(fs::read_dir(tmp.path().join("blobs")).unwrap().count(), 0);
}

#[test]
fn set_recovers_an_alias_with_a_huge_chunk_count() {
    let tmp = TempDir::new().unwrap();
    let store = open(tmp.path());
    store.set("api", &vec![3u8; 10_000]).unwrap();
    corrupt_chunk_count(tmp.path(), "api");

    store.set("api", b"fresh").unwrap();
    assert_eq!(store.get("api").unwrap().as_slice(), b"fresh");
}

// ---------------------------------------------------------------------------
// Purge
// ---------------------------------------------------------------------------

#[test]
fn purge_destroys_key_pair_and_next_set_creates_a_new_one() {
    let tmp = TempDir::new().unwrap();
    let (store, provider) = store_with_provider(tmp.path());

    store.set("api", b"v1").unwrap();
    let old = provider.get_or_create_public_key("api").unwrap().to_der().unwrap();

    store.purge("api").unwrap();
    assert!(!store.contains("api").unwrap());
    assert_eq!(
        provider.get_private_key("api").unwrap_err().kind(),
        ErrorKind::NotFound
    );

    store.set("api", b"v2").unwrap();
    let new = provider.get_or_create_public_key("api").unwrap().to_der().unwrap();
    assert_ne!(old, new);
    assert_eq!(store.get("api").unwrap().as_slice(), b"v2");
}
