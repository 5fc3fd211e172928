//! Integration tests for the `sks` CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`. Each test
//! gets its own store directory configured for the file provider with small
//! RSA keys, so nothing touches the OS keyring.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// Helper: get a Command pointing at the sks binary.
fn sks() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("sks").expect("binary should exist");
    cmd.env_remove("SKS_STORE_DIR").env_remove("RUST_LOG");
    cmd
}

/// Helper: a store directory with a test-friendly keystore.toml.
fn store_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child("keystore.toml")
        .write_str("provider_order = [\"file\"]\nrsa_key_bits = 1024\nmax_blob_len = 256\n")
        .unwrap();
    tmp
}

/// Helper: an sks command bound to `dir`.
fn sks_in(dir: &TempDir) -> Command {
    let mut cmd = sks();
    cmd.arg("--store-dir").arg(dir.path());
    cmd
}

#[test]
fn help_flag_shows_usage() {
    sks()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted key/value secret store"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("providers"));
}

#[test]
fn version_flag_shows_version() {
    sks()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sks"));
}

#[test]
fn no_args_shows_help() {
    sks()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn set_from_stdin_then_get_prints_exact_bytes() {
    let dir = store_dir();

    sks_in(&dir)
        .args(["set", "db-password"])
        .write_stdin("hunter2\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("stored"));

    sks_in(&dir)
        .args(["get", "db-password"])
        .assert()
        .success()
        .stdout("hunter2");

    dir.child("blobs").assert(predicate::path::is_dir());
    dir.child("keys").assert(predicate::path::is_dir());
}

#[test]
fn set_with_inline_value_warns_about_shell_history() {
    let dir = store_dir();

    sks_in(&dir)
        .args(["set", "token", "abc123"])
        .assert()
        .success()
        .stderr(predicate::str::contains("shell history"));

    sks_in(&dir)
        .args(["get", "token"])
        .assert()
        .success()
        .stdout("abc123");
}

#[test]
fn overwrite_reports_update_and_returns_new_value() {
    let dir = store_dir();

    sks_in(&dir).args(["set", "k", "one"]).assert().success();
    sks_in(&dir)
        .args(["set", "k", "two"])
        .assert()
        .success()
        .stderr(predicate::str::contains("updated"));

    sks_in(&dir).args(["get", "k"]).assert().success().stdout("two");
}

#[test]
fn large_value_roundtrips_through_chunks() {
    let dir = store_dir();
    let value = "x".repeat(5000);

    sks_in(&dir)
        .args(["set", "big"])
        .write_stdin(value.clone())
        .assert()
        .success();

    sks_in(&dir)
        .args(["get", "big"])
        .assert()
        .success()
        .stdout(predicate::str::diff(value));
}

#[test]
fn get_unknown_alias_exits_with_not_found_code() {
    let dir = store_dir();

    sks_in(&dir)
        .args(["get", "missing"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No secret stored under alias 'missing'"));
}

#[test]
fn empty_alias_exits_with_usage_code() {
    let dir = store_dir();

    sks_in(&dir).args(["get", ""]).assert().code(64);
}

#[test]
fn remove_is_idempotent_and_get_afterwards_is_not_found() {
    let dir = store_dir();

    sks_in(&dir).args(["set", "k", "v"]).assert().success();
    sks_in(&dir).args(["remove", "k"]).assert().success();
    sks_in(&dir).args(["remove", "k"]).assert().success();
    sks_in(&dir).args(["get", "k"]).assert().code(2);
}

#[test]
fn purge_key_with_force_destroys_key_pair() {
    let dir = store_dir();

    sks_in(&dir).args(["set", "k", "v"]).assert().success();
    sks_in(&dir)
        .args(["remove", "k", "--purge-key", "--force"])
        .assert()
        .success()
        .stderr(predicate::str::contains("key pair"));

    let keys = std::fs::read_dir(dir.path().join("keys")).unwrap().count();
    assert_eq!(keys, 0);
}

#[test]
fn concurrent_sets_from_separate_processes_leave_a_readable_secret() {
    let dir = store_dir();

    for round in 0..4 {
        let alias = format!("race-{round}");
        std::thread::scope(|s| {
            for value in ["one", "two"] {
                let (dir, alias) = (&dir, &alias);
                s.spawn(move || {
                    sks_in(dir).args(["set", alias.as_str(), value]).assert().success();
                });
            }
        });

        let out = sks_in(&dir).args(["get", &alias]).assert().success();
        let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
        assert!(stdout == "one" || stdout == "two", "got {stdout:?}");
    }
}

#[test]
fn memory_provider_keys_do_not_outlive_the_process() {
    let dir = store_dir();

    sks_in(&dir)
        .args(["--provider", "memory", "set", "k", "v"])
        .assert()
        .success();

    // A new process has a new, empty memory container.
    sks_in(&dir)
        .args(["--provider", "memory", "get", "k"])
        .assert()
        .code(2);
}

#[test]
fn providers_lists_every_provider() {
    let dir = store_dir();

    sks_in(&dir)
        .arg("providers")
        .assert()
        .success()
        .stdout(predicate::str::contains("os-keyring"))
        .stdout(predicate::str::contains("file"))
        .stdout(predicate::str::contains("memory"))
        .stderr(predicate::str::contains("'file'"));
}

#[test]
fn invalid_config_exits_with_config_code() {
    let tmp = TempDir::new().unwrap();
    tmp.child("keystore.toml")
        .write_str("rsa_key_bits = 256\n")
        .unwrap();

    sks_in(&tmp)
        .args(["get", "k"])
        .assert()
        .code(78)
        .stderr(predicate::str::contains("rsa_key_bits"));
}

#[test]
fn completions_bash_generates_script() {
    sks()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sks"));
}

#[test]
fn completions_unknown_shell_fails() {
    sks()
        .args(["completions", "csh"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value 'csh'"))
        .stderr(predicate::str::contains("zsh"));
}
