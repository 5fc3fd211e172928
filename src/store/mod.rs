//! Store module: the public set/get/remove façade.
//!
//! This module provides:
//! - The storage-key naming scheme (`naming`)
//! - `SecretStore`, which ties the blob layer, the key provider and the
//!   envelope cipher together (`secret_store`)

pub mod naming;
pub mod secret_store;

pub use secret_store::{SecretStore, MAX_ALIAS_LEN};
