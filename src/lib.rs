pub mod blob;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod locks;
pub mod provider;
pub mod store;
