//! Store configuration (`keystore.toml`).

pub mod settings;

pub use settings::Settings;
