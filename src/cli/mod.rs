//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use crate::config::Settings;
use crate::errors::Result;
use crate::provider::ProviderId;
use crate::store::SecretStore;

/// sks: encrypted key/value secret store.
#[derive(Parser)]
#[command(
    name = "sks",
    about = "Encrypted key/value secret store with envelope encryption",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store directory (default: .secure-keystore)
    #[arg(
        long,
        env = "SKS_STORE_DIR",
        default_value = ".secure-keystore",
        global = true
    )]
    pub store_dir: PathBuf,

    /// Use only this key provider: os-keyring, file or memory
    #[arg(long, global = true)]
    pub provider: Option<ProviderId>,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Store a secret (add or overwrite)
    Set {
        /// Alias to store the secret under
        alias: String,
        /// Secret value (omit to read stdin or prompt)
        value: Option<String>,
    },

    /// Print a secret's value
    Get {
        /// Alias of the secret
        alias: String,
    },

    /// Remove a secret
    Remove {
        /// Alias of the secret
        alias: String,
        /// Also destroy the alias's key pair in the key provider
        #[arg(long)]
        purge_key: bool,
        /// Skip the confirmation prompt for --purge-key
        #[arg(short, long, requires = "purge_key")]
        force: bool,
    },

    /// Show the key provider order and which provider is in use
    Providers,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum, ignore_case = true)]
        shell: Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load `<store_dir>/keystore.toml`, applying the `--provider` override.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(&cli.store_dir)?;
    if let Some(id) = cli.provider {
        settings.provider_order = vec![id];
    }
    Ok(settings)
}

/// Open the store named by the CLI arguments.
pub fn open_store(cli: &Cli) -> Result<SecretStore> {
    let settings = load_settings(cli)?;
    SecretStore::open(&cli.store_dir, &settings)
}
