//! `sks remove` — delete a secret, optionally destroying its key pair.

use dialoguer::Confirm;

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::{Result, SecureStoreError};

/// Execute the `remove` command.
pub fn execute(cli: &Cli, alias: &str, purge_key: bool, force: bool) -> Result<()> {
    let store = open_store(cli)?;

    if !purge_key {
        store.remove(alias)?;
        output::success(&format!("Removed secret '{alias}'"));
        return Ok(());
    }

    // Destroying the key pair is irreversible; confirm unless --force.
    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove '{alias}' and destroy its key pair in '{}'?",
                store.provider_id()
            ))
            .default(false)
            .interact()
            .map_err(|e| SecureStoreError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    store.purge(alias)?;
    output::success(&format!("Removed secret '{alias}' and its key pair"));

    Ok(())
}
