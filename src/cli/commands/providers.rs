//! `sks providers` — show which key providers are usable here.

use crate::cli::output::{self, ProviderRow};
use crate::cli::{load_settings, Cli};
use crate::errors::Result;
use crate::provider::{self, ProviderId};

/// Execute the `providers` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let ctx = settings.provider_context(&cli.store_dir);
    let order = &settings.provider_order;

    let mut selected: Option<ProviderId> = None;
    let mut rows = Vec::with_capacity(ProviderId::ALL.len());

    // Configured providers first, in order, then the rest.
    let listed = order
        .iter()
        .copied()
        .chain(ProviderId::ALL.into_iter().filter(|id| !order.contains(id)));

    for id in listed {
        let position = order.iter().position(|o| *o == id).map(|i| i + 1);
        let status = provider::probe(id, &ctx).map_err(|e| e.to_string());
        let is_selected = selected.is_none() && position.is_some() && status.is_ok();
        if is_selected {
            selected = Some(id);
        }
        rows.push(ProviderRow {
            id,
            position,
            status,
            selected: is_selected,
        });
    }

    output::print_providers_table(&rows);

    match selected {
        Some(id) => output::info(&format!("Secrets will be protected by '{id}'.")),
        None => {
            output::warning("None of the configured key providers is available.");
            output::tip("Set provider_order in keystore.toml or pass --provider file.");
        }
    }

    Ok(())
}
