//! `sks set` — store or overwrite a secret.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::{Result, SecureStoreError};

/// Execute the `set` command.
pub fn execute(cli: &Cli, alias: &str, value: Option<&str>) -> Result<()> {
    // Determine the secret value from one of three sources.
    let secret: Zeroizing<Vec<u8>> = if let Some(v) = value {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on command line — it may appear in shell history.");
        Zeroizing::new(v.as_bytes().to_vec())
    } else if !io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(Vec::new());
        io::stdin().read_to_end(&mut buf)?;
        strip_trailing_newline(&mut buf);
        buf
    } else {
        // Source 3: Interactive secure prompt (default).
        let entered = dialoguer::Password::new()
            .with_prompt(format!("Enter value for {alias}"))
            .allow_empty_password(true)
            .interact()
            .map_err(|e| SecureStoreError::CommandFailed(format!("input prompt: {e}")))?;
        Zeroizing::new(entered.into_bytes())
    };

    let store = open_store(cli)?;
    let existed = store.contains(alias)?;
    store.set(alias, &secret)?;

    let verb = if existed { "updated" } else { "stored" };
    output::success(&format!(
        "Secret '{alias}' {verb} ({} bytes, provider: {})",
        secret.len(),
        store.provider_id()
    ));

    Ok(())
}

/// Drop one trailing `\n` (or `\r\n`) left by `echo` or a heredoc.
fn strip_trailing_newline(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}
