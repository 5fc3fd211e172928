//! `sks get` — print a single secret's value.

use std::io::{self, IsTerminal, Write};

use crate::cli::{open_store, Cli};
use crate::errors::Result;

/// Execute the `get` command.
///
/// Writes the exact stored bytes to stdout. A newline is appended only
/// when stdout is a terminal, so pipes and redirects get the value as-is.
pub fn execute(cli: &Cli, alias: &str) -> Result<()> {
    let store = open_store(cli)?;
    let value = store.get(alias)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    out.write_all(&value)?;
    if stdout.is_terminal() {
        out.write_all(b"\n")?;
    }
    out.flush()?;

    Ok(())
}
