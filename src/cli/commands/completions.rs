//! `sks completions <shell>`: print a completion script to stdout.
//!
//! The shell name is parsed by clap, so an unknown shell is a usage error
//! before this runs.

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

pub fn execute(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    tracing::debug!(%shell, "generated completions");
    Ok(())
}
