use clap::Parser;
use secure_keystore::cli::{commands, output, Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Set {
            ref alias,
            ref value,
        } => commands::set::execute(&cli, alias, value.as_deref()),
        Commands::Get { ref alias } => commands::get::execute(&cli, alias),
        Commands::Remove {
            ref alias,
            purge_key,
            force,
        } => commands::remove::execute(&cli, alias, purge_key, force),
        Commands::Providers => commands::providers::execute(&cli),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        std::process::exit(e.kind().exit_code());
    }
}

/// Log to stderr so stdout stays clean for `sks get`.
///
/// `--verbose` forces debug output; otherwise `RUST_LOG` applies, falling
/// back to warnings only.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("secure_keystore=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("secure_keystore=warn"))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
