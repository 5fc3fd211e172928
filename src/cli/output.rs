//! Colored terminal output helpers.
//!
//! All user-facing messages go through these functions so we get
//! consistent styling across every command. Status lines go to stderr
//! so stdout carries nothing but secret values and tables.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::provider::ProviderId;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    eprintln!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    eprintln!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    eprintln!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// One row of the `sks providers` table.
pub struct ProviderRow {
    pub id: ProviderId,
    /// 1-based position in the configured order, if listed.
    pub position: Option<usize>,
    /// `Ok` if the provider can be instantiated, else why not.
    pub status: std::result::Result<(), String>,
    pub selected: bool,
}

/// Print the provider table (Provider, Order, Status, In use).
pub fn print_providers_table(rows: &[ProviderRow]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Provider", "Order", "Status", "In use"]);

    for row in rows {
        let order = row
            .position
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = match &row.status {
            Ok(()) => "available".to_string(),
            Err(reason) => format!("unavailable: {reason}"),
        };
        let selected = if row.selected { "\u{2713}" } else { "" };
        table.add_row(vec![
            row.id.to_string(),
            order,
            status,
            selected.to_string(),
        ]);
    }

    println!("{table}");
}
