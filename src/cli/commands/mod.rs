//! One module per `sks` subcommand, each exposing an `execute` function.

pub mod completions;
pub mod get;
pub mod providers;
pub mod remove;
pub mod set;
