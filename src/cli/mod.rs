//! Command-line interface: argument definitions and subcommand dispatch.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
pub use commands::dispatch;
