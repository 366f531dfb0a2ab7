//! CLI argument definitions.
//!
//! All arguments are defined with clap's derive macros; [`Cli`] is the entry
//! point.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// depman - Declarative external dependency provisioning.
#[derive(Debug, Parser)]
#[command(name = "depman")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the dependency manifest (overrides the standard search)
    #[arg(short, long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Override platform detection (windows, linux, macos)
    #[arg(short, long, global = true)]
    pub platform: Option<String>,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check dependencies without installing them
    Check,

    /// Ensure all dependencies are installed and up to date
    Ensure,

    /// List the dependencies declared in the manifest
    List,

    /// Generate a starter dependency manifest
    Generate(GenerateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `generate` command.
#[derive(Debug, Clone, clap::Args)]
pub struct GenerateArgs {
    /// Output file path
    #[arg(short, long, default_value = "app-dependencies.yml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
