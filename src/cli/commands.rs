//! Subcommand implementations.
//!
//! Thin wrappers over the engine: build it from the CLI flags, run the
//! requested operation, and render statuses as a styled report. Exit codes
//! carry the outcome; no decision logic lives here.

use crate::cli::args::{Cli, Commands, CompletionsArgs, GenerateArgs};
use crate::engine::{apply_environment_logged, DependencyEngine, DependencyStatus, EngineOptions};
use crate::error::Result;
use crate::manifest::template;
use crate::version::UpdateKind;
use clap::CommandFactory;
use console::style;
use std::collections::BTreeMap;

/// Dispatch the parsed CLI to its subcommand.
///
/// Returns the process exit code.
pub fn dispatch(cli: &Cli) -> Result<u8> {
    match &cli.command {
        Commands::Check => run_check(cli),
        Commands::Ensure => run_ensure(cli),
        Commands::List => run_list(cli),
        Commands::Generate(args) => run_generate(args),
        Commands::Completions(args) => run_completions(args),
    }
}

fn build_engine(cli: &Cli) -> Result<DependencyEngine> {
    let options = EngineOptions {
        platform: cli.platform.clone(),
        ..Default::default()
    };
    DependencyEngine::load(cli.manifest.as_deref(), options)
}

fn run_check(cli: &Cli) -> Result<u8> {
    let engine = build_engine(cli)?;
    let statuses = engine.check_all()?;

    let all_ok = statuses.values().all(DependencyStatus::satisfied);
    if !cli.quiet {
        print_report(&statuses);
    }

    if all_ok {
        Ok(0)
    } else {
        eprintln!(
            "{}",
            style("One or more dependencies need attention").yellow()
        );
        Ok(1)
    }
}

fn run_ensure(cli: &Cli) -> Result<u8> {
    let mut engine = build_engine(cli)?;
    let report = engine.ensure_all()?;

    // Side-effecting boundary call; failures are logged, never fatal.
    apply_environment_logged(&engine);

    if !cli.quiet {
        print_report(&report.statuses);
    }

    match report.failure {
        None => Ok(0),
        Some((name, e)) => {
            eprintln!(
                "{} {}",
                style(format!("Failed to ensure '{name}':")).red(),
                e
            );
            Ok(1)
        }
    }
}

fn run_list(cli: &Cli) -> Result<u8> {
    let engine = build_engine(cli)?;
    let manifest = engine.manifest();

    println!("Application: {}", manifest.name);
    if !manifest.description.is_empty() {
        println!("Description: {}", manifest.description);
    }
    println!("Manifest version: {}", manifest.version);
    println!();

    for dep in &manifest.dependencies {
        println!("- {}: {}", style(&dep.name).bold(), dep.description);
        print!("  Version: {}", dep.version.required);
        if let Some(constraint) = &dep.version.constraint {
            print!(" (constraint: {constraint})");
        }
        println!();

        let mut platforms: Vec<&String> = dep.platforms.keys().collect();
        platforms.sort();
        if !platforms.is_empty() {
            println!(
                "  Platforms: {}",
                platforms
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        if !dep.dependencies.is_empty() {
            println!("  Depends on: {}", dep.dependencies.join(", "));
        }
    }

    Ok(0)
}

fn run_generate(args: &GenerateArgs) -> Result<u8> {
    template::write_template(&args.output, args.force)?;
    println!("Dependency manifest template created at {}", args.output.display());
    Ok(0)
}

fn run_completions(args: &CompletionsArgs) -> Result<u8> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(args.shell, &mut cmd, name, &mut std::io::stdout());
    Ok(0)
}

/// Render the per-dependency status report.
fn print_report(statuses: &BTreeMap<String, DependencyStatus>) {
    println!("Dependency status:");
    for (name, status) in statuses {
        let state = if status.installed {
            let mut parts = vec![format!("installed (v{})", status.current_version)];
            if status.required_update != UpdateKind::None {
                parts.push(
                    style(format!("{} needed", status.required_update))
                        .yellow()
                        .to_string(),
                );
            }
            if !status.compatible {
                parts.push(style("incompatible").red().to_string());
            }
            parts.join(", ")
        } else {
            style("not installed").red().to_string()
        };

        match &status.error {
            Some(error) => println!("- {name}: {state} [{}]", style(error).red()),
            None => println!("- {name}: {state}"),
        }
    }
}
