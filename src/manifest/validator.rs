//! Manifest validation against the active platform.
//!
//! Validation runs before any status is computed or any mutation happens.
//! All problems are collected and reported together rather than stopping at
//! the first one.

use crate::error::{DepmanError, Result};
use crate::manifest::schema::Manifest;
use crate::version::parse_constraint;

/// Validate a manifest for the given active platform.
///
/// Checks, per dependency:
/// - a platform bundle exists for `platform`;
/// - `version.required` is non-empty;
/// - `version.constraint`, when present, parses;
/// - `installer.checksum`, when present, is `sha256:<64-hex-chars>`.
///
/// An empty dependency list is itself invalid.
///
/// # Errors
///
/// Returns a single `Validation` error joining every problem found.
pub fn validate(manifest: &Manifest, platform: &str) -> Result<()> {
    let problems = collect_problems(manifest, platform);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(DepmanError::Validation {
            message: problems.join("; "),
        })
    }
}

fn collect_problems(manifest: &Manifest, platform: &str) -> Vec<String> {
    let mut problems = Vec::new();

    if manifest.dependencies.is_empty() {
        problems.push("no dependencies defined in manifest".to_string());
        return problems;
    }

    for dep in &manifest.dependencies {
        let Some(bundle) = dep.platforms.get(platform) else {
            problems.push(format!(
                "dependency '{}' has no configuration for platform '{}'",
                dep.name, platform
            ));
            continue;
        };

        if dep.version.required.is_empty() {
            problems.push(format!("dependency '{}' has no required version", dep.name));
        }

        if let Some(constraint) = &dep.version.constraint {
            if let Err(e) = parse_constraint(constraint) {
                problems.push(format!(
                    "dependency '{}' has invalid version constraint '{}': {}",
                    dep.name, constraint, e
                ));
            }
        }

        if let Some(checksum) = &bundle.installer.checksum {
            if !is_valid_checksum(checksum) {
                problems.push(format!(
                    "dependency '{}' has malformed checksum '{}': expected sha256:<64-hex-chars>",
                    dep.name, checksum
                ));
            }
        }
    }

    problems
}

fn is_valid_checksum(checksum: &str) -> bool {
    match checksum.split_once(':') {
        Some(("sha256", digest)) => {
            digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit())
        }
        _ => false,
    }
}
