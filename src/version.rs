//! Version classification and constraint satisfaction.
//!
//! Installed versions are compared against the manifest's `required` version
//! to classify the update gap, and against the optional `constraint`
//! expression to decide compatibility. Verify commands rarely print a bare
//! version, so [`extract_version`] pulls the numeric core out of free-form
//! output first.

use crate::error::{DepmanError, Result};
use regex::Regex;
use semver::{Version, VersionReq};
use std::fmt;
use std::sync::LazyLock;

/// Severity bucket describing the gap between installed and required versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateKind {
    /// Installed version meets or exceeds the requirement.
    #[default]
    None,
    Patch,
    Minor,
    Major,
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateKind::None => "no update",
            UpdateKind::Patch => "patch update",
            UpdateKind::Minor => "minor update",
            UpdateKind::Major => "major update",
        };
        write!(f, "{s}")
    }
}

/// Classify the update needed to move `current` to `required`.
///
/// Components are compared major, then minor, then patch; the first component
/// where `current` falls short decides the class. A `current` that is newer
/// than `required` in every component is `None` — a downgrade is never
/// signaled.
///
/// # Errors
///
/// Returns `InvalidVersion` when either argument fails to parse.
pub fn classify_update(current: &str, required: &str) -> Result<UpdateKind> {
    let current = parse_version(current)?;
    let required = parse_version(required)?;

    if current == required {
        return Ok(UpdateKind::None);
    }

    if current.major < required.major {
        Ok(UpdateKind::Major)
    } else if current.minor < required.minor {
        Ok(UpdateKind::Minor)
    } else if current.patch < required.patch {
        Ok(UpdateKind::Patch)
    } else {
        Ok(UpdateKind::None)
    }
}

/// Check whether `current` satisfies the constraint expression.
///
/// Supports exact, caret, tilde, and comparator-range syntax. A bare version
/// with no operator (`1.2.3`) is an exact match. Space-separated comparator
/// lists (`>1.0.0 <2.0.0`) are accepted alongside the comma-separated form.
///
/// # Errors
///
/// Returns `InvalidVersion` for an unparseable version and `InvalidConstraint`
/// for an unparseable expression.
pub fn is_compatible(current: &str, constraint: &str) -> Result<bool> {
    let version = parse_version(current)?;
    let req = parse_constraint(constraint)?;
    Ok(req.matches(&version))
}

/// Parse a constraint expression into a [`VersionReq`].
pub fn parse_constraint(constraint: &str) -> Result<VersionReq> {
    VersionReq::parse(&normalize_constraint(constraint)).map_err(|e| {
        DepmanError::InvalidConstraint {
            constraint: constraint.to_string(),
            message: e.to_string(),
        }
    })
}

fn parse_version(value: &str) -> Result<Version> {
    Version::parse(value.trim().trim_start_matches('v')).map_err(|e| {
        DepmanError::InvalidVersion {
            version: value.to_string(),
            message: e.to_string(),
        }
    })
}

/// Rewrite constraint expressions into the form `semver::VersionReq`
/// expects: space-separated comparator lists become comma-separated, and a
/// lone operator-less version becomes an exact comparator (`VersionReq`
/// would otherwise give it caret semantics). Expressions already containing
/// commas pass through unchanged.
fn normalize_constraint(constraint: &str) -> String {
    let trimmed = constraint.trim();
    if trimmed.contains(',') {
        return trimmed.to_string();
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    match tokens.as_slice() {
        [single] => {
            let bare = single.strip_prefix('v').unwrap_or(single);
            if bare.starts_with(|c: char| c.is_ascii_digit()) {
                format!("={bare}")
            } else {
                trimmed.to_string()
            }
        }
        many => many.join(", "),
    }
}

// Matches the numeric core of bare versions, `version 1.2.3` banners, and
// prerelease/build-suffixed forms alike; the capture excludes any suffix.
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v?(\d+\.\d+\.\d+)").expect("version pattern must compile"));

/// Extract a clean `MAJOR.MINOR.PATCH` from free-form command output.
///
/// Verify commands print banners like `MyTool version 1.2.3-rc1 built 2024`;
/// the first numeric core found is returned. When nothing matches, the input
/// is returned untouched.
pub fn extract_version(output: &str) -> String {
    match VERSION_PATTERN.captures(output).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().to_string(),
        None => output.to_string(),
    }
}
