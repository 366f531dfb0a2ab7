//! Active platform detection and bundle resolution.
//!
//! Platform identifiers follow the host-OS naming convention used by
//! `std::env::consts::OS`: `"windows"`, `"linux"`, `"macos"`. The active
//! platform is auto-detected at engine construction and can be overridden by
//! the caller.

use crate::error::{DepmanError, Result};
use crate::manifest::schema::{DependencySpec, PlatformBundle};

/// Detect the host platform identifier.
pub fn detect() -> String {
    std::env::consts::OS.to_string()
}

/// Select the platform bundle a dependency declares for `platform`.
///
/// # Errors
///
/// Returns `PlatformUnsupported` when the dependency declares no bundle for
/// the platform.
pub fn resolve_bundle<'a>(spec: &'a DependencySpec, platform: &str) -> Result<&'a PlatformBundle> {
    spec.platforms
        .get(platform)
        .ok_or_else(|| DepmanError::PlatformUnsupported {
            dependency: spec.name.clone(),
            platform: platform.to_string(),
        })
}
