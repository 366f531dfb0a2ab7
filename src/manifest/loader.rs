//! Manifest file discovery and loading.
//!
//! This module handles finding the dependency manifest in conventional
//! locations and parsing it into the data model.

use crate::error::{DepmanError, Result};
use crate::manifest::schema::Manifest;
use std::fs;
use std::path::{Path, PathBuf};

/// Conventional manifest filename.
pub const MANIFEST_FILENAME: &str = "app-dependencies.yml";

/// Resolve the manifest file path.
///
/// With an explicit path, the path is used verbatim; if it lacks a recognized
/// extension, a `.yml`-suffixed variant is also tried. Without one, an ordered
/// list of conventional locations is probed and the first existing file wins.
///
/// # Errors
///
/// Returns `ConfigNotFound` when no candidate exists.
pub fn find_manifest(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        if !has_yaml_extension(path) {
            let with_ext = PathBuf::from(format!("{}.yml", path.display()));
            if with_ext.exists() {
                return Ok(with_ext);
            }
        }
        return Err(DepmanError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    for candidate in search_paths() {
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(DepmanError::ConfigNotFound {
        path: PathBuf::from(MANIFEST_FILENAME),
    })
}

/// Standard locations to probe, in priority order.
fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from(MANIFEST_FILENAME),
        PathBuf::from("config").join(MANIFEST_FILENAME),
        PathBuf::from("..").join(MANIFEST_FILENAME),
        PathBuf::from("..").join("config").join(MANIFEST_FILENAME),
    ];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("depman").join(MANIFEST_FILENAME));
    }

    // Windows additionally keeps per-user application data under %APPDATA%.
    if cfg!(target_os = "windows") {
        if let Ok(appdata) = std::env::var("APPDATA") {
            paths.push(PathBuf::from(appdata).join("depman").join(MANIFEST_FILENAME));
        }
    }

    paths
}

fn has_yaml_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

/// Load and parse a manifest, resolving the path first when not given.
///
/// # Errors
///
/// Returns `ConfigNotFound` if no manifest exists, `ConfigParse` if the YAML
/// is malformed (surfacing the parser diagnostic).
pub fn load_manifest(explicit: Option<&Path>) -> Result<(Manifest, PathBuf)> {
    let path = find_manifest(explicit)?;
    let manifest = load_manifest_file(&path)?;
    Ok((manifest, path))
}

/// Load and parse the manifest at a known path.
pub fn load_manifest_file(path: &Path) -> Result<Manifest> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DepmanError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            DepmanError::Io(e)
        }
    })?;

    parse_manifest(&content, path)
}

/// Parse YAML content into a [`Manifest`].
pub fn parse_manifest(content: &str, source_path: &Path) -> Result<Manifest> {
    serde_yaml::from_str(content).map_err(|e| DepmanError::ConfigParse {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}
