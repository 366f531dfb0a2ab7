//! Dependency manifest: schema, discovery, validation, and generation.
//!
//! # Modules
//!
//! - [`schema`] - Serde data model for the YAML manifest
//! - [`loader`] - Manifest discovery and parsing
//! - [`validator`] - Validation against the active platform
//! - [`template`] - Starter manifest generation

pub mod loader;
pub mod schema;
pub mod template;
pub mod validator;

pub use loader::{find_manifest, load_manifest, load_manifest_file, MANIFEST_FILENAME};
pub use schema::{
    CommandSet, DependencySpec, EnvironmentSpec, InstallerSpec, Manifest, PlatformBundle,
    VersionRequirement,
};
pub use validator::validate;
