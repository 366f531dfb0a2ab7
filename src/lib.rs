//! depman - Declarative external dependency provisioning.
//!
//! depman installs and verifies an application's external tool and runtime
//! dependencies from a YAML manifest: it checks installed versions against
//! required/constraint rules, downloads installers with SHA-256 verification,
//! runs platform-specific install and verify commands, and accumulates the
//! PATH entries and variables installed dependencies contribute.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`download`] - Installer download with streaming checksum verification
//! - [`engine`] - Check/ensure orchestration
//! - [`environment`] - Environment accumulator and process-environment merge
//! - [`error`] - Error types and result alias
//! - [`exec`] - Subprocess execution with cooperative timeout
//! - [`manifest`] - Manifest schema, discovery, validation, and generation
//! - [`platform`] - Active platform detection and bundle resolution
//! - [`version`] - Update classification and constraint satisfaction
//!
//! # Example
//!
//! ```
//! use depman::version::{classify_update, UpdateKind};
//!
//! let kind = classify_update("1.2.3", "1.3.0").unwrap();
//! assert_eq!(kind, UpdateKind::Minor);
//! ```

pub mod cli;
pub mod download;
pub mod engine;
pub mod environment;
pub mod error;
pub mod exec;
pub mod manifest;
pub mod platform;
pub mod version;

pub use engine::{DependencyEngine, DependencyStatus, EngineOptions, EnsureReport};
pub use error::{DepmanError, Result};
