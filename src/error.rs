//! Error types for depman operations.
//!
//! This module defines [`DepmanError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Configuration and validation errors abort an operation before any mutation
//! - Per-dependency check failures are folded into that dependency's status
//! - Install failures are fatal to an `ensure` batch
//! - Environment-apply failures are logged and skipped, never raised by the engine

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for depman operations.
#[derive(Debug, Error)]
pub enum DepmanError {
    /// Manifest file not found at the given path or any standard location.
    #[error("Manifest not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse the manifest file.
    #[error("Failed to parse manifest at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Invalid manifest structure or values.
    #[error("Invalid manifest: {message}")]
    Validation { message: String },

    /// A dependency has no configuration bundle for the active platform.
    #[error("Dependency '{dependency}' has no configuration for platform '{platform}'")]
    PlatformUnsupported {
        dependency: String,
        platform: String,
    },

    /// Download failed (network error or non-2xx response).
    #[error("Download of {url} failed: {message}")]
    Download { url: String, message: String },

    /// Downloaded file's digest does not match the declared checksum.
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Checksum declares an algorithm other than sha256.
    #[error("Unsupported checksum algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// Install command failed.
    #[error("Installation of '{dependency}' failed: {message}")]
    InstallFailed {
        dependency: String,
        message: String,
    },

    /// Dependency defines no verify command.
    #[error("No verification command provided for dependency '{dependency}'")]
    NoVerifyCommand { dependency: String },

    /// Verify command did not finish within its time bound.
    #[error("Verification of '{dependency}' timed out after {seconds} seconds")]
    VerifyTimeout { dependency: String, seconds: u64 },

    /// Verify command exited non-zero.
    #[error("Verification of '{dependency}' failed: {message}")]
    VerifyFailed {
        dependency: String,
        message: String,
    },

    /// A version string failed to parse as a semantic version.
    #[error("Invalid version '{version}': {message}")]
    InvalidVersion { version: String, message: String },

    /// A constraint expression failed to parse.
    #[error("Invalid constraint '{constraint}': {message}")]
    InvalidConstraint {
        constraint: String,
        message: String,
    },

    /// A variable could not be applied to the process environment.
    #[error("Failed to set environment variable '{variable}': {message}")]
    EnvironmentApply { variable: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for depman operations.
pub type Result<T> = std::result::Result<T, DepmanError>;
