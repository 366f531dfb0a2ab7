//! Per-dependency status produced by a check or ensure run.

use crate::version::UpdateKind;

/// Installation status of one dependency.
///
/// Derived and transient: recomputed on every check/ensure invocation, never
/// persisted. Errors are carried as rendered messages so statuses stay
/// cloneable and printable.
#[derive(Debug, Clone, Default)]
pub struct DependencyStatus {
    /// Dependency name.
    pub name: String,

    /// Whether the verify command succeeded.
    pub installed: bool,

    /// Version reported by the verify command (cleaned when extractable).
    pub current_version: String,

    /// Update class required to reach the manifest's required version.
    pub required_update: UpdateKind,

    /// Whether the current version satisfies the constraint (true when no
    /// constraint is declared).
    pub compatible: bool,

    /// Error encountered while checking, if any.
    pub error: Option<String>,
}

impl DependencyStatus {
    /// Fresh status for a dependency, before any check ran.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether nothing needs to happen: installed, compatible, no update.
    pub fn satisfied(&self) -> bool {
        self.installed && self.compatible && self.required_update == UpdateKind::None
    }
}
