//! Environment accumulator for dependency-contributed PATH entries and
//! variables.
//!
//! Installed dependencies contribute PATH fragments and variable assignments.
//! The accumulator collects them and merges them into the ambient process
//! environment without clobbering variables it never touched. The merge is
//! available as a value ([`EnvironmentAccumulator::merged_environment`]) or as
//! an explicit, side-effecting boundary call
//! ([`EnvironmentAccumulator::apply_to_process`]) — core logic never mutates
//! the live environment implicitly.

use crate::error::{DepmanError, Result};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Separator between entries of a PATH-style list variable.
const PATH_LIST_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// Ordered, deduplicated PATH fragments plus variable assignments collected
/// from installed dependencies.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentAccumulator {
    paths: Vec<PathBuf>,
    variables: HashMap<String, String>,
}

impl EnvironmentAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a PATH fragment. Idempotent: a path already present after
    /// normalization is not added again. Insertion order is preserved.
    pub fn add_path(&mut self, path: impl AsRef<Path>) {
        let normalized = normalize_path(path.as_ref());
        if !self.paths.contains(&normalized) {
            self.paths.push(normalized);
        }
    }

    /// Add or update a variable. Last write wins on duplicate keys.
    pub fn add_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Accumulated PATH fragments, in insertion order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Accumulated variable assignments.
    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }

    /// Whether nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.variables.is_empty()
    }

    /// Expand `{name}` placeholders, first against accumulated variables,
    /// then against the ambient process environment. Unresolved tokens are
    /// left verbatim.
    pub fn expand_variables(&self, text: &str) -> String {
        let mut result = text.to_string();

        for (key, value) in &self.variables {
            result = result.replace(&format!("{{{key}}}"), value);
        }

        for (key, value) in std::env::vars() {
            result = result.replace(&format!("{{{key}}}"), &value);
        }

        result
    }

    /// Produce the full process environment with accumulated changes applied.
    ///
    /// Accumulated paths are prepended to the existing PATH-equivalent
    /// variable (matched case-insensitively on Windows), accumulated
    /// variables override same-named ambient ones, and everything else passes
    /// through unchanged. PATH is managed exclusively through [`Self::add_path`];
    /// a variable assignment named PATH is ignored with a debug log.
    pub fn merged_environment(&self) -> Vec<(String, String)> {
        let ambient: Vec<(String, String)> = std::env::vars().collect();
        let path_var = self.resolve_path_var_name(&ambient);
        self.warn_path_assignment(&path_var);

        let mut result = Vec::with_capacity(ambient.len() + self.variables.len());
        let mut seen_path = false;
        let mut overridden: Vec<&str> = Vec::new();

        for (name, value) in &ambient {
            if name == &path_var {
                seen_path = true;
                result.push((name.clone(), self.prepend_paths(value)));
            } else if let Some(new_value) = self.variables.get(name) {
                overridden.push(name);
                result.push((name.clone(), new_value.clone()));
            } else {
                result.push((name.clone(), value.clone()));
            }
        }

        // Variables with no ambient counterpart.
        for (name, value) in &self.variables {
            if !overridden.iter().any(|n| n == name) && !is_path_name(name, &path_var) {
                result.push((name.clone(), value.clone()));
            }
        }

        if !seen_path && !self.paths.is_empty() {
            result.push((path_var, self.joined_paths()));
        }

        result
    }

    /// Apply the merge to the live process environment.
    ///
    /// A variable assignment named PATH is ignored, matching
    /// [`Self::merged_environment`]; PATH changes come from
    /// [`Self::add_path`] only.
    ///
    /// # Errors
    ///
    /// Returns `EnvironmentApply` naming the first variable that cannot be
    /// set (empty name, or an embedded `=`/NUL).
    pub fn apply_to_process(&self) -> Result<()> {
        let ambient: Vec<(String, String)> = std::env::vars().collect();
        let path_var = self.resolve_path_var_name(&ambient);
        self.warn_path_assignment(&path_var);

        for (key, value) in &self.variables {
            if is_path_name(key, &path_var) {
                continue;
            }
            set_process_var(key, value)?;
        }

        if !self.paths.is_empty() {
            let current = std::env::var(&path_var).unwrap_or_default();
            let merged = if current.is_empty() {
                self.joined_paths()
            } else {
                self.prepend_paths(&current)
            };
            set_process_var(&path_var, &merged)?;
        }

        Ok(())
    }

    /// Name of the PATH-equivalent variable in the ambient environment.
    ///
    /// Windows environment variable names are case-insensitive; the actual
    /// spelling in use is preserved so the merge overrides rather than
    /// duplicates.
    fn resolve_path_var_name(&self, ambient: &[(String, String)]) -> String {
        if cfg!(windows) {
            for (name, _) in ambient {
                if name.eq_ignore_ascii_case("PATH") {
                    return name.clone();
                }
            }
        }
        "PATH".to_string()
    }

    fn warn_path_assignment(&self, path_var: &str) {
        if self.variables.keys().any(|k| is_path_name(k, path_var)) {
            debug!(
                "Ignoring variable assignment to {}; PATH entries are contributed via path fragments",
                path_var
            );
        }
    }

    fn joined_paths(&self) -> String {
        self.paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(&PATH_LIST_SEPARATOR.to_string())
    }

    fn prepend_paths(&self, current: &str) -> String {
        if self.paths.is_empty() {
            return current.to_string();
        }
        if current.is_empty() {
            return self.joined_paths();
        }
        format!("{}{}{}", self.joined_paths(), PATH_LIST_SEPARATOR, current)
    }
}

/// Whether `name` refers to the PATH-equivalent variable.
fn is_path_name(name: &str, path_var: &str) -> bool {
    if cfg!(windows) {
        name.eq_ignore_ascii_case(path_var)
    } else {
        name == path_var
    }
}

/// Set one variable on the live process, validating it is settable first.
fn set_process_var(key: &str, value: &str) -> Result<()> {
    if key.is_empty() || key.contains('=') || key.contains('\0') || value.contains('\0') {
        return Err(DepmanError::EnvironmentApply {
            variable: key.to_string(),
            message: "name or value contains characters the platform rejects".to_string(),
        });
    }
    // SAFETY: the engine is single-threaded while environment changes are
    // applied; callers invoking this from concurrent threads are unsupported.
    unsafe { std::env::set_var(key, value) };
    Ok(())
}

/// Lexically normalize a path for the host separator convention: `.`
/// components are dropped and `..` pops a preceding normal component.
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn add_path_is_idempotent() {
        let mut acc = EnvironmentAccumulator::new();
        acc.add_path("/usr/local/bin");
        acc.add_path("/usr/local/bin");
        assert_eq!(acc.paths().len(), 1);
    }

    #[test]
    fn add_path_dedupes_after_normalization() {
        let mut acc = EnvironmentAccumulator::new();
        acc.add_path("/usr/local/bin");
        acc.add_path("/usr/local/./bin");
        acc.add_path("/usr/local/lib/../bin");
        assert_eq!(acc.paths(), &[PathBuf::from("/usr/local/bin")]);
    }

    #[test]
    fn add_path_preserves_insertion_order() {
        let mut acc = EnvironmentAccumulator::new();
        acc.add_path("/b");
        acc.add_path("/a");
        assert_eq!(acc.paths(), &[PathBuf::from("/b"), PathBuf::from("/a")]);
    }

    #[test]
    fn add_variable_last_write_wins() {
        let mut acc = EnvironmentAccumulator::new();
        acc.add_variable("TOOL_HOME", "/opt/v1");
        acc.add_variable("TOOL_HOME", "/opt/v2");
        assert_eq!(acc.variables().get("TOOL_HOME").unwrap(), "/opt/v2");
    }

    #[test]
    fn expand_resolves_own_variables_first() {
        let mut acc = EnvironmentAccumulator::new();
        acc.add_variable("TOOL_HOME", "/opt/tool");
        assert_eq!(
            acc.expand_variables("{TOOL_HOME}/bin"),
            "/opt/tool/bin"
        );
    }

    #[test]
    #[serial]
    fn expand_falls_back_to_ambient_environment() {
        // SAFETY: test is serialized; no concurrent env access.
        unsafe { std::env::set_var("DEPMAN_TEST_AMBIENT", "ambient-value") };
        let acc = EnvironmentAccumulator::new();
        assert_eq!(
            acc.expand_variables("x-{DEPMAN_TEST_AMBIENT}-y"),
            "x-ambient-value-y"
        );
        unsafe { std::env::remove_var("DEPMAN_TEST_AMBIENT") };
    }

    #[test]
    fn expand_leaves_unresolved_tokens_verbatim() {
        let acc = EnvironmentAccumulator::new();
        assert_eq!(
            acc.expand_variables("{DEPMAN_NO_SUCH_TOKEN}/bin"),
            "{DEPMAN_NO_SUCH_TOKEN}/bin"
        );
    }

    #[test]
    #[serial]
    fn merged_environment_prepends_paths() {
        let mut acc = EnvironmentAccumulator::new();
        acc.add_path("/depman/extra/bin");

        let merged = acc.merged_environment();
        let path = merged
            .iter()
            .find(|(k, _)| k == "PATH")
            .map(|(_, v)| v.clone())
            .unwrap();
        assert!(path.starts_with("/depman/extra/bin"));
    }

    #[test]
    #[serial]
    fn merged_environment_overrides_accumulated_variables() {
        // SAFETY: test is serialized; no concurrent env access.
        unsafe { std::env::set_var("DEPMAN_TEST_OVERRIDE", "old") };
        let mut acc = EnvironmentAccumulator::new();
        acc.add_variable("DEPMAN_TEST_OVERRIDE", "new");
        acc.add_variable("DEPMAN_TEST_FRESH", "fresh");

        let merged = acc.merged_environment();
        let get = |name: &str| {
            merged
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("DEPMAN_TEST_OVERRIDE"), Some("new"));
        assert_eq!(get("DEPMAN_TEST_FRESH"), Some("fresh"));
        // Only one entry for the overridden name.
        assert_eq!(
            merged.iter().filter(|(k, _)| k == "DEPMAN_TEST_OVERRIDE").count(),
            1
        );
        unsafe { std::env::remove_var("DEPMAN_TEST_OVERRIDE") };
    }

    #[test]
    #[serial]
    fn merged_environment_passes_untouched_variables_through() {
        // SAFETY: test is serialized; no concurrent env access.
        unsafe { std::env::set_var("DEPMAN_TEST_UNTOUCHED", "kept") };
        let acc = EnvironmentAccumulator::new();
        let merged = acc.merged_environment();
        assert!(merged
            .iter()
            .any(|(k, v)| k == "DEPMAN_TEST_UNTOUCHED" && v == "kept"));
        unsafe { std::env::remove_var("DEPMAN_TEST_UNTOUCHED") };
    }

    #[test]
    #[serial]
    fn variable_assignment_named_path_is_ignored_in_merge() {
        let mut acc = EnvironmentAccumulator::new();
        acc.add_variable("PATH", "/clobber");
        acc.add_path("/depman/managed/bin");

        let merged = acc.merged_environment();
        let entries: Vec<_> = merged.iter().filter(|(k, _)| k == "PATH").collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].1.starts_with("/depman/managed/bin"));
        assert!(!entries[0].1.contains("/clobber"));
    }

    #[test]
    #[serial]
    fn apply_ignores_variable_assignment_named_path() {
        let mut acc = EnvironmentAccumulator::new();
        acc.add_variable("PATH", "/clobber");
        acc.add_path("/depman/var-ignored/bin");

        acc.apply_to_process().unwrap();

        let path = std::env::var("PATH").unwrap();
        assert!(path.starts_with("/depman/var-ignored/bin"));
        assert!(!path.contains("/clobber"));
    }

    #[test]
    #[serial]
    fn apply_to_process_sets_variables_and_path() {
        let mut acc = EnvironmentAccumulator::new();
        acc.add_variable("DEPMAN_TEST_APPLIED", "yes");
        acc.add_path("/depman/applied/bin");

        acc.apply_to_process().unwrap();

        assert_eq!(std::env::var("DEPMAN_TEST_APPLIED").unwrap(), "yes");
        let path = std::env::var("PATH").unwrap_or_default();
        assert!(path.starts_with("/depman/applied/bin"));

        unsafe { std::env::remove_var("DEPMAN_TEST_APPLIED") };
    }

    #[test]
    fn apply_rejects_unsettable_variable_name() {
        let mut acc = EnvironmentAccumulator::new();
        acc.add_variable("BAD=NAME", "value");
        let err = acc.apply_to_process().unwrap_err();
        match err {
            DepmanError::EnvironmentApply { variable, .. } => {
                assert_eq!(variable, "BAD=NAME");
            }
            other => panic!("expected EnvironmentApply, got {other:?}"),
        }
    }

    #[test]
    fn normalize_handles_dot_and_dotdot() {
        assert_eq!(
            normalize_path(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize_path(Path::new("a/..")), PathBuf::from("."));
        assert_eq!(normalize_path(Path::new("../x")), PathBuf::from("../x"));
    }
}
