//! Dependency engine: validate, check, install, verify, accumulate
//! environment.
//!
//! The engine is strictly sequential: dependencies are checked and installed
//! one at a time in manifest order. `check_all` is read-only and isolates
//! per-dependency failures into their statuses; `ensure_all` treats a hard
//! install failure as fatal to the remaining batch, because a failed install
//! leaves the target system in an unverified state.
//!
//! The engine never mutates the process environment on its own.
//! [`DependencyEngine::apply_environment`] is the explicit boundary call and
//! [`DependencyEngine::updated_environment`] returns the merge as a value.

pub mod status;

pub use status::DependencyStatus;

use crate::download;
use crate::environment::EnvironmentAccumulator;
use crate::error::{DepmanError, Result};
use crate::exec::{self, ExecResult};
use crate::manifest::schema::{DependencySpec, Manifest, PlatformBundle};
use crate::manifest::{loader, validator};
use crate::platform;
use crate::version::{self, UpdateKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Placeholder substituted into install arguments with the downloaded path.
const DOWNLOAD_PATH_TOKEN: &str = "{download_path}";

/// Default bound on verify commands.
const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for engine construction.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Platform identifier override; auto-detected from the host when unset.
    pub platform: Option<String>,

    /// Bound on verify commands.
    pub verify_timeout: Duration,

    /// Bound on install commands. None matches the source behavior of
    /// unbounded installs.
    pub install_timeout: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            platform: None,
            verify_timeout: DEFAULT_VERIFY_TIMEOUT,
            install_timeout: None,
        }
    }
}

/// Outcome of an `ensure_all` run.
///
/// `statuses` always holds whatever was computed before the run ended;
/// `failure` names the dependency whose install aborted the batch, when one
/// did.
#[derive(Debug)]
pub struct EnsureReport {
    /// Final status per dependency, keyed by name.
    pub statuses: BTreeMap<String, DependencyStatus>,

    /// The dependency and error that aborted the batch, if any.
    pub failure: Option<(String, DepmanError)>,
}

impl EnsureReport {
    /// Whether the whole batch completed without a fatal install error.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Orchestrates dependency checking and installation for one manifest.
#[derive(Debug)]
pub struct DependencyEngine {
    manifest: Manifest,
    manifest_path: PathBuf,
    platform: String,
    env: EnvironmentAccumulator,
    verify_timeout: Duration,
    install_timeout: Option<Duration>,
}

impl DependencyEngine {
    /// Load the manifest (from `path` or the standard locations) and build an
    /// engine.
    pub fn load(path: Option<&Path>, options: EngineOptions) -> Result<Self> {
        let (manifest, manifest_path) = loader::load_manifest(path)?;
        Ok(Self::new(manifest, manifest_path, options))
    }

    /// Build an engine from an already-loaded manifest.
    pub fn new(manifest: Manifest, manifest_path: PathBuf, options: EngineOptions) -> Self {
        Self {
            manifest,
            manifest_path,
            platform: options.platform.unwrap_or_else(platform::detect),
            env: EnvironmentAccumulator::new(),
            verify_timeout: options.verify_timeout,
            install_timeout: options.install_timeout,
        }
    }

    /// The loaded manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Path the manifest was loaded from.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Active platform identifier.
    pub fn platform(&self) -> &str {
        &self.platform
    }

    /// Environment changes accumulated by installs so far.
    pub fn environment(&self) -> &EnvironmentAccumulator {
        &self.env
    }

    /// Validate the manifest against the active platform.
    pub fn validate(&self) -> Result<()> {
        validator::validate(&self.manifest, &self.platform)
    }

    /// Check the status of every dependency without installing anything.
    ///
    /// Validation failure aborts with no statuses. Per-dependency check
    /// failures are folded into that dependency's status so one bad
    /// dependency never hides the rest.
    pub fn check_all(&self) -> Result<BTreeMap<String, DependencyStatus>> {
        self.validate()?;

        let mut statuses = BTreeMap::new();
        for dep in &self.manifest.dependencies {
            statuses.insert(dep.name.clone(), self.verify_dependency(dep));
        }
        Ok(statuses)
    }

    /// Check a single dependency by name.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the name is not in the manifest.
    pub fn check_dependency(&self, name: &str) -> Result<DependencyStatus> {
        let dep = self
            .manifest
            .dependency(name)
            .ok_or_else(|| DepmanError::Validation {
                message: format!("dependency '{name}' not found in manifest"),
            })?;
        Ok(self.verify_dependency(dep))
    }

    /// Check every dependency and install or update the ones that need it.
    ///
    /// Dependencies already installed, compatible, and up to date are
    /// skipped. A hard install error aborts the remaining batch; the partial
    /// status map is preserved in the returned report.
    ///
    /// # Errors
    ///
    /// `Err` is reserved for validation failures that abort before any work.
    pub fn ensure_all(&mut self) -> Result<EnsureReport> {
        self.validate()?;
        let mut statuses = self.check_all()?;
        let mut failure = None;

        let names: Vec<String> = self
            .manifest
            .dependencies
            .iter()
            .map(|d| d.name.clone())
            .collect();

        for name in names {
            let satisfied = statuses.get(&name).is_some_and(DependencyStatus::satisfied);
            if satisfied {
                debug!("Dependency {} is already up to date", name);
                continue;
            }

            // Cloned so the accumulator can be borrowed mutably below.
            let dep = self
                .manifest
                .dependency(&name)
                .cloned()
                .expect("checked names come from the manifest");

            match self.install_dependency(&dep) {
                Ok(()) => {
                    self.setup_environment(&dep);
                    let fresh = self.verify_dependency(&dep);
                    statuses.insert(name, fresh);
                }
                Err(e) => {
                    error!("Installation of {} failed: {}", name, e);
                    if let Some(status) = statuses.get_mut(&name) {
                        status.installed = false;
                        status.error = Some(e.to_string());
                    }
                    failure = Some((name, e));
                    break;
                }
            }
        }

        Ok(EnsureReport { statuses, failure })
    }

    /// The full process environment with accumulated changes merged in.
    pub fn updated_environment(&self) -> Vec<(String, String)> {
        self.env.merged_environment()
    }

    /// Apply accumulated environment changes to the live process.
    ///
    /// Explicit side-effecting boundary call; the engine never invokes it
    /// itself.
    ///
    /// # Errors
    ///
    /// Returns `EnvironmentApply` naming the variable that could not be set.
    pub fn apply_environment(&self) -> Result<()> {
        self.env.apply_to_process()
    }

    /// Install one dependency: download (when a URL is declared), substitute
    /// the download path into the install template, and execute it.
    pub fn install_dependency(&self, dep: &DependencySpec) -> Result<()> {
        let bundle = platform::resolve_bundle(dep, &self.platform)?;

        let staging = tempfile::Builder::new()
            .prefix("depman-download-")
            .tempdir()?;

        let mut download_path = String::new();
        if !bundle.installer.url.is_empty() {
            info!("Downloading {} from {}", dep.name, bundle.installer.url);
            let result = download::download(
                &bundle.installer.url,
                staging.path(),
                bundle.installer.checksum.as_deref(),
            )?;
            info!("Downloaded {} ({} bytes)", dep.name, result.size);
            download_path = result.path.display().to_string();
        }

        if bundle.commands.install.is_empty() {
            return Err(DepmanError::InstallFailed {
                dependency: dep.name.clone(),
                message: "no install command defined".to_string(),
            });
        }

        let argv: Vec<String> = bundle
            .commands
            .install
            .iter()
            .map(|arg| arg.replace(DOWNLOAD_PATH_TOKEN, &download_path))
            .collect();

        info!("Installing {} using command: {}", dep.name, argv.join(" "));

        let result = exec::run_capture(&argv, self.install_timeout).map_err(|e| {
            DepmanError::InstallFailed {
                dependency: dep.name.clone(),
                message: e.to_string(),
            }
        })?;

        if result.timed_out {
            return Err(DepmanError::InstallFailed {
                dependency: dep.name.clone(),
                message: format!(
                    "timed out after {} seconds",
                    self.install_timeout.unwrap_or_default().as_secs()
                ),
            });
        }

        if !result.success() {
            return Err(DepmanError::InstallFailed {
                dependency: dep.name.clone(),
                message: format!(
                    "exit code {:?}, output: {}",
                    result.exit_code,
                    result.output.trim()
                ),
            });
        }

        info!("Successfully installed {}", dep.name);
        Ok(())
    }

    /// Run the verify command and derive the dependency's status.
    ///
    /// Check failures land on the status rather than propagating, so callers
    /// can always report every dependency.
    fn verify_dependency(&self, dep: &DependencySpec) -> DependencyStatus {
        let mut status = DependencyStatus::new(&dep.name);

        let bundle = match platform::resolve_bundle(dep, &self.platform) {
            Ok(bundle) => bundle,
            Err(e) => {
                status.error = Some(e.to_string());
                return status;
            }
        };

        let output = match self.run_verify(dep, bundle) {
            Ok(output) => output,
            Err(e) => {
                status.error = Some(e.to_string());
                return status;
            }
        };

        status.installed = true;
        debug!("Dependency {} is installed", dep.name);

        status.current_version = version::extract_version(output.trim());

        if !dep.version.required.is_empty() {
            match version::classify_update(&status.current_version, &dep.version.required) {
                Ok(kind) => {
                    status.required_update = kind;
                    if kind != UpdateKind::None {
                        info!(
                            "Dependency {} requires a {} (current: {}, required: {})",
                            dep.name, kind, status.current_version, dep.version.required
                        );
                    }
                }
                Err(e) => {
                    error!("Failed to classify update for {}: {}", dep.name, e);
                    status.error = Some(e.to_string());
                }
            }
        }

        match dep.version.constraint.as_deref().filter(|c| !c.is_empty()) {
            Some(constraint) => {
                match version::is_compatible(&status.current_version, constraint) {
                    Ok(compatible) => {
                        status.compatible = compatible;
                        if !compatible {
                            info!(
                                "Dependency {} version {} does not satisfy constraint {}",
                                dep.name, status.current_version, constraint
                            );
                        }
                    }
                    Err(e) => {
                        error!("Failed to check compatibility for {}: {}", dep.name, e);
                        status.error = Some(e.to_string());
                    }
                }
            }
            // No constraint means compatible by definition.
            None => status.compatible = true,
        }

        status
    }

    /// Execute the verify command, mapping timeout and exit failures to their
    /// distinct error kinds.
    fn run_verify(&self, dep: &DependencySpec, bundle: &PlatformBundle) -> Result<String> {
        if bundle.commands.verify.is_empty() {
            return Err(DepmanError::NoVerifyCommand {
                dependency: dep.name.clone(),
            });
        }

        debug!("Verifying dependency: {}", dep.name);

        let result: ExecResult =
            exec::run_capture(&bundle.commands.verify, Some(self.verify_timeout)).map_err(
                |e| DepmanError::VerifyFailed {
                    dependency: dep.name.clone(),
                    message: e.to_string(),
                },
            )?;

        if result.timed_out {
            return Err(DepmanError::VerifyTimeout {
                dependency: dep.name.clone(),
                seconds: self.verify_timeout.as_secs(),
            });
        }

        if !result.success() {
            return Err(DepmanError::VerifyFailed {
                dependency: dep.name.clone(),
                message: format!(
                    "exit code {:?}, output: {}",
                    result.exit_code,
                    result.output.trim()
                ),
            });
        }

        Ok(result.output)
    }

    /// Fold a dependency's environment spec into the accumulator, expanding
    /// placeholders against accumulated variables and the ambient
    /// environment.
    fn setup_environment(&mut self, dep: &DependencySpec) {
        if dep.environment.is_empty() {
            return;
        }

        for path in &dep.environment.path {
            let expanded = self.env.expand_variables(path);
            debug!("Adding {} to PATH for dependency {}", expanded, dep.name);
            self.env.add_path(expanded);
        }

        for (key, value) in &dep.environment.variables {
            let expanded = self.env.expand_variables(value);
            debug!(
                "Setting environment variable {}={} for dependency {}",
                key, expanded, dep.name
            );
            self.env.add_variable(key.clone(), expanded);
        }
    }
}

/// Apply accumulated environment changes, logging instead of failing.
///
/// Environment application is a side-effect convenience, not correctness;
/// boundary callers log and continue.
pub fn apply_environment_logged(engine: &DependencyEngine) {
    if let Err(e) = engine.apply_environment() {
        warn!("Failed to apply environment changes: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::schema::{
        CommandSet, EnvironmentSpec, InstallerSpec, VersionRequirement,
    };
    use std::collections::HashMap;

    const TEST_PLATFORM: &str = "testos";

    fn options() -> EngineOptions {
        EngineOptions {
            platform: Some(TEST_PLATFORM.to_string()),
            ..Default::default()
        }
    }

    fn dep_with_verify(name: &str, verify: Vec<String>) -> DependencySpec {
        let mut platforms = HashMap::new();
        platforms.insert(
            TEST_PLATFORM.to_string(),
            PlatformBundle {
                installer: InstallerSpec::default(),
                commands: CommandSet {
                    verify,
                    ..Default::default()
                },
            },
        );
        DependencySpec {
            name: name.to_string(),
            description: String::new(),
            version: VersionRequirement {
                required: "1.0.0".to_string(),
                constraint: None,
            },
            platforms,
            environment: EnvironmentSpec::default(),
            dependencies: Vec::new(),
        }
    }

    fn manifest_of(deps: Vec<DependencySpec>) -> Manifest {
        Manifest {
            version: "1.0".to_string(),
            name: "test-app".to_string(),
            description: String::new(),
            dependencies: deps,
        }
    }

    fn engine_of(deps: Vec<DependencySpec>) -> DependencyEngine {
        DependencyEngine::new(manifest_of(deps), PathBuf::from("test.yml"), options())
    }

    #[test]
    fn platform_override_is_respected() {
        let engine = engine_of(vec![dep_with_verify("tool", vec![])]);
        assert_eq!(engine.platform(), TEST_PLATFORM);
    }

    #[test]
    fn platform_auto_detected_without_override() {
        let engine = DependencyEngine::new(
            manifest_of(vec![]),
            PathBuf::from("test.yml"),
            EngineOptions::default(),
        );
        assert_eq!(engine.platform(), std::env::consts::OS);
    }

    #[test]
    fn check_all_aborts_on_empty_manifest() {
        let engine = engine_of(vec![]);
        let err = engine.check_all().unwrap_err();
        assert!(matches!(err, DepmanError::Validation { .. }));
    }

    #[test]
    fn ensure_all_aborts_on_validation_failure() {
        let mut dep = dep_with_verify("tool", vec!["tool".into(), "--version".into()]);
        dep.version.required = String::new();
        let mut engine = engine_of(vec![dep]);
        assert!(engine.ensure_all().is_err());
    }

    #[test]
    fn check_dependency_rejects_unknown_name() {
        let engine = engine_of(vec![dep_with_verify("tool", vec![])]);
        let err = engine.check_dependency("other").unwrap_err();
        assert!(matches!(err, DepmanError::Validation { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn missing_verify_command_lands_on_status() {
        let engine = engine_of(vec![dep_with_verify("tool", vec![])]);
        let statuses = engine.check_all().unwrap();
        let status = &statuses["tool"];
        assert!(!status.installed);
        assert!(status.error.as_deref().unwrap().contains("No verification command"));
    }

    #[cfg(unix)]
    #[test]
    fn one_bad_dependency_does_not_hide_others() {
        let good = dep_with_verify("good", vec!["echo".into(), "1.0.0".into()]);
        let bad = dep_with_verify("bad", vec!["false".into()]);
        let engine = engine_of(vec![bad, good]);

        let statuses = engine.check_all().unwrap();
        assert!(statuses["good"].installed);
        assert!(statuses["good"].satisfied());
        assert!(!statuses["bad"].installed);
        assert!(statuses["bad"].error.is_some());
    }

    #[cfg(unix)]
    #[test]
    fn up_to_date_dependency_is_satisfied() {
        let mut dep = dep_with_verify("tool", vec!["echo".into(), "1.0.0".into()]);
        dep.version.constraint = Some("^1.0.0".to_string());
        let engine = engine_of(vec![dep]);

        let statuses = engine.check_all().unwrap();
        let status = &statuses["tool"];
        assert!(status.installed);
        assert!(status.compatible);
        assert_eq!(status.required_update, UpdateKind::None);
        assert_eq!(status.current_version, "1.0.0");
    }

    #[cfg(unix)]
    #[test]
    fn outdated_dependency_reports_update_class() {
        let mut dep = dep_with_verify("tool", vec!["echo".into(), "1.2.3".into()]);
        dep.version.required = "2.0.0".to_string();
        let engine = engine_of(vec![dep]);

        let statuses = engine.check_all().unwrap();
        assert_eq!(statuses["tool"].required_update, UpdateKind::Major);
        assert!(!statuses["tool"].satisfied());
    }

    #[cfg(unix)]
    #[test]
    fn unparseable_version_recorded_not_raised() {
        let dep = dep_with_verify("tool", vec!["echo".into(), "garbage".into()]);
        let engine = engine_of(vec![dep]);

        let statuses = engine.check_all().unwrap();
        let status = &statuses["tool"];
        assert!(status.installed);
        assert!(status.error.as_deref().unwrap().contains("Invalid version"));
    }

    #[cfg(unix)]
    #[test]
    fn verify_banner_version_is_cleaned() {
        let dep = dep_with_verify(
            "tool",
            vec!["echo".into(), "tool version 1.0.0-beta built today".into()],
        );
        let engine = engine_of(vec![dep]);

        let statuses = engine.check_all().unwrap();
        assert_eq!(statuses["tool"].current_version, "1.0.0");
    }

    #[cfg(unix)]
    #[test]
    fn install_failure_includes_output() {
        let mut dep = dep_with_verify("tool", vec!["false".into()]);
        dep.platforms.get_mut(TEST_PLATFORM).unwrap().commands.install =
            vec!["sh".into(), "-c".into(), "echo broken install; exit 1".into()];
        let engine = engine_of(vec![dep.clone()]);

        let err = engine.install_dependency(&dep).unwrap_err();
        match err {
            DepmanError::InstallFailed { message, .. } => {
                assert!(message.contains("broken install"));
            }
            other => panic!("expected InstallFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn install_without_command_fails() {
        let dep = dep_with_verify("tool", vec!["true".into()]);
        let engine = engine_of(vec![dep.clone()]);
        let err = engine.install_dependency(&dep).unwrap_err();
        assert!(matches!(err, DepmanError::InstallFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn environment_spec_feeds_accumulator() {
        let mut dep = dep_with_verify("tool", vec!["echo".into(), "1.0.0".into()]);
        dep.platforms.get_mut(TEST_PLATFORM).unwrap().commands.install = vec!["true".into()];
        dep.environment = EnvironmentSpec {
            path: vec!["/opt/tool/bin".to_string()],
            variables: HashMap::from([("TOOL_HOME".to_string(), "/opt/tool".to_string())]),
        };
        let mut engine = engine_of(vec![dep.clone()]);
        engine.install_dependency(&dep).unwrap();
        engine.setup_environment(&dep);

        assert_eq!(engine.environment().paths(), &[PathBuf::from("/opt/tool/bin")]);
        assert_eq!(
            engine.environment().variables().get("TOOL_HOME").unwrap(),
            "/opt/tool"
        );

        let merged = engine.updated_environment();
        assert!(merged.iter().any(|(k, v)| k == "TOOL_HOME" && v == "/opt/tool"));
    }
}
