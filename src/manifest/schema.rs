//! Manifest data model.
//!
//! These types mirror the YAML manifest schema. A [`Manifest`] is loaded once
//! at engine construction and treated as read-only for the process lifetime.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The entire dependency manifest file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Manifest format version.
    #[serde(default)]
    pub version: String,

    /// Application name.
    #[serde(default)]
    pub name: String,

    /// Application description.
    #[serde(default)]
    pub description: String,

    /// Declared dependencies, in installation order.
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
}

/// A single declared dependency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependencySpec {
    /// Unique name of the dependency.
    pub name: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Version requirements.
    #[serde(default)]
    pub version: VersionRequirement,

    /// Platform identifier → platform-specific configuration.
    #[serde(default)]
    pub platforms: HashMap<String, PlatformBundle>,

    /// Environment changes contributed on successful install.
    #[serde(default)]
    pub environment: EnvironmentSpec,

    /// Names of dependencies this one depends on.
    ///
    /// Recorded for documentation and `list` output only; installation runs
    /// in manifest order and does not consume this list.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Version requirements for a dependency.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VersionRequirement {
    /// Exact version required.
    #[serde(default)]
    pub required: String,

    /// Optional semver constraint (e.g. `^1.2.3`, `~1.2.0`, `>1.0.0 <2.0.0`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

/// Platform-specific installer and command configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlatformBundle {
    /// How to obtain the installer artifact.
    #[serde(default)]
    pub installer: InstallerSpec,

    /// Commands run against this platform.
    #[serde(default)]
    pub commands: CommandSet,
}

/// How to obtain a dependency's installer artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InstallerSpec {
    /// Installer type tag (e.g. "msi", "pkg", "tarball", "binary").
    #[serde(rename = "type", default)]
    pub kind: String,

    /// URL to download the installer from. Empty means no download step.
    #[serde(default)]
    pub url: String,

    /// Expected digest, formatted `sha256:<64-hex-chars>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Argument vectors for the per-platform operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommandSet {
    /// Install command. `{download_path}` is substituted in every argument.
    #[serde(default)]
    pub install: Vec<String>,

    /// Verify command; expected to print the installed version.
    #[serde(default)]
    pub verify: Vec<String>,

    /// Uninstall command. Parsed and listed, never invoked by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstall: Option<Vec<String>>,
}

/// Environment changes a dependency contributes once installed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentSpec {
    /// Directories to prepend to PATH.
    #[serde(default)]
    pub path: Vec<String>,

    /// Variable name → value assignments.
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

impl Manifest {
    /// Look up a dependency spec by name.
    pub fn dependency(&self, name: &str) -> Option<&DependencySpec> {
        self.dependencies.iter().find(|d| d.name == name)
    }
}

impl EnvironmentSpec {
    /// Whether this spec contributes nothing.
    pub fn is_empty(&self) -> bool {
        self.path.is_empty() && self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version: "1.0"
name: "My Application"
description: "Application dependencies"
dependencies:
  - name: "example-tool"
    description: "Example tool dependency"
    version:
      required: "1.0.0"
      constraint: "^1.0.0"
    platforms:
      linux:
        installer:
          type: "tarball"
          url: "https://example.com/tool-1.0.0-linux.tar.gz"
          checksum: "sha256:0000000000000000000000000000000000000000000000000000000000000000"
        commands:
          install: ["tar", "-xzf", "{download_path}", "-C", "/usr/local/bin"]
          verify: ["example-tool", "--version"]
    environment:
      path: ["/usr/local/bin"]
      variables:
        EXAMPLE_HOME: "/usr/local/example"
    dependencies: ["base-runtime"]
"#;

    #[test]
    fn parses_full_manifest() {
        let manifest: Manifest = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(manifest.name, "My Application");
        assert_eq!(manifest.dependencies.len(), 1);

        let dep = &manifest.dependencies[0];
        assert_eq!(dep.name, "example-tool");
        assert_eq!(dep.version.required, "1.0.0");
        assert_eq!(dep.version.constraint.as_deref(), Some("^1.0.0"));
        assert_eq!(dep.dependencies, vec!["base-runtime"]);

        let bundle = dep.platforms.get("linux").unwrap();
        assert_eq!(bundle.installer.kind, "tarball");
        assert!(bundle.installer.checksum.as_deref().unwrap().starts_with("sha256:"));
        assert_eq!(bundle.commands.verify, vec!["example-tool", "--version"]);
        assert!(bundle.commands.uninstall.is_none());

        assert_eq!(dep.environment.path, vec!["/usr/local/bin"]);
        assert_eq!(
            dep.environment.variables.get("EXAMPLE_HOME").unwrap(),
            "/usr/local/example"
        );
    }

    #[test]
    fn optional_fields_default() {
        let yaml = r#"
dependencies:
  - name: "minimal"
"#;
        let manifest: Manifest = serde_yaml::from_str(yaml).unwrap();
        let dep = &manifest.dependencies[0];
        assert!(dep.version.required.is_empty());
        assert!(dep.version.constraint.is_none());
        assert!(dep.platforms.is_empty());
        assert!(dep.environment.is_empty());
    }

    #[test]
    fn dependency_lookup_by_name() {
        let manifest: Manifest = serde_yaml::from_str(SAMPLE).unwrap();
        assert!(manifest.dependency("example-tool").is_some());
        assert!(manifest.dependency("missing").is_none());
    }
}
