//! Starter manifest generation.

use crate::error::Result;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

/// Template written by `depman generate`.
pub const MANIFEST_TEMPLATE: &str = r#"# Dependency manifest for depman
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
      windows:
        installer:
          type: "msi"
          url: "https://example.com/tool-1.0.0-windows.msi"
          checksum: "sha256:0000000000000000000000000000000000000000000000000000000000000000"
        commands:
          install: ["msiexec", "/i", "{download_path}", "/quiet"]
          verify: ["example-tool", "--version"]
          uninstall: ["msiexec", "/x", "{download_path}", "/quiet"]
      linux:
        installer:
          type: "tarball"
          url: "https://example.com/tool-1.0.0-linux.tar.gz"
          checksum: "sha256:0000000000000000000000000000000000000000000000000000000000000000"
        commands:
          install: ["tar", "-xzf", "{download_path}", "-C", "/usr/local/bin"]
          verify: ["example-tool", "--version"]
      macos:
        installer:
          type: "pkg"
          url: "https://example.com/tool-1.0.0-macos.pkg"
          checksum: "sha256:0000000000000000000000000000000000000000000000000000000000000000"
        commands:
          install: ["installer", "-pkg", "{download_path}", "-target", "/"]
          verify: ["example-tool", "--version"]
    environment:
      path: ["/usr/local/bin"]
      variables:
        EXAMPLE_HOME: "/usr/local/example"
"#;

/// Write the starter template to `path`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn write_template(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(io::Error::new(
            ErrorKind::AlreadyExists,
            format!("{} already exists (use --force to overwrite)", path.display()),
        )
        .into());
    }
    fs::write(path, MANIFEST_TEMPLATE)?;
    Ok(())
}
