//! Installer artifact download with streaming checksum verification.
//!
//! Bytes are hashed as they are written, so a download is a single pass over
//! the response body with no re-read. A file that fails verification is
//! deleted before the error is returned — a mismatched artifact must never be
//! left on disk where a later install step could pick it up.

use crate::error::{DepmanError, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("depman/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Information about a completed download.
#[derive(Debug, Clone)]
pub struct Downloaded {
    /// Full path to the downloaded file.
    pub path: PathBuf,

    /// Size in bytes.
    pub size: u64,

    /// Computed hex digest, when verification was requested.
    pub checksum: Option<String>,
}

/// Download `url` into `dest_dir`, verifying against `checksum` when given.
///
/// The destination directory is created if absent and the filename is derived
/// from the URL's final path segment. `checksum` uses the manifest format
/// `sha256:<hex>`; only sha256 is supported.
///
/// # Errors
///
/// - `UnsupportedAlgorithm` for any algorithm tag other than `sha256`
/// - `Download` for network failures and non-2xx responses
/// - `ChecksumMismatch` when the computed digest differs (the file is removed
///   first)
pub fn download(url: &str, dest_dir: &Path, checksum: Option<&str>) -> Result<Downloaded> {
    let expected = checksum.map(parse_checksum).transpose()?;

    fs::create_dir_all(dest_dir)?;
    let dest_path = dest_dir.join(filename_from_url(url));

    debug!("Downloading {} to {}", url, dest_path.display());

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| DepmanError::Download {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let mut response = client.get(url).send().map_err(|e| DepmanError::Download {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    if !response.status().is_success() {
        return Err(DepmanError::Download {
            url: url.to_string(),
            message: format!("bad status: {}", response.status()),
        });
    }

    let mut file = File::create(&dest_path)?;
    let mut hasher = expected.as_ref().map(|_| Sha256::new());
    let mut size: u64 = 0;
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = response.read(&mut buf).map_err(|e| DepmanError::Download {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        if let Some(h) = hasher.as_mut() {
            h.update(&buf[..n]);
        }
        size += n as u64;
    }
    file.flush()?;
    drop(file);

    let actual = hasher.map(|h| hex::encode(h.finalize()));

    if let (Some(expected), Some(actual)) = (&expected, &actual) {
        if !expected.eq_ignore_ascii_case(actual) {
            let _ = fs::remove_file(&dest_path);
            return Err(DepmanError::ChecksumMismatch {
                expected: expected.clone(),
                actual: actual.clone(),
            });
        }
    }

    debug!("Downloaded {} bytes to {}", size, dest_path.display());

    Ok(Downloaded {
        path: dest_path,
        size,
        checksum: actual,
    })
}

/// Parse a manifest checksum string into its expected hex digest.
fn parse_checksum(checksum: &str) -> Result<String> {
    let (algorithm, digest) =
        checksum
            .split_once(':')
            .ok_or_else(|| DepmanError::UnsupportedAlgorithm {
                algorithm: checksum.to_string(),
            })?;

    if !algorithm.eq_ignore_ascii_case("sha256") {
        return Err(DepmanError::UnsupportedAlgorithm {
            algorithm: algorithm.to_string(),
        });
    }

    Ok(digest.to_string())
}

/// Derive a local filename from the URL's final path segment.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|segments| segments.last().map(str::to_string))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "download".to_string())
}
