//! Model Provisioning
//!
//! Guarantees the artifact exists on local storage before it is loaded,
//! downloading it once when it is missing. No checksum, retry, or resume.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::utils::error::{InferenceError, Result};
use crate::utils::format_bytes;

/// Something that can stream the artifact for a URL into a sink
pub trait ArtifactSource {
    /// Write the body to `sink`, returning the number of bytes written
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64>;
}

/// Blocking HTTP(S) GET through reqwest
pub struct HttpArtifactSource {
    client: reqwest::blocking::Client,
}

impl HttpArtifactSource {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cassava_inference/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| InferenceError::Provisioning(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl ArtifactSource for HttpArtifactSource {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| InferenceError::Provisioning(format!("Failed to download: {}", e)))?;

        response
            .copy_to(sink)
            .map_err(|e| InferenceError::Provisioning(format!("Failed to read response: {}", e)))
    }
}

/// Ensure the artifact is present at `path`, fetching it from `url` if absent
///
/// Returns the path on success. When the file already exists the source is
/// never consulted. The body is streamed into a sibling `.part` file that is
/// renamed only once complete, so a failed fetch leaves nothing behind.
pub fn ensure_artifact(path: &Path, url: &str, source: &dyn ArtifactSource) -> Result<PathBuf> {
    if path.is_file() {
        debug!("Model artifact already present at {}", path.display());
        return Ok(path.to_path_buf());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            InferenceError::Provisioning(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    info!("Downloading model from {}", url);
    let staging = staging_path(path);
    let written = download_to(&staging, path, url, source).inspect_err(|_| {
        let _ = fs::remove_file(&staging);
    })?;

    info!(
        "Model downloaded successfully to {} ({})",
        path.display(),
        format_bytes(written)
    );

    Ok(path.to_path_buf())
}

fn download_to(staging: &Path, path: &Path, url: &str, source: &dyn ArtifactSource) -> Result<u64> {
    let write_error =
        |e: std::io::Error| InferenceError::Provisioning(format!("Failed to write {}: {}", staging.display(), e));

    let mut file = fs::File::create(staging).map_err(write_error)?;
    let written = source.fetch(url, &mut file)?;

    if written == 0 {
        return Err(InferenceError::Provisioning(format!("Empty response from {}", url)));
    }

    file.sync_all().map_err(write_error)?;
    drop(file);

    fs::rename(staging, path).map_err(write_error)?;
    Ok(written)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}
