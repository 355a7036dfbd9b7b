//! Where parent image SBOMs come from.

use crate::error::{ErrorContext, Result, SbomMergeError};
use crate::model::Sbom;
use std::path::PathBuf;

/// Supplies the SBOM of a parent image.
///
/// `Ok(None)` means the image has no SBOM, which is not an error: a
/// parent-less or unattested image is a valid build input.
pub trait ParentSbomSource {
    fn download_parent_sbom(&self, pullspec: &str, platform: &str) -> Result<Option<Sbom>>;
}

/// Serves a parent SBOM that was already fetched to disk.
#[derive(Debug, Clone)]
pub struct FileParentSbomSource {
    path: PathBuf,
}

impl FileParentSbomSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ParentSbomSource for FileParentSbomSource {
    fn download_parent_sbom(&self, pullspec: &str, platform: &str) -> Result<Option<Sbom>> {
        if !self.path.exists() {
            tracing::warn!(
                "No SBOM found for '{pullspec}' ({platform}) at {}",
                self.path.display()
            );
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| SbomMergeError::io(&self.path, e))?;
        let sbom = Sbom::from_json_str(&content)
            .with_context(|| format!("parsing parent SBOM of '{pullspec}'"))?;
        tracing::debug!("Loaded parent SBOM for '{pullspec}' from {}", self.path.display());
        Ok(Some(sbom))
    }
}

/// Translate a `uname -m` machine name into a `linux/<arch>` platform string.
#[must_use]
pub fn platform_for_arch(raw: &str) -> String {
    let arch = match raw {
        "x86_64" | "x64" => "amd64",
        "arm" | "aarch64" | "aarch64_be" | "armv8b" | "armv8l" => "arm64",
        "powerpc" | "powerpc64" | "ppc" | "ppc64" | "ppcle" => "ppc64le",
        "s390" => "s390x",
        other => other,
    };
    format!("linux/{arch}")
}

/// Platform string of the running host.
#[must_use]
pub fn host_platform() -> String {
    platform_for_arch(std::env::consts::ARCH)
}
