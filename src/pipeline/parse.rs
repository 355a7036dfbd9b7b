//! Document loading with context for error messages.

use crate::model::Sbom;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read and parse an SBOM of either dialect.
pub fn load_sbom(path: &Path) -> Result<Sbom> {
    tracing::debug!("Parsing SBOM: {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read SBOM file: {}", path.display()))?;
    let sbom = Sbom::from_json_str(&content)
        .with_context(|| format!("Failed to parse SBOM: {}", path.display()))?;

    tracing::info!(
        "Parsed {} {} with {} items",
        sbom.format(),
        path.display(),
        sbom.item_count()
    );
    Ok(sbom)
}

/// Read a JSON input file of a known shape (e.g. parsed Dockerfile).
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Read a text input file.
pub fn load_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
