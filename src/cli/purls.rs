//! Purls command handler.

use super::emit;
use crate::config::AppConfig;
use crate::pipeline::{exit_codes, load_sbom};
use crate::purls::purl_listing;
use anyhow::Result;
use std::path::Path;

/// List every purl of the SBOM for content scanners.
pub fn run_purls(sbom_path: &Path, config: &AppConfig) -> Result<i32> {
    let sbom = load_sbom(sbom_path)?;
    emit(&purl_listing(&sbom), config)?;
    Ok(exit_codes::SUCCESS)
}
