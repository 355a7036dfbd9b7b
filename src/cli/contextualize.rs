//! Contextualize command handler.

use super::emit;
use crate::base_images::ParsedDockerfile;
use crate::config::AppConfig;
use crate::model::Sbom;
use crate::pipeline::{exit_codes, load_json, load_sbom};
use crate::provenance::{
    create_contextual_sbom, fetch_parent_sbom, host_platform, uses_contextual_sbom,
    FileParentSbomSource,
};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Inputs of the contextualize command.
#[derive(Debug, Clone)]
pub struct ContextualizeArgs {
    pub component: PathBuf,
    /// Already downloaded SBOM of the parent image
    pub parent: PathBuf,
    /// `dockerfile-json` output naming the parent image
    pub parsed_dockerfile: Option<PathBuf>,
    /// Build target stage when it is not the last one
    pub target_stage: Option<String>,
}

/// Graft the parent image SBOM under the component SBOM.
///
/// A scratch build, a missing parent SBOM or a non-SPDX document leaves the
/// component document unchanged.
pub fn run_contextualize(args: &ContextualizeArgs, config: &AppConfig) -> Result<i32> {
    let component = load_sbom(&args.component)?;

    let pullspec = match &args.parsed_dockerfile {
        Some(path) => load_json::<ParsedDockerfile>(path)?
            .parent_image_pullspec(args.target_stage.as_deref())
            .context("Failed to determine the parent image")?,
        None => Some(args.parent.display().to_string()),
    };
    let platform = config
        .provenance
        .platform
        .clone()
        .unwrap_or_else(host_platform);

    let source = FileParentSbomSource::new(&args.parent);
    let parent = fetch_parent_sbom(&source, pullspec.as_deref(), &platform)?;

    let output = match (component, parent) {
        (Sbom::Spdx(component), Some(Sbom::Spdx(parent))) => {
            let (merged, report) = create_contextual_sbom(
                &component,
                &parent,
                &config.provenance.base_image_property,
            )
            .context("Failed to create contextual SBOM")?;
            tracing::info!(
                "Parent lineage {:?}, {} self-references renamed, {} builder packages stripped",
                report.parent_lineage,
                report.renamed_relationships,
                report.stripped.packages
            );
            Sbom::Spdx(merged)
        }
        (component, parent) => {
            let reason = match &parent {
                None => "no parent SBOM",
                Some(parent) if !uses_contextual_sbom(parent) => "parent SBOM is not SPDX",
                Some(_) => "component SBOM is not SPDX",
            };
            tracing::warn!("Contextual SBOM not created ({reason}), writing the component SBOM unchanged");
            component
        }
    };

    emit(&output, config)?;
    Ok(exit_codes::SUCCESS)
}
