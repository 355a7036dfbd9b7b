//! Base-images command handler.

use super::emit;
use crate::base_images::{embed_base_images, last_stage_is_scratch, parse_digests, ParsedDockerfile};
use crate::config::AppConfig;
use crate::pipeline::{exit_codes, load_json, load_sbom, load_text};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;

/// Inputs of the base-images command.
#[derive(Debug, Clone)]
pub struct BaseImagesArgs {
    pub sbom: PathBuf,
    /// `repository:tag@digest` per line, in stage order
    pub digests: PathBuf,
    /// `FROM` images, one per line; decides whether the last stage is scratch
    pub dockerfile_images: Option<PathBuf>,
    /// `dockerfile-json` output, used instead of `dockerfile_images`
    pub parsed_dockerfile: Option<PathBuf>,
}

/// Run the base-images command.
pub fn run_base_images(args: &BaseImagesArgs, config: &AppConfig) -> Result<i32> {
    let mut sbom = load_sbom(&args.sbom)?;
    let images = parse_digests(&load_text(&args.digests)?)
        .with_context(|| format!("Invalid image digests in {}", args.digests.display()))?;

    let last_is_scratch = match (&args.parsed_dockerfile, &args.dockerfile_images) {
        (Some(path), _) => load_json::<ParsedDockerfile>(path)?.last_is_scratch(),
        (None, Some(path)) => last_stage_is_scratch(&load_text(path)?),
        (None, None) => false,
    };

    embed_base_images(
        &mut sbom,
        &images,
        last_is_scratch,
        Utc::now(),
        &config.synthesis_options(),
    )
    .context("Failed to embed base images")?;
    tracing::info!("Embedded {} base image references", images.len());

    emit(&sbom, config)?;
    Ok(exit_codes::SUCCESS)
}
