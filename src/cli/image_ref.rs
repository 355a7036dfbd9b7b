//! Image-ref command handler.

use super::emit;
use crate::base_images::ImageReference;
use crate::config::AppConfig;
use crate::image_ref::add_image_reference;
use crate::pipeline::{exit_codes, load_sbom};
use anyhow::{Context, Result};
use std::path::Path;

/// Make the image at `image_url` (`repository:tag`) pinned by `image_digest`
/// the subject of the SBOM.
pub fn run_image_ref(
    sbom_path: &Path,
    image_url: &str,
    image_digest: &str,
    config: &AppConfig,
) -> Result<i32> {
    let image = ImageReference::from_url_and_digest(image_url, image_digest)
        .context("Invalid image reference")?;
    let mut sbom = load_sbom(sbom_path)?;
    add_image_reference(&mut sbom, &image);
    tracing::info!("Added image reference {image}");

    emit(&sbom, config)?;
    Ok(exit_codes::SUCCESS)
}
