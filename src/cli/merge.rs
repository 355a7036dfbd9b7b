//! Merge command handler.

use super::emit;
use crate::config::AppConfig;
use crate::merge::{merge_documents, FlavouredInput};
use crate::pipeline::{exit_codes, load_sbom};
use anyhow::{bail, Context, Result};

/// Run the merge command over `[flavour:]path` arguments.
pub fn run_merge(inputs: &[String], config: &AppConfig) -> Result<i32> {
    let inputs = FlavouredInput::parse_all(
        inputs,
        config.merge.default_first_flavour,
        config.merge.default_flavour,
    );

    let mut documents = Vec::with_capacity(inputs.len());
    for input in &inputs {
        let sbom = load_sbom(&input.path)?;
        if let Some(expected) = config.merge.format {
            if sbom.format() != expected {
                bail!(
                    "{} is {}, expected {}",
                    input.path.display(),
                    sbom.format(),
                    expected
                );
            }
        }
        tracing::debug!("{} input: {}", input.flavour, input.path.display());
        documents.push((input.flavour, sbom));
    }

    let merged = merge_documents(documents).context("Failed to merge SBOMs")?;
    tracing::info!("Merged document has {} items", merged.item_count());
    emit(&merged, config)?;
    Ok(exit_codes::SUCCESS)
}
