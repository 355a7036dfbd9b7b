//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler implements the business logic for a specific CLI subcommand
//! and returns the process exit code.

mod base_images;
mod config;
mod contextualize;
mod image_ref;
mod merge;
mod purls;

pub use base_images::{run_base_images, BaseImagesArgs};
pub use config::{run_config, ConfigAction};
pub use contextualize::{run_contextualize, ContextualizeArgs};
pub use image_ref::run_image_ref;
pub use merge::run_merge;
pub use purls::run_purls;

use crate::config::AppConfig;
use crate::pipeline::{render_json, write_output, OutputTarget};
use anyhow::Result;
use serde::Serialize;

/// Render `value` with the configured indentation and write it to the
/// configured target.
fn emit<T: Serialize>(value: &T, config: &AppConfig) -> Result<()> {
    let content = render_json(value, config.output.indent)?;
    write_output(&content, &OutputTarget::from_option(config.output.file.clone()))
}
