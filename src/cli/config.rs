//! Config command handler.

use crate::config::{generate_example_config, generate_json_schema, AppConfig, Validatable};
use crate::pipeline::{exit_codes, write_output, OutputTarget};
use anyhow::{Context, Result};
use std::path::Path;

/// What the config command prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Effective configuration (defaults, file, CLI overrides)
    Show,
    /// JSON Schema of the config file
    Schema,
    /// Example config file
    Example,
}

/// Print configuration information to stdout.
///
/// `show` also reports validation problems and exits with an error code
/// when there are any.
pub fn run_config(
    action: ConfigAction,
    config: &AppConfig,
    loaded_from: Option<&Path>,
) -> Result<i32> {
    let content = match action {
        ConfigAction::Show => {
            match loaded_from {
                Some(path) => tracing::info!("Loaded config from {}", path.display()),
                None => tracing::info!("No config file found, using defaults"),
            }
            let errors = config.validate();
            for error in &errors {
                tracing::error!("Invalid config: {error}");
            }
            let content = serde_yaml::to_string(config).context("Failed to render config")?;
            if !errors.is_empty() {
                write_output(&content, &OutputTarget::Stdout)?;
                return Ok(exit_codes::ERROR);
            }
            content
        }
        ConfigAction::Schema => generate_json_schema(),
        ConfigAction::Example => generate_example_config(),
    };
    write_output(&content, &OutputTarget::Stdout)?;
    Ok(exit_codes::SUCCESS)
}
