//! Configuration module for sbom-merge.
//!
//! This module provides:
//! - Type-safe configuration structures with a builder
//! - Validation for configuration values
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Configuration File
//!
//! Place a `.sbom-merge.yaml` file in your project root or `~/.config/sbom-merge/`:
//!
//! ```yaml
//! merge:
//!   format: spdx
//! provenance:
//!   platform: linux/arm64
//! output:
//!   indent: 4
//! ```

pub mod file;
mod types;
mod validation;

pub use types::{
    AppConfig, AppConfigBuilder, BaseImagesConfig, MergeConfig, OutputConfig, ProvenanceConfig,
    DEFAULT_INDENT,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, load_config_file, load_or_default,
    ConfigFileError,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// Editors can use it to validate and autocomplete `.sbom-merge.yaml` files.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}
