//! Configuration types for sbom-merge operations.

use crate::base_images::{SynthesisOptions, BUILDER_IMAGE_PROPERTY, DEFAULT_ANNOTATOR};
use crate::merge::Flavour;
use crate::model::SbomFormat;
use crate::provenance::BASE_IMAGE_PROPERTY;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default JSON indentation of written documents.
pub const DEFAULT_INDENT: usize = 2;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// CLI arguments are layered over file settings with [`AppConfig::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// N-way merge defaults
    pub merge: MergeConfig,
    /// Contextual SBOM creation
    pub provenance: ProvenanceConfig,
    /// Base-image component synthesis
    pub base_images: BaseImagesConfig,
    /// Output configuration (file, indentation)
    pub output: OutputConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Property names and annotator for base-image synthesis.
    #[must_use]
    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            builder_property: self.base_images.builder_property.clone(),
            base_image_property: self.provenance.base_image_property.clone(),
            annotator: self.base_images.annotator.clone(),
        }
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Require merge inputs to be in `format`.
    pub const fn format(mut self, format: SbomFormat) -> Self {
        self.config.merge.format = Some(format);
        self
    }

    /// Set the flavour assumed for an unprefixed first merge input.
    pub const fn default_first_flavour(mut self, flavour: Flavour) -> Self {
        self.config.merge.default_first_flavour = flavour;
        self
    }

    /// Set the flavour assumed for the remaining unprefixed merge inputs.
    pub const fn default_flavour(mut self, flavour: Flavour) -> Self {
        self.config.merge.default_flavour = flavour;
        self
    }

    /// Set the property that marks the parent image.
    pub fn base_image_property(mut self, property: impl Into<String>) -> Self {
        self.config.provenance.base_image_property = property.into();
        self
    }

    /// Override the `linux/<arch>` platform used to fetch parent SBOMs.
    pub fn platform(mut self, platform: Option<String>) -> Self {
        self.config.provenance.platform = platform;
        self
    }

    /// Set the annotator of synthesized SPDX annotations.
    pub fn annotator(mut self, annotator: impl Into<String>) -> Self {
        self.config.base_images.annotator = annotator.into();
        self
    }

    /// Set the property that marks builder-only images.
    pub fn builder_property(mut self, property: impl Into<String>) -> Self {
        self.config.base_images.builder_property = property.into();
        self
    }

    /// Set the output file.
    pub fn output_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.output.file = file;
        self
    }

    /// Set the JSON indentation; 0 writes compact JSON.
    pub const fn indent(mut self, indent: usize) -> Self {
        self.config.output.indent = indent;
        self
    }

    /// Build the `AppConfig`.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Section Types
// ============================================================================

/// N-way merge defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MergeConfig {
    /// Dialect every input must be in; detected from the inputs when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<SbomFormat>,
    /// Flavour of the first input when it carries no `flavour:` prefix
    pub default_first_flavour: Flavour,
    /// Flavour of the other inputs when they carry no prefix
    pub default_flavour: Flavour,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            format: None,
            default_first_flavour: Flavour::Cachi2,
            default_flavour: Flavour::Syft,
        }
    }
}

/// Contextual SBOM creation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ProvenanceConfig {
    /// Annotation property marking the parent image in legacy SBOMs
    pub base_image_property: String,
    /// Platform override, e.g. `linux/arm64`; the host platform otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self {
            base_image_property: BASE_IMAGE_PROPERTY.to_string(),
            platform: None,
        }
    }
}

/// Base-image synthesis settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BaseImagesConfig {
    pub annotator: String,
    pub builder_property: String,
}

impl Default for BaseImagesConfig {
    fn default() -> Self {
        Self {
            annotator: DEFAULT_ANNOTATOR.to_string(),
            builder_property: BUILDER_IMAGE_PROPERTY.to_string(),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file path (None for stdout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// JSON indentation width; 0 writes compact JSON
    pub indent: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: None,
            indent: DEFAULT_INDENT,
        }
    }
}
