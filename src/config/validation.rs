//! Configuration validation for sbom-merge.

use super::types::{AppConfig, BaseImagesConfig, MergeConfig, OutputConfig, ProvenanceConfig};

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.merge.validate());
        errors.extend(self.provenance.validate());
        errors.extend(self.base_images.validate());
        errors.extend(self.output.validate());
        errors
    }
}

impl Validatable for MergeConfig {
    fn validate(&self) -> Vec<ConfigError> {
        // Enum fields are checked by deserialization.
        Vec::new()
    }
}

impl Validatable for ProvenanceConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.base_image_property.trim().is_empty() {
            errors.push(ConfigError::new(
                "provenance.base_image_property",
                "Property name must not be empty",
            ));
        }
        if let Some(ref platform) = self.platform {
            let valid = platform
                .split_once('/')
                .is_some_and(|(os, arch)| !os.is_empty() && !arch.is_empty());
            if !valid {
                errors.push(ConfigError::new(
                    "provenance.platform",
                    format!("Platform must look like 'linux/amd64', got '{platform}'"),
                ));
            }
        }
        errors
    }
}

impl Validatable for BaseImagesConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.annotator.trim().is_empty() {
            errors.push(ConfigError::new(
                "base_images.annotator",
                "Annotator must not be empty",
            ));
        }
        if self.builder_property.trim().is_empty() {
            errors.push(ConfigError::new(
                "base_images.builder_property",
                "Property name must not be empty",
            ));
        }
        errors
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if let Some(ref file_path) = self.file {
            if let Some(parent) = file_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    errors.push(ConfigError::new(
                        "output.file",
                        format!("Parent directory does not exist: {}", parent.display()),
                    ));
                }
            }
        }

        if self.indent > 16 {
            errors.push(ConfigError::new(
                "output.indent",
                format!("Indent must be at most 16, got {}", self.indent),
            ));
        }

        errors
    }
}
