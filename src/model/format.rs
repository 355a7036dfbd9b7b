//! SBOM dialect detection.

use super::{CycloneDxBom, SpdxDocument};
use crate::error::{ParseErrorKind, Result, SbomMergeError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Supported SBOM dialects.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SbomFormat {
    /// CycloneDX 1.x JSON
    #[default]
    #[value(name = "cyclonedx")]
    CycloneDx,
    /// SPDX 2.x JSON
    #[value(name = "spdx")]
    Spdx,
}

impl SbomFormat {
    /// Detect the dialect of a raw JSON document.
    ///
    /// SPDX is recognised by `spdxVersion` starting with `SPDX-2`, CycloneDX by
    /// `bomFormat == "CycloneDX"` with a `1.x` `specVersion`.
    pub fn detect(value: &Value) -> Result<Self> {
        if let Some(version) = value.get("spdxVersion") {
            let version = version.as_str().unwrap_or_default();
            if version.starts_with("SPDX-2") {
                return Ok(Self::Spdx);
            }
            return Err(unsupported(version, "SPDX-2.x"));
        }

        if value.get("bomFormat").and_then(Value::as_str) == Some("CycloneDX") {
            let version = value
                .get("specVersion")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if version.starts_with("1.") {
                return Ok(Self::CycloneDx);
            }
            return Err(unsupported(version, "CycloneDX 1.x"));
        }

        Err(SbomMergeError::parse(
            "detecting SBOM format",
            ParseErrorKind::UnknownFormat,
        ))
    }
}

fn unsupported(version: &str, supported: &str) -> SbomMergeError {
    SbomMergeError::parse(
        "detecting SBOM format",
        ParseErrorKind::UnsupportedVersion {
            version: version.to_string(),
            supported: supported.to_string(),
        },
    )
}

impl fmt::Display for SbomFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycloneDx => f.write_str("CycloneDX"),
            Self::Spdx => f.write_str("SPDX"),
        }
    }
}

/// A parsed document of either dialect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Sbom {
    CycloneDx(CycloneDxBom),
    Spdx(SpdxDocument),
}

impl Sbom {
    /// Parse a JSON value after detecting its dialect.
    pub fn from_value(value: Value) -> Result<Self> {
        match SbomFormat::detect(&value)? {
            SbomFormat::CycloneDx => Ok(Self::CycloneDx(serde_json::from_value(value)?)),
            SbomFormat::Spdx => Ok(Self::Spdx(serde_json::from_value(value)?)),
        }
    }

    /// Parse a JSON string after detecting its dialect.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    #[must_use]
    pub const fn format(&self) -> SbomFormat {
        match self {
            Self::CycloneDx(_) => SbomFormat::CycloneDx,
            Self::Spdx(_) => SbomFormat::Spdx,
        }
    }

    /// Number of components or packages.
    #[must_use]
    pub fn item_count(&self) -> usize {
        match self {
            Self::CycloneDx(bom) => bom.components.len(),
            Self::Spdx(doc) => doc.packages.len(),
        }
    }
}
