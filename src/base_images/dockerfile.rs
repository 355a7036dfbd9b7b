//! Base image facts from a parsed Dockerfile (`dockerfile-json` output).

use crate::error::{ProvenanceErrorKind, Result, SbomMergeError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The subset of `dockerfile-json` output that names base images.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParsedDockerfile {
    #[serde(default)]
    pub stages: Vec<Stage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stage {
    #[serde(default)]
    pub base_name: Option<String>,
    /// Stage alias (`FROM image AS alias`)
    #[serde(default, rename = "As")]
    pub alias: Option<String>,
    #[serde(default)]
    pub from: StageSource,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StageSource {
    /// Set when the stage is built from an earlier stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Value>,
    #[serde(default)]
    pub scratch: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ParsedDockerfile {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Pullspecs of all external base images in stage order; `None` stands
    /// for a `FROM scratch` stage.
    ///
    /// Stages built from earlier stages and `oci-archive:` bases are skipped.
    #[must_use]
    pub fn base_images(&self) -> Vec<Option<String>> {
        self.stages
            .iter()
            .filter(|stage| stage.from.stage.is_none())
            .filter_map(|stage| {
                if stage.from.scratch {
                    return Some(None);
                }
                stage
                    .base_name
                    .as_deref()
                    .filter(|name| !name.is_empty() && !name.starts_with("oci-archive:"))
                    .map(|name| Some(name.to_string()))
            })
            .collect()
    }

    /// Whether the final external base image is `scratch`.
    #[must_use]
    pub fn last_is_scratch(&self) -> bool {
        matches!(self.base_images().last(), Some(None))
    }

    /// Pullspec of the parent image: the last base image, or the base of
    /// `target_stage` resolved through stage aliases. `None` for scratch.
    pub fn parent_image_pullspec(&self, target_stage: Option<&str>) -> Result<Option<String>> {
        let base_images = self.base_images();
        if base_images.is_empty() {
            return Err(SbomMergeError::provenance(
                "finding parent image",
                ProvenanceErrorKind::NoBaseImages,
            ));
        }
        let Some(target) = target_stage else {
            return Ok(base_images.into_iter().last().flatten());
        };

        // Only earlier stages can be referenced, so one reverse pass resolves
        // chains of aliases.
        let mut last_ref = target.to_string();
        for stage in self.stages.iter().rev() {
            if stage.alias.as_deref() == Some(last_ref.as_str()) {
                if let Some(base_name) = &stage.base_name {
                    last_ref = base_name.clone();
                }
            }
        }
        if last_ref.eq_ignore_ascii_case("scratch") {
            return Ok(None);
        }
        Ok(Some(last_ref))
    }
}
