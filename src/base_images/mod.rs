//! Base-image component synthesis.
//!
//! Records which images took part in a multi-stage build. Every base image
//! becomes a `container` component whose properties say whether it was only
//! a builder (`is_builder_image:for_stage = <index>`) or the base of the final
//! image (`is_base_image = true`). The components are then embedded into the
//! artifact's own SBOM: CycloneDX gets a `formulation` entry, SPDX gets
//! packages linked to the described element with `BUILD_TOOL_OF`.

mod dockerfile;
mod reference;

pub use dockerfile::{ParsedDockerfile, Stage, StageSource};
pub use reference::ImageReference;

use crate::error::{Result, SbomMergeError};
use crate::model::{
    Annotation, CdxComponent, CdxFormula, CdxProperty, CycloneDxBom, ExternalRef, Relationship,
    RelationshipType, Sbom, SpdxDocument, SpdxPackage,
};
use crate::provenance::BASE_IMAGE_PROPERTY;
use chrono::{DateTime, Utc};
use serde_json::{json, Map};
use sha2::{Digest, Sha256};

/// Property marking images used only by intermediate stages.
pub const BUILDER_IMAGE_PROPERTY: &str = "konflux:container:is_builder_image:for_stage";

/// Annotator of the JSON-encoded property annotations in SPDX output.
pub const DEFAULT_ANNOTATOR: &str = "Tool: konflux:jsonencoded";

/// Property names and annotator used when synthesizing components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOptions {
    pub builder_property: String,
    pub base_image_property: String,
    pub annotator: String,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            builder_property: BUILDER_IMAGE_PROPERTY.to_string(),
            base_image_property: BASE_IMAGE_PROPERTY.to_string(),
            annotator: DEFAULT_ANNOTATOR.to_string(),
        }
    }
}

/// Whether the last line of a `FROM` image list is `scratch`.
#[must_use]
pub fn last_stage_is_scratch(dockerfile_images: &str) -> bool {
    dockerfile_images
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        == Some("scratch")
}

/// Parse one `repository:tag@digest` reference per non-empty line.
pub fn parse_digests(content: &str) -> Result<Vec<ImageReference>> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ImageReference::parse)
        .collect()
}

/// One `container` component per distinct image, in first-use order.
///
/// An image used by several stages gets one component carrying a property
/// for every use.
#[must_use]
pub fn base_image_components(
    images: &[ImageReference],
    last_is_scratch: bool,
    options: &SynthesisOptions,
) -> Vec<CdxComponent> {
    let mut components: Vec<CdxComponent> = Vec::new();
    for (index, image) in images.iter().enumerate() {
        let is_final_base = index + 1 == images.len() && !last_is_scratch;
        let property = if is_final_base {
            CdxProperty::new(&options.base_image_property, "true")
        } else {
            CdxProperty::new(&options.builder_property, index.to_string())
        };

        let purl = image.purl();
        match components
            .iter_mut()
            .find(|c| c.purl.as_deref() == Some(purl.as_str()))
        {
            Some(existing) => existing.properties.push(property),
            None => {
                let mut component = CdxComponent::new("container", &image.repository);
                component.purl = Some(purl);
                component.properties.push(property);
                components.push(component);
            }
        }
    }
    tracing::debug!(
        "Synthesized {} base image components from {} images",
        components.len(),
        images.len()
    );
    components
}

/// Append the components as a new `formulation` entry.
pub fn embed_cyclonedx(bom: &mut CycloneDxBom, components: Vec<CdxComponent>) {
    bom.formulation.get_or_insert_with(Vec::new).push(CdxFormula {
        components,
        extra: Map::new(),
    });
}

/// Add one package per component plus a `BUILD_TOOL_OF` edge to the
/// described element.
pub fn embed_spdx(
    doc: &mut SpdxDocument,
    components: &[CdxComponent],
    date: DateTime<Utc>,
    options: &SynthesisOptions,
) -> Result<()> {
    let described = doc
        .describes_target()
        .ok_or_else(|| SbomMergeError::missing_describes("embedding base images"))?
        .to_string();
    let annotation_date = date.format("%Y-%m-%dT%H:%M:%SZ").to_string();

    for component in components {
        let package = base_image_package(component, &annotation_date, options);
        doc.relationships.push(Relationship::new(
            package.spdx_id.clone(),
            RelationshipType::BuildToolOf,
            described.clone(),
        ));
        doc.packages.push(package);
    }
    Ok(())
}

fn base_image_package(
    component: &CdxComponent,
    annotation_date: &str,
    options: &SynthesisOptions,
) -> SpdxPackage {
    let purl = component.purl.clone().unwrap_or_default();
    let mut package = SpdxPackage::new(image_spdx_id(&component.name, &purl), &component.name);
    package.download_location = Some("NOASSERTION".to_string());
    package.external_refs.push(ExternalRef::purl(purl));
    package.annotations = component
        .properties
        .iter()
        .map(|property| Annotation {
            annotator: options.annotator.clone(),
            annotation_date: annotation_date.to_string(),
            annotation_type: "OTHER".to_string(),
            comment: json!({"name": property.name, "value": property.value}).to_string(),
        })
        .collect();
    package
}

/// `SPDXRef-Image-<name>-<sha256(purl)>` with characters SPDX ids do not
/// allow replaced by `-`.
///
/// Older SBOMs embedded the repository unsanitized, so ids generated here
/// deliberately differ from theirs for any repository containing `/` or `:`.
#[must_use]
pub fn image_spdx_id(name: &str, purl: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '-' })
        .collect();
    format!("SPDXRef-Image-{sanitized}-{:x}", Sha256::digest(purl.as_bytes()))
}

/// Synthesize base-image components and embed them into `sbom`.
pub fn embed_base_images(
    sbom: &mut Sbom,
    images: &[ImageReference],
    last_is_scratch: bool,
    date: DateTime<Utc>,
    options: &SynthesisOptions,
) -> Result<()> {
    let components = base_image_components(images, last_is_scratch, options);
    match sbom {
        Sbom::CycloneDx(bom) => {
            embed_cyclonedx(bom, components);
            Ok(())
        }
        Sbom::Spdx(doc) => embed_spdx(doc, &components, date, options),
    }
}
