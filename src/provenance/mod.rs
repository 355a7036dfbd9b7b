//! Parent image provenance.
//!
//! A component image SBOM is made *contextual* by grafting its parent image's
//! SBOM beneath it. The parent document is first normalised:
//!
//! 1. legacy `BUILD_TOOL_OF` base-image edges become `DESCENDANT_OF` ([`establish_lineage`])
//! 2. the parent's generic self-reference is renamed to the id the component
//!    uses for its parent ([`disambiguate_self_references`])
//! 3. build tooling records are dropped ([`strip_builder_records`])
//!
//! and the result is merged into the component with apparent sameness.

mod builders;
mod disambiguate;
mod lineage;
mod source;

pub use builders::{strip_builder_records, BuilderStripSummary};
pub use disambiguate::{disambiguate_self_references, parent_identifier, self_reference};
pub use lineage::{
    establish_lineage, find_marked_base_image, marks_property, LineageOutcome, LineageState,
    BASE_IMAGE_PROPERTY,
};
pub use source::{host_platform, platform_for_arch, FileParentSbomSource, ParentSbomSource};

use crate::error::{ErrorContext, Result};
use crate::merge::{merge_spdx, MergePolicy};
use crate::model::{Sbom, SpdxDocument};

/// What happened to a parent document during contextualization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextualizeReport {
    pub component_lineage: LineageOutcome,
    pub parent_state: LineageState,
    pub parent_lineage: LineageOutcome,
    pub renamed_relationships: usize,
    pub stripped: BuilderStripSummary,
}

/// Whether a parent document supports contextual SBOM creation.
#[must_use]
pub fn uses_contextual_sbom(parent: &Sbom) -> bool {
    match parent {
        Sbom::Spdx(_) => true,
        Sbom::CycloneDx(_) => {
            tracing::debug!("Parent SBOM is CycloneDX, contextual SBOM creation is skipped");
            false
        }
    }
}

/// Fetch the parent SBOM for a pullspec; no pullspec means a scratch build.
pub fn fetch_parent_sbom(
    source: &dyn ParentSbomSource,
    pullspec: Option<&str>,
    platform: &str,
) -> Result<Option<Sbom>> {
    match pullspec {
        Some(pullspec) => source.download_parent_sbom(pullspec, platform),
        None => {
            tracing::debug!("No parent image, the component is built from scratch");
            Ok(None)
        }
    }
}

/// Normalise a downloaded parent document for grafting under `component`.
///
/// `component` must already state its own lineage with a `DESCENDANT_OF` edge.
pub fn contextualize_parent(
    parent: &SpdxDocument,
    component: &SpdxDocument,
    property: &str,
) -> Result<(SpdxDocument, ContextualizeReport)> {
    let parent_id = parent_identifier(component)?;
    let mut parent = parent.clone();

    let parent_state = LineageState::classify(&parent, property);
    let parent_lineage = establish_lineage(&mut parent, &parent_state);
    let renamed_relationships = disambiguate_self_references(&mut parent, parent_id)
        .context("disambiguating parent SBOM")?;
    let stripped = strip_builder_records(&mut parent);

    let report = ContextualizeReport {
        component_lineage: LineageOutcome::AlreadyContextual,
        parent_state,
        parent_lineage,
        renamed_relationships,
        stripped,
    };
    Ok((parent, report))
}

/// Merge a contextualized parent document into the component document.
pub fn graft_parent(component: &SpdxDocument, parent: &SpdxDocument) -> Result<SpdxDocument> {
    merge_spdx(component, parent, MergePolicy::ApparentSameness).context("grafting parent SBOM")
}

/// Build the contextual SBOM of `component` from its parent's SBOM.
///
/// A legacy component document is converted to `DESCENDANT_OF` lineage
/// first, using the same base-image mark as the parent.
pub fn create_contextual_sbom(
    component: &SpdxDocument,
    parent: &SpdxDocument,
    property: &str,
) -> Result<(SpdxDocument, ContextualizeReport)> {
    let mut component = component.clone();
    let component_state = LineageState::classify(&component, property);
    let component_lineage = establish_lineage(&mut component, &component_state);

    let (parent, mut report) = contextualize_parent(parent, &component, property)?;
    report.component_lineage = component_lineage;
    let merged = graft_parent(&component, &parent)?;
    tracing::info!(
        "Grafted parent SBOM: {} packages, {} relationships",
        merged.packages.len(),
        merged.relationships.len()
    );
    Ok((merged, report))
}
