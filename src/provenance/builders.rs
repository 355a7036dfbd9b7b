//! Removal of multi-stage build tooling from a parent graph.

use crate::model::{RelationshipType, SpdxDocument};
use std::collections::HashSet;

/// Counts of what [`strip_builder_records`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuilderStripSummary {
    pub relationships: usize,
    pub packages: usize,
    pub annotations: usize,
}

/// Drop `BUILD_TOOL_OF` edges, then their source packages and the document
/// annotations attached to them.
///
/// A builder that a remaining relationship still references is kept, only
/// its tooling edge goes.
pub fn strip_builder_records(doc: &mut SpdxDocument) -> BuilderStripSummary {
    let before = doc.relationships.len();
    let mut builders: HashSet<String> = HashSet::new();
    doc.relationships.retain(|edge| {
        let is_tooling = edge.relationship_type == RelationshipType::BuildToolOf;
        if is_tooling {
            builders.insert(edge.spdx_element_id.clone());
        }
        !is_tooling
    });
    let relationships = before - doc.relationships.len();

    for edge in &doc.relationships {
        builders.remove(&edge.spdx_element_id);
        builders.remove(&edge.related_spdx_element);
    }

    let before = doc.packages.len();
    doc.packages.retain(|p| !builders.contains(&p.spdx_id));
    let packages = before - doc.packages.len();

    let before = doc.annotations.len();
    doc.annotations.retain(|a| {
        a.spdx_element_id
            .as_ref()
            .map_or(true, |id| !builders.contains(id))
    });
    let annotations = before - doc.annotations.len();

    if relationships > 0 {
        tracing::debug!(
            "Removed {relationships} BUILD_TOOL_OF relationships, {packages} builder packages \
             and {annotations} annotations"
        );
    }
    BuilderStripSummary {
        relationships,
        packages,
        annotations,
    }
}
