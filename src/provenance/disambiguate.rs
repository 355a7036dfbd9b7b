//! Self-reference disambiguation between component and parent documents.
//!
//! Both the component SBOM and its parent's SBOM use the same generic id for
//! "this image" (usually `SPDXRef-image`). Before the parent graph is grafted
//! under the component graph, the parent's self-reference is renamed to the
//! id the component uses for its parent.

use crate::error::{ProvenanceErrorKind, Result, SbomMergeError};
use crate::model::{RelationshipType, SpdxDocument};

/// The element a document DESCRIBES.
pub fn self_reference(doc: &SpdxDocument) -> Result<&str> {
    doc.describes_target().ok_or_else(|| {
        SbomMergeError::provenance(
            format!("finding self reference of '{}'", doc.name),
            ProvenanceErrorKind::MissingSelfReference,
        )
    })
}

/// The id the component SBOM uses for its parent image.
///
/// The `DESCENDANT_OF` edge of the component's own self-reference wins over
/// edges of nested elements.
pub fn parent_identifier(component: &SpdxDocument) -> Result<&str> {
    let own = component.describes_target();
    let mut lineage = component.relationships_of(RelationshipType::DescendantOf);
    let first = lineage.next();
    let preferred = first
        .into_iter()
        .chain(lineage)
        .find(|r| Some(r.spdx_element_id.as_str()) == own)
        .or(first);

    preferred
        .map(|r| r.related_spdx_element.as_str())
        .ok_or_else(|| {
            SbomMergeError::provenance(
                "finding parent image of the component",
                ProvenanceErrorKind::MissingParentLink,
            )
        })
}

/// Rename the parent's self-reference wherever it is the source of a
/// `CONTAINS` or `DESCENDANT_OF` edge. Returns the number of rewritten edges.
///
/// `BUILD_TOOL_OF` edges are left alone; builder records are stripped later.
pub fn disambiguate_self_references(parent: &mut SpdxDocument, parent_id: &str) -> Result<usize> {
    let self_ref = self_reference(parent)?.to_string();
    if self_ref == parent_id {
        return Ok(0);
    }

    let mut rewritten = 0;
    for edge in &mut parent.relationships {
        let renamed = matches!(
            edge.relationship_type,
            RelationshipType::Contains | RelationshipType::DescendantOf
        ) && edge.spdx_element_id == self_ref;
        if renamed {
            edge.spdx_element_id = parent_id.to_string();
            rewritten += 1;
        }
    }
    tracing::debug!("Renamed '{self_ref}' to '{parent_id}' in {rewritten} parent relationships");
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Relationship, SpdxPackage};
    use serde_json::Map;

    fn doc(relationships: Vec<Relationship>) -> SpdxDocument {
        SpdxDocument {
            spdx_version: "SPDX-2.3".into(),
            spdx_id: "SPDXRef-DOCUMENT".into(),
            name: "doc".into(),
            creation_info: None,
            packages: vec![SpdxPackage::new("SPDXRef-image", "image")],
            relationships,
            annotations: Vec::new(),
            extra: Map::new(),
        }
    }

    fn rel(from: &str, kind: RelationshipType, to: &str) -> Relationship {
        Relationship::new(from, kind, to)
    }

    #[test]
    fn test_self_reference() {
        let d = doc(vec![rel("SPDXRef-DOCUMENT", RelationshipType::Describes, "SPDXRef-image")]);
        assert_eq!(self_reference(&d).unwrap(), "SPDXRef-image");
        assert!(self_reference(&doc(vec![])).is_err());
    }

    #[test]
    fn test_parent_identifier_prefers_own_edge() {
        let component = doc(vec![
            rel("SPDXRef-DOCUMENT", RelationshipType::Describes, "SPDXRef-image"),
            rel("SPDXRef-parent", RelationshipType::DescendantOf, "SPDXRef-grandparent"),
            rel("SPDXRef-image", RelationshipType::DescendantOf, "SPDXRef-parent"),
        ]);
        assert_eq!(parent_identifier(&component).unwrap(), "SPDXRef-parent");
    }

    #[test]
    fn test_parent_identifier_missing() {
        let component = doc(vec![rel("SPDXRef-DOCUMENT", RelationshipType::Describes, "SPDXRef-image")]);
        let err = parent_identifier(&component).unwrap_err();
        assert!(matches!(
            err,
            SbomMergeError::Provenance {
                source: ProvenanceErrorKind::MissingParentLink,
                ..
            }
        ));
    }

    #[test]
    fn test_disambiguate_renames_contains_and_lineage() {
        let mut parent = doc(vec![
            rel("SPDXRef-DOCUMENT", RelationshipType::Describes, "SPDXRef-image"),
            rel("SPDXRef-image", RelationshipType::Contains, "SPDXRef-a"),
            rel("SPDXRef-image", RelationshipType::DescendantOf, "SPDXRef-grandparent"),
            rel("SPDXRef-builder", RelationshipType::BuildToolOf, "SPDXRef-image"),
        ]);
        let count = disambiguate_self_references(&mut parent, "SPDXRef-parent").unwrap();
        assert_eq!(count, 2);
        assert_eq!(parent.relationships[1].spdx_element_id, "SPDXRef-parent");
        assert_eq!(parent.relationships[2].spdx_element_id, "SPDXRef-parent");
        assert_eq!(parent.relationships[0].related_spdx_element, "SPDXRef-image");
        assert_eq!(parent.relationships[3].related_spdx_element, "SPDXRef-image");
    }
}
