//! Legacy-to-contextual lineage conversion.
//!
//! Legacy parent SBOMs record the image they were built from as a
//! `BUILD_TOOL_OF` edge sourced at a package annotated as the base image.
//! Contextual SBOMs state the same fact as `<image> DESCENDANT_OF <base>`.

use crate::model::{Annotation, RelationshipType, SpdxDocument};
use indexmap::IndexSet;
use serde::Deserialize;
use serde_json::Value;

/// Annotation property marking the base image a parent was built from.
pub const BASE_IMAGE_PROPERTY: &str = "konflux:container:is_base_image";

/// JSON-encoded `{name, value}` property carried in annotation comments.
#[derive(Debug, Deserialize)]
struct EncodedProperty {
    name: String,
    value: Value,
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => text == "true",
        _ => false,
    }
}

/// Whether an annotation comment sets `property` to true.
#[must_use]
pub fn marks_property(annotation: &Annotation, property: &str) -> bool {
    serde_json::from_str::<EncodedProperty>(&annotation.comment)
        .is_ok_and(|encoded| encoded.name == property && is_truthy(&encoded.value))
}

/// SPDXID of the single element annotated with `property`.
///
/// Both package-level and document-level annotations are searched. No mark,
/// or marks on several elements, yield `None`.
#[must_use]
pub fn find_marked_base_image(doc: &SpdxDocument, property: &str) -> Option<String> {
    let from_packages = doc.packages.iter().filter_map(|package| {
        package
            .annotations
            .iter()
            .any(|a| marks_property(a, property))
            .then_some(package.spdx_id.as_str())
    });
    let from_document = doc
        .annotations
        .iter()
        .filter(|a| marks_property(&a.annotation, property))
        .filter_map(|a| a.spdx_element_id.as_deref());
    let marked: IndexSet<&str> = from_packages.chain(from_document).collect();

    match marked.len() {
        0 => None,
        1 => marked.first().map(|id| (*id).to_string()),
        n => {
            tracing::warn!(
                "{n} elements are marked as base image ({}), cannot determine parent",
                marked.iter().copied().collect::<Vec<_>>().join(", ")
            );
            None
        }
    }
}

/// Lineage state of a downloaded parent SBOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineageState {
    /// A `DESCENDANT_OF` edge is already present
    Contextual,
    /// Legacy document with exactly one base-image mark
    LegacyMarked { base_image: String },
    /// Legacy document without a usable mark
    LegacyUnmarked,
}

impl LineageState {
    #[must_use]
    pub fn classify(doc: &SpdxDocument, property: &str) -> Self {
        if doc.relationships_of(RelationshipType::DescendantOf).next().is_some() {
            return Self::Contextual;
        }
        match find_marked_base_image(doc, property) {
            Some(base_image) => Self::LegacyMarked { base_image },
            None => Self::LegacyUnmarked,
        }
    }

    /// The grandparent element when it is known.
    #[must_use]
    pub fn base_image(&self) -> Option<&str> {
        match self {
            Self::LegacyMarked { base_image } => Some(base_image),
            _ => None,
        }
    }
}

/// What [`establish_lineage`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineageOutcome {
    /// The legacy edge was flipped into `DESCENDANT_OF`
    Converted,
    AlreadyContextual,
    /// No base-image mark; nothing to convert
    Undetermined,
    /// The marked element is not the source of any relationship
    MissingRelationship,
    /// The marked element is the source of several relationships
    AmbiguousRelationship { count: usize },
    /// The marked element's relationship is not `BUILD_TOOL_OF`
    UnexpectedType { found: RelationshipType },
}

/// Rewrite the legacy base-image edge of `doc` into a `DESCENDANT_OF` edge.
///
/// Every outcome other than [`LineageOutcome::Converted`] leaves the
/// document untouched.
pub fn establish_lineage(doc: &mut SpdxDocument, state: &LineageState) -> LineageOutcome {
    let base_image = match state {
        LineageState::Contextual => {
            tracing::debug!("Parent SBOM already contains a DESCENDANT_OF relationship");
            return LineageOutcome::AlreadyContextual;
        }
        LineageState::LegacyUnmarked => {
            tracing::debug!(
                "Cannot determine parent of the parent image: no base image is marked, \
                 it was built from scratch or an oci-archive, or its SBOM has another origin"
            );
            return LineageOutcome::Undetermined;
        }
        LineageState::LegacyMarked { base_image } => base_image.as_str(),
    };

    let sourced: Vec<usize> = doc
        .relationships
        .iter()
        .enumerate()
        .filter(|(_, r)| r.spdx_element_id == base_image)
        .map(|(idx, _)| idx)
        .collect();
    let idx = match sourced.as_slice() {
        [] => {
            tracing::warn!("Base image '{base_image}' is not the source of any relationship");
            return LineageOutcome::MissingRelationship;
        }
        [idx] => *idx,
        _ => {
            tracing::warn!(
                "Base image '{base_image}' is the source of {} relationships, skipping rewrite",
                sourced.len()
            );
            return LineageOutcome::AmbiguousRelationship {
                count: sourced.len(),
            };
        }
    };

    let edge = &mut doc.relationships[idx];
    if edge.relationship_type != RelationshipType::BuildToolOf {
        tracing::warn!(
            "Base image '{base_image}' has a {} relationship instead of BUILD_TOOL_OF",
            edge.relationship_type
        );
        return LineageOutcome::UnexpectedType {
            found: edge.relationship_type.clone(),
        };
    }

    edge.relationship_type = RelationshipType::DescendantOf;
    std::mem::swap(&mut edge.spdx_element_id, &mut edge.related_spdx_element);
    tracing::debug!(
        "Converted BUILD_TOOL_OF of '{base_image}' into '{} DESCENDANT_OF {base_image}'",
        edge.spdx_element_id
    );
    LineageOutcome::Converted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentAnnotation, Relationship, SpdxPackage};
    use serde_json::Map;

    fn marker() -> Annotation {
        Annotation {
            annotator: "Tool: konflux:jsonencoded".into(),
            annotation_date: "2024-01-01T00:00:00Z".into(),
            annotation_type: "OTHER".into(),
            comment: r#"{"name":"konflux:container:is_base_image","value":"true"}"#.into(),
        }
    }

    fn legacy_parent() -> SpdxDocument {
        let mut grandparent = SpdxPackage::new("SPDXRef-grandparent", "registry.io/base");
        grandparent.annotations.push(marker());
        SpdxDocument {
            spdx_version: "SPDX-2.3".into(),
            spdx_id: "SPDXRef-DOCUMENT".into(),
            name: "parent".into(),
            creation_info: None,
            packages: vec![SpdxPackage::new("SPDXRef-image", "parent"), grandparent],
            relationships: vec![
                Relationship::new("SPDXRef-DOCUMENT", RelationshipType::Describes, "SPDXRef-image"),
                Relationship::new(
                    "SPDXRef-grandparent",
                    RelationshipType::BuildToolOf,
                    "SPDXRef-image",
                ),
            ],
            annotations: Vec::new(),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_marks_property_accepts_bool_and_string() {
        let mut annotation = marker();
        assert!(marks_property(&annotation, BASE_IMAGE_PROPERTY));
        annotation.comment = r#"{"name": "konflux:container:is_base_image", "value": true}"#.into();
        assert!(marks_property(&annotation, BASE_IMAGE_PROPERTY));
        annotation.comment = "not json".into();
        assert!(!marks_property(&annotation, BASE_IMAGE_PROPERTY));
    }

    #[test]
    fn test_document_level_marker_is_found() {
        let mut doc = legacy_parent();
        doc.packages[1].annotations.clear();
        doc.annotations.push(DocumentAnnotation {
            spdx_element_id: Some("SPDXRef-grandparent".into()),
            annotation: marker(),
        });
        assert_eq!(
            find_marked_base_image(&doc, BASE_IMAGE_PROPERTY).as_deref(),
            Some("SPDXRef-grandparent")
        );
    }

    #[test]
    fn test_two_marked_elements_are_ambiguous() {
        let mut doc = legacy_parent();
        doc.packages[0].annotations.push(marker());
        assert_eq!(find_marked_base_image(&doc, BASE_IMAGE_PROPERTY), None);
    }

    #[test]
    fn test_converts_build_tool_of() {
        let mut doc = legacy_parent();
        let state = LineageState::classify(&doc, BASE_IMAGE_PROPERTY);
        assert_eq!(establish_lineage(&mut doc, &state), LineageOutcome::Converted);
        assert_eq!(
            doc.relationships[1],
            Relationship::new("SPDXRef-image", RelationshipType::DescendantOf, "SPDXRef-grandparent")
        );
    }

    #[test]
    fn test_contextual_document_is_untouched() {
        let mut doc = legacy_parent();
        doc.relationships.push(Relationship::new(
            "SPDXRef-image",
            RelationshipType::DescendantOf,
            "SPDXRef-other",
        ));
        let before = doc.clone();
        let state = LineageState::classify(&doc, BASE_IMAGE_PROPERTY);
        assert_eq!(state, LineageState::Contextual);
        assert_eq!(establish_lineage(&mut doc, &state), LineageOutcome::AlreadyContextual);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_unmarked_document_is_untouched() {
        let mut doc = legacy_parent();
        doc.packages[1].annotations.clear();
        let before = doc.clone();
        let state = LineageState::classify(&doc, BASE_IMAGE_PROPERTY);
        assert_eq!(establish_lineage(&mut doc, &state), LineageOutcome::Undetermined);
        assert_eq!(doc, before);
    }

    #[test]
    fn test_missing_and_ambiguous_relationships() {
        let mut doc = legacy_parent();
        doc.relationships.truncate(1);
        let state = LineageState::classify(&doc, BASE_IMAGE_PROPERTY);
        assert_eq!(establish_lineage(&mut doc, &state), LineageOutcome::MissingRelationship);

        let mut doc = legacy_parent();
        doc.relationships.push(Relationship::new(
            "SPDXRef-grandparent",
            RelationshipType::Contains,
            "SPDXRef-x",
        ));
        let state = LineageState::classify(&doc, BASE_IMAGE_PROPERTY);
        assert_eq!(
            establish_lineage(&mut doc, &state),
            LineageOutcome::AmbiguousRelationship { count: 2 }
        );
    }

    #[test]
    fn test_unexpected_relationship_type() {
        let mut doc = legacy_parent();
        doc.relationships[1].relationship_type = RelationshipType::Contains;
        let before = doc.clone();
        let state = LineageState::classify(&doc, BASE_IMAGE_PROPERTY);
        assert_eq!(
            establish_lineage(&mut doc, &state),
            LineageOutcome::UnexpectedType {
                found: RelationshipType::Contains
            }
        );
        assert_eq!(doc, before);
    }
}
