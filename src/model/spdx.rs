//! SPDX 2.x document types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// An SPDX document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxDocument {
    pub spdx_version: String,
    #[serde(rename = "SPDXID")]
    pub spdx_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_info: Option<CreationInfo>,
    #[serde(default)]
    pub packages: Vec<SpdxPackage>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<DocumentAnnotation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpdxDocument {
    /// Target of the first DESCRIBES relationship, i.e. what the document is about.
    #[must_use]
    pub fn describes_target(&self) -> Option<&str> {
        self.relationships
            .iter()
            .find(|r| r.relationship_type == RelationshipType::Describes)
            .map(|r| r.related_spdx_element.as_str())
    }

    #[must_use]
    pub fn package(&self, spdx_id: &str) -> Option<&SpdxPackage> {
        self.packages.iter().find(|p| p.spdx_id == spdx_id)
    }

    /// All relationships of the given type.
    pub fn relationships_of(
        &self,
        relationship_type: RelationshipType,
    ) -> impl Iterator<Item = &Relationship> {
        self.relationships
            .iter()
            .filter(move |r| r.relationship_type == relationship_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default)]
    pub creators: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An SPDX package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    pub spdx_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_refs: Vec<ExternalRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checksums: Vec<SpdxChecksum>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpdxPackage {
    pub fn new(spdx_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            spdx_id: spdx_id.into(),
            name: name.into(),
            version_info: None,
            download_location: None,
            external_refs: Vec::new(),
            checksums: Vec::new(),
            annotations: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Locators of all purl external references.
    pub fn purl_locators(&self) -> impl Iterator<Item = &str> {
        self.external_refs
            .iter()
            .filter(|r| r.is_purl())
            .map(|r| r.reference_locator.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRef {
    pub reference_category: String,
    pub reference_type: String,
    pub reference_locator: String,
}

impl ExternalRef {
    /// A `PACKAGE-MANAGER purl` reference.
    pub fn purl(locator: impl Into<String>) -> Self {
        Self {
            reference_category: "PACKAGE-MANAGER".to_string(),
            reference_type: "purl".to_string(),
            reference_locator: locator.into(),
        }
    }

    #[must_use]
    pub fn is_purl(&self) -> bool {
        self.reference_type == "purl"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxChecksum {
    pub algorithm: String,
    pub checksum_value: String,
}

/// A package-level annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub annotator: String,
    pub annotation_date: String,
    pub annotation_type: String,
    pub comment: String,
}

/// A document-level annotation.
///
/// Without `spdxElementId` it annotates the document itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spdx_element_id: Option<String>,
    #[serde(flatten)]
    pub annotation: Annotation,
}

/// A directed, typed edge between two SPDX elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub spdx_element_id: String,
    pub relationship_type: RelationshipType,
    pub related_spdx_element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Relationship {
    pub fn new(
        spdx_element_id: impl Into<String>,
        relationship_type: RelationshipType,
        related_spdx_element: impl Into<String>,
    ) -> Self {
        Self {
            spdx_element_id: spdx_element_id.into(),
            relationship_type,
            related_spdx_element: related_spdx_element.into(),
            comment: None,
        }
    }

    /// Whether this edge touches the given element at either end.
    #[must_use]
    pub fn touches(&self, spdx_id: &str) -> bool {
        self.spdx_element_id == spdx_id || self.related_spdx_element == spdx_id
    }
}

/// Relationship types the engine distinguishes; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationshipType {
    Describes,
    Contains,
    BuildToolOf,
    DescendantOf,
    DependsOn,
    Other(String),
}

impl RelationshipType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Describes => "DESCRIBES",
            Self::Contains => "CONTAINS",
            Self::BuildToolOf => "BUILD_TOOL_OF",
            Self::DescendantOf => "DESCENDANT_OF",
            Self::DependsOn => "DEPENDS_ON",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for RelationshipType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "DESCRIBES" => Self::Describes,
            "CONTAINS" => Self::Contains,
            "BUILD_TOOL_OF" => Self::BuildToolOf,
            "DESCENDANT_OF" => Self::DescendantOf,
            "DEPENDS_ON" => Self::DependsOn,
            _ => Self::Other(value),
        }
    }
}

impl From<RelationshipType> for String {
    fn from(value: RelationshipType) -> Self {
        match value {
            RelationshipType::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relationship_type_round_trip() {
        let rel: Relationship = serde_json::from_value(json!({
            "spdxElementId": "SPDXRef-a",
            "relationshipType": "BUILD_TOOL_OF",
            "relatedSpdxElement": "SPDXRef-b"
        }))
        .unwrap();
        assert_eq!(rel.relationship_type, RelationshipType::BuildToolOf);
        let back = serde_json::to_value(&rel).unwrap();
        assert_eq!(back["relationshipType"], "BUILD_TOOL_OF");
    }

    #[test]
    fn test_unknown_relationship_type_is_preserved() {
        let kind = RelationshipType::from("GENERATED_FROM".to_string());
        assert_eq!(kind, RelationshipType::Other("GENERATED_FROM".into()));
        assert_eq!(String::from(kind), "GENERATED_FROM");
    }

    #[test]
    fn test_describes_target() {
        let doc: SpdxDocument = serde_json::from_value(json!({
            "spdxVersion": "SPDX-2.3",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": "doc",
            "packages": [{"SPDXID": "SPDXRef-image", "name": "image"}],
            "relationships": [
                {"spdxElementId": "SPDXRef-image", "relationshipType": "CONTAINS", "relatedSpdxElement": "SPDXRef-a"},
                {"spdxElementId": "SPDXRef-DOCUMENT", "relationshipType": "DESCRIBES", "relatedSpdxElement": "SPDXRef-image"}
            ]
        }))
        .unwrap();
        assert_eq!(doc.describes_target(), Some("SPDXRef-image"));
        assert!(doc.package("SPDXRef-image").is_some());
        assert_eq!(doc.relationships_of(RelationshipType::Contains).count(), 1);
    }

    #[test]
    fn test_document_annotation_flattening() {
        let annotation: DocumentAnnotation = serde_json::from_value(json!({
            "spdxElementId": "SPDXRef-a",
            "annotator": "Tool: konflux:jsonencoded",
            "annotationDate": "2024-01-01T00:00:00Z",
            "annotationType": "OTHER",
            "comment": "{}"
        }))
        .unwrap();
        assert_eq!(annotation.spdx_element_id.as_deref(), Some("SPDXRef-a"));
        assert_eq!(annotation.annotation.annotation_type, "OTHER");
    }

    #[test]
    fn test_document_annotation_without_element() {
        let doc: SpdxDocument = serde_json::from_value(json!({
            "spdxVersion": "SPDX-2.3",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": "doc",
            "packages": [],
            "relationships": [],
            "annotations": [{
                "annotator": "Tool: spdx-tools",
                "annotationDate": "2024-01-01T00:00:00Z",
                "annotationType": "OTHER",
                "comment": "reviewed"
            }]
        }))
        .unwrap();
        assert_eq!(doc.annotations.len(), 1);
        assert_eq!(doc.annotations[0].spdx_element_id, None);

        let written = serde_json::to_value(&doc).unwrap();
        assert!(written["annotations"][0].get("spdxElementId").is_none());
    }

    #[test]
    fn test_purl_locators() {
        let mut package = SpdxPackage::new("SPDXRef-a", "a");
        package.external_refs.push(ExternalRef::purl("pkg:npm/a@1"));
        package.external_refs.push(ExternalRef {
            reference_category: "SECURITY".into(),
            reference_type: "cpe23Type".into(),
            reference_locator: "cpe:2.3:a:a:a:1:*:*:*:*:*:*:*".into(),
        });
        assert_eq!(package.purl_locators().collect::<Vec<_>>(), vec!["pkg:npm/a@1"]);
    }
}
