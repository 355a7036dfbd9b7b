//! Image reference injection.
//!
//! Makes the built image itself the subject of its SBOM: CycloneDX gets a
//! `container` component in `metadata.component`, SPDX gets an
//! `SPDXRef-image` package that the document DESCRIBES and that CONTAINS
//! whatever the document described before.

use crate::base_images::ImageReference;
use crate::model::{
    CdxComponent, CdxHash, CycloneDxBom, ExternalRef, Relationship, RelationshipType, Sbom,
    SpdxChecksum, SpdxDocument, SpdxPackage,
};
use serde_json::Value;

/// SPDXID of the injected image package.
pub const IMAGE_SPDX_ID: &str = "SPDXRef-image";

/// Add `image` as the subject of `sbom`.
pub fn add_image_reference(sbom: &mut Sbom, image: &ImageReference) {
    match sbom {
        Sbom::CycloneDx(bom) => add_to_cyclonedx(bom, image),
        Sbom::Spdx(doc) => add_to_spdx(doc, image),
    }
}

fn add_to_cyclonedx(bom: &mut CycloneDxBom, image: &ImageReference) {
    let mut component = CdxComponent::new("container", &image.name);
    component.purl = Some(image.purl());
    component.version = image.tag.clone();
    component.hashes.push(CdxHash {
        alg: image.cyclonedx_hash_algorithm(),
        content: image.digest_hex().to_string(),
    });
    bom.components.insert(0, component.clone());
    bom.metadata.get_or_insert_with(Default::default).component = Some(component);
}

fn add_to_spdx(doc: &mut SpdxDocument, image: &ImageReference) {
    let mut package = SpdxPackage::new(IMAGE_SPDX_ID, &image.name);
    package.version_info = image.tag.clone();
    package.download_location = Some("NOASSERTION".to_string());
    package
        .extra
        .insert("licenseConcluded".into(), Value::from("NOASSERTION"));
    package
        .extra
        .insert("supplier".into(), Value::from("NOASSERTION"));
    package.external_refs.push(ExternalRef::purl(image.purl()));
    package.checksums.push(SpdxChecksum {
        algorithm: image.spdx_checksum_algorithm(),
        checksum_value: image.digest_hex().to_string(),
    });
    doc.packages.insert(0, package);

    redirect_roots(doc, IMAGE_SPDX_ID);
    doc.relationships.insert(
        0,
        Relationship::new(doc.spdx_id.clone(), RelationshipType::Describes, IMAGE_SPDX_ID),
    );
    doc.name = image.pullspec();
}

/// A placeholder root such as `SPDXRef-DocumentRoot-Unknown` or a scanned
/// directory (`./src`).
#[must_use]
pub fn is_virtual_root(package: &SpdxPackage) -> bool {
    package.name.is_empty() || package.name.starts_with('.') || package.name.starts_with('/')
}

/// Hang everything the document describes under `new_root`.
///
/// Virtual roots are removed and their edges re-pointed at `new_root`; real
/// packages become `new_root CONTAINS <package>`.
fn redirect_roots(doc: &mut SpdxDocument, new_root: &str) {
    let document_id = doc.spdx_id.clone();
    let describes = |r: &Relationship| {
        r.relationship_type == RelationshipType::Describes && r.spdx_element_id == document_id
    };
    let described: Vec<String> = doc
        .relationships
        .iter()
        .filter(|r| describes(*r))
        .map(|r| r.related_spdx_element.clone())
        .collect();

    for root in described {
        let is_virtual = doc.package(&root).is_some_and(is_virtual_root);
        let position = doc
            .relationships
            .iter()
            .position(|r| describes(r) && r.related_spdx_element == root);
        let Some(position) = position else {
            continue;
        };

        if is_virtual {
            doc.packages.retain(|p| p.spdx_id != root);
            doc.relationships.remove(position);
            for edge in &mut doc.relationships {
                if edge.spdx_element_id == root {
                    edge.spdx_element_id = new_root.to_string();
                }
                if edge.related_spdx_element == root {
                    edge.related_spdx_element = new_root.to_string();
                }
            }
            tracing::debug!("Replaced virtual root '{root}' with '{new_root}'");
        } else {
            let edge = &mut doc.relationships[position];
            edge.spdx_element_id = new_root.to_string();
            edge.relationship_type = RelationshipType::Contains;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DIGEST: &str = "sha256:627867e53ad6846afba2dfbf5cef1d54c868a9025633ef0afd546278d4654eac";

    fn image() -> ImageReference {
        ImageReference::from_url_and_digest("quay.io/ns/app:v1", DIGEST).unwrap()
    }

    fn spdx(value: serde_json::Value) -> SpdxDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_cyclonedx_metadata_component() {
        let mut sbom = Sbom::from_value(json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.5",
            "metadata": {},
            "components": [{"type": "library", "name": "a"}]
        }))
        .unwrap();
        add_image_reference(&mut sbom, &image());
        let Sbom::CycloneDx(bom) = sbom else {
            panic!("expected CycloneDX");
        };
        assert_eq!(bom.components[0].name, "app");
        assert_eq!(bom.components[0].version.as_deref(), Some("v1"));
        assert_eq!(bom.components[0].hashes[0].alg, "SHA-256");
        assert_eq!(bom.metadata.unwrap().component, Some(bom.components[0].clone()));
    }

    #[test]
    fn test_spdx_virtual_roots_are_replaced() {
        let mut doc = spdx(json!({
            "spdxVersion": "SPDX-2.3",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": "/src",
            "packages": [
                {"SPDXID": "SPDXRef-DocumentRoot-Directory-.", "name": "./src"},
                {"SPDXID": "SPDXRef-a", "name": "a"}
            ],
            "relationships": [
                {"spdxElementId": "SPDXRef-DOCUMENT", "relationshipType": "DESCRIBES", "relatedSpdxElement": "SPDXRef-DocumentRoot-Directory-."},
                {"spdxElementId": "SPDXRef-DocumentRoot-Directory-.", "relationshipType": "CONTAINS", "relatedSpdxElement": "SPDXRef-a"}
            ]
        }));
        add_to_spdx(&mut doc, &image());

        assert_eq!(doc.name, format!("quay.io/ns/app@{DIGEST}"));
        assert_eq!(doc.packages.len(), 2);
        assert_eq!(doc.packages[0].spdx_id, IMAGE_SPDX_ID);
        assert_eq!(doc.packages[0].checksums[0].algorithm, "SHA256");
        assert_eq!(
            doc.relationships,
            vec![
                Relationship::new("SPDXRef-DOCUMENT", RelationshipType::Describes, IMAGE_SPDX_ID),
                Relationship::new(IMAGE_SPDX_ID, RelationshipType::Contains, "SPDXRef-a"),
            ]
        );
    }

    #[test]
    fn test_spdx_real_roots_become_contained() {
        let mut doc = spdx(json!({
            "spdxVersion": "SPDX-2.3",
            "SPDXID": "SPDXRef-DOCUMENT",
            "name": "x",
            "packages": [
                {"SPDXID": "SPDXRef-npm", "name": "npm-project"},
                {"SPDXID": "SPDXRef-pip", "name": "pip-project"}
            ],
            "relationships": [
                {"spdxElementId": "SPDXRef-DOCUMENT", "relationshipType": "DESCRIBES", "relatedSpdxElement": "SPDXRef-npm"},
                {"spdxElementId": "SPDXRef-DOCUMENT", "relationshipType": "DESCRIBES", "relatedSpdxElement": "SPDXRef-pip"}
            ]
        }));
        add_to_spdx(&mut doc, &image());
        assert_eq!(
            doc.relationships,
            vec![
                Relationship::new("SPDXRef-DOCUMENT", RelationshipType::Describes, IMAGE_SPDX_ID),
                Relationship::new(IMAGE_SPDX_ID, RelationshipType::Contains, "SPDXRef-npm"),
                Relationship::new(IMAGE_SPDX_ID, RelationshipType::Contains, "SPDXRef-pip"),
            ]
        );
    }

    #[test]
    fn test_is_virtual_root() {
        assert!(is_virtual_root(&SpdxPackage::new("SPDXRef-DocumentRoot-Unknown", "")));
        assert!(is_virtual_root(&SpdxPackage::new("SPDXRef-x", "/rootfs")));
        assert!(!is_virtual_root(&SpdxPackage::new("SPDXRef-x", "openssl")));
    }
}
