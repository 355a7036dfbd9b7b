//! Flat component merging for CycloneDX documents.

use super::MergePolicy;
use crate::error::{MergeErrorKind, Result, SbomMergeError};
use crate::matching::{apparent_key, ScannerFilter, SbomItem};
use crate::model::{
    CdxComponent, CdxFormula, CycloneDxBom, Tool, ToolComponent, ToolsRepresentation,
};
use indexmap::IndexMap;

/// Keep every authoritative component and the scanner components that do
/// not duplicate one of them.
///
/// Result order is the surviving scanner components followed by all
/// authoritative components, which are never altered.
pub fn merge_by_preferring_authority(
    scanner: &[CdxComponent],
    authority: &[CdxComponent],
) -> Result<Vec<CdxComponent>> {
    if let Some(component) = authority.iter().find(|c| c.purl.is_none()) {
        return Err(SbomMergeError::merge(
            "indexing resolver components",
            MergeErrorKind::MissingPurl {
                name: component.name.clone(),
            },
        ));
    }
    let filter = ScannerFilter::new(authority)?;

    let mut merged = Vec::with_capacity(scanner.len() + authority.len());
    for component in scanner {
        match filter.duplicate_reason(component) {
            Some(reason) => {
                tracing::debug!("Dropping scanner component '{}': {}", component.name, reason);
            }
            None => merged.push(component.clone()),
        }
    }
    let dropped = scanner.len() - merged.len();
    merged.extend(authority.iter().cloned());

    tracing::info!(
        "Kept {} of {} scanner components ({} duplicates) next to {} resolver components",
        scanner.len() - dropped,
        scanner.len(),
        dropped,
        authority.len()
    );
    Ok(merged)
}

/// Concatenate two equally trusted lists, keeping the first occurrence of
/// every identity.
pub fn merge_by_apparent_sameness<I: SbomItem + Clone>(first: &[I], second: &[I]) -> Vec<I> {
    let mut unique: IndexMap<String, I> = IndexMap::with_capacity(first.len() + second.len());
    for item in first.iter().chain(second) {
        unique.entry(apparent_key(item)).or_insert_with(|| item.clone());
    }
    unique.into_values().collect()
}

/// Reconcile `metadata.tools`, conforming to the left document's shape.
///
/// Tools are told apart by `(name, version)` in both shapes, so one tool
/// reported with different purls is listed once.
#[must_use]
pub fn merge_tools(
    left: Option<&ToolsRepresentation>,
    right: Option<&ToolsRepresentation>,
) -> Option<ToolsRepresentation> {
    match (left, right) {
        (None, None) => None,
        (Some(left), None) => Some(left.clone()),
        (None, Some(right)) => Some(right.clone()),
        (Some(ToolsRepresentation::Versioned(left)), Some(right)) => {
            let mut wrapper = left.clone();
            let incoming = right.clone().into_components();
            let mut unique: IndexMap<(String, Option<String>), ToolComponent> = IndexMap::new();
            for tool in wrapper.components.drain(..).chain(incoming) {
                unique
                    .entry((tool.name.clone(), tool.version.clone()))
                    .or_insert(tool);
            }
            wrapper.components = unique.into_values().collect();
            Some(ToolsRepresentation::Versioned(wrapper))
        }
        (Some(ToolsRepresentation::Flat(left)), Some(right)) => {
            let incoming = right.clone().into_tools();
            Some(ToolsRepresentation::Flat(dedupe_tools(
                left.iter().cloned().chain(incoming),
            )))
        }
    }
}

/// First occurrence of every `(name, version)` wins.
fn dedupe_tools(tools: impl Iterator<Item = Tool>) -> Vec<Tool> {
    let mut unique: IndexMap<(Option<String>, Option<String>), Tool> = IndexMap::new();
    for tool in tools {
        unique
            .entry((tool.name.clone(), tool.version.clone()))
            .or_insert(tool);
    }
    unique.into_values().collect()
}

/// Merge two CycloneDX documents.
///
/// The left document provides the envelope. Under
/// [`MergePolicy::PreferAuthority`] the right document is the resolver output.
pub fn merge_cyclonedx(
    left: &CycloneDxBom,
    right: &CycloneDxBom,
    policy: MergePolicy,
) -> Result<CycloneDxBom> {
    let mut merged = left.clone();
    merged.components = match policy {
        MergePolicy::PreferAuthority => {
            merge_by_preferring_authority(&left.components, &right.components)?
        }
        MergePolicy::ApparentSameness => {
            merge_by_apparent_sameness(&left.components, &right.components)
        }
    };

    if let Some(tools) = merge_tools(left.tools(), right.tools()) {
        merged.metadata.get_or_insert_with(Default::default).tools = Some(tools);
    }

    merged.formulation = merge_formulation(left.formulation.as_deref(), right.formulation.as_deref());
    Ok(merged)
}

fn merge_formulation(
    left: Option<&[CdxFormula]>,
    right: Option<&[CdxFormula]>,
) -> Option<Vec<CdxFormula>> {
    let mut merged: Vec<CdxFormula> = left.map(<[CdxFormula]>::to_vec).unwrap_or_default();
    for formula in right.unwrap_or_default() {
        if !merged.contains(formula) {
            merged.push(formula.clone());
        }
    }
    (!merged.is_empty() || left.is_some()).then_some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolComponents;
    use serde_json::Map;

    fn component(name: &str, version: Option<&str>, purl: Option<&str>) -> CdxComponent {
        let mut c = CdxComponent::new("library", name);
        c.version = version.map(str::to_string);
        c.purl = purl.map(str::to_string);
        c
    }

    fn bom(components: Vec<CdxComponent>) -> CycloneDxBom {
        CycloneDxBom {
            bom_format: "CycloneDX".into(),
            spec_version: "1.5".into(),
            metadata: None,
            components,
            formulation: None,
            extra: Map::new(),
        }
    }

    fn tool(name: &str, version: &str) -> Tool {
        Tool {
            vendor: Some("vendor".into()),
            name: Some(name.into()),
            version: Some(version.into()),
            hashes: None,
            external_references: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_authority_wins_drops_local_replacement() {
        let authority = vec![component("ex", Some("v1.0.0"), Some("pkg:golang/ex@v1.0.0"))];
        let scanner = vec![
            component("ex", Some("v1.0.0"), Some("pkg:golang/ex@v1.0.0")),
            component("./local", Some("(devel)"), Some("pkg:golang/./local@(devel)")),
        ];
        let merged = merge_by_preferring_authority(&scanner, &authority).unwrap();
        assert_eq!(merged, authority);
    }

    #[test]
    fn test_authority_wins_keeps_scanner_only_components_first() {
        let authority = vec![component("ex", Some("v1"), Some("pkg:golang/ex@v1"))];
        let scanner = vec![component("bash", Some("5.1"), None)];
        let merged = merge_by_preferring_authority(&scanner, &authority).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].name, "bash");
        assert_eq!(merged[1].name, "ex");
    }

    #[test]
    fn test_authority_without_purl_is_fatal() {
        let authority = vec![component("ex", Some("v1"), None)];
        let err = merge_by_preferring_authority(&[], &authority).unwrap_err();
        assert!(matches!(
            err,
            SbomMergeError::Merge {
                source: MergeErrorKind::MissingPurl { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_authority_wins_with_empty_scanner_is_identity() {
        let authority = vec![
            component("a", Some("1"), Some("pkg:npm/a@1")),
            component("b", Some("2"), Some("pkg:npm/b@2")),
        ];
        assert_eq!(merge_by_preferring_authority(&[], &authority).unwrap(), authority);
    }

    #[test]
    fn test_apparent_sameness_keeps_first_seen() {
        let mut y_first = component("y", Some("1"), Some("pkg:npm/y@1"));
        y_first.component_type = "library".into();
        let mut y_second = y_first.clone();
        y_second.component_type = "framework".into();
        let x = component("x", Some("1"), Some("pkg:npm/x@1"));
        let z = component("z", Some("1"), None);

        let merged = merge_by_apparent_sameness(&[x, y_first], &[y_second, z]);
        let names: Vec<&str> = merged.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        assert_eq!(merged[1].component_type, "library");
    }

    #[test]
    fn test_apparent_sameness_distinguishes_qualifiers() {
        let a = component("a", Some("1"), Some("pkg:rpm/a@1?arch=x86_64"));
        let b = component("a", Some("1"), Some("pkg:rpm/a@1?arch=aarch64"));
        assert_eq!(merge_by_apparent_sameness(&[a], &[b]).len(), 2);
    }

    #[test]
    fn test_merge_tools_flat_left() {
        let left = ToolsRepresentation::Flat(vec![tool("syft", "1.0")]);
        let right = ToolsRepresentation::Versioned(ToolComponents {
            components: vec![
                ToolComponent::from(tool("cachi2", "0.5")),
                ToolComponent::from(tool("syft", "1.0")),
            ],
            extra: Map::new(),
        });
        match merge_tools(Some(&left), Some(&right)).unwrap() {
            ToolsRepresentation::Flat(tools) => {
                let names: Vec<_> = tools.iter().filter_map(|t| t.name.as_deref()).collect();
                assert_eq!(names, vec!["syft", "cachi2"]);
            }
            other => panic!("expected flat tools, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_tools_versioned_left() {
        let left = ToolsRepresentation::Versioned(ToolComponents {
            components: vec![ToolComponent::from(tool("syft", "1.0"))],
            extra: Map::new(),
        });
        let right = ToolsRepresentation::Flat(vec![tool("cachi2", "0.5"), tool("syft", "1.0")]);
        match merge_tools(Some(&left), Some(&right)).unwrap() {
            ToolsRepresentation::Versioned(wrapper) => {
                assert_eq!(wrapper.components.len(), 2);
                assert_eq!(wrapper.components[1].name, "cachi2");
                assert_eq!(wrapper.components[1].author.as_deref(), Some("vendor"));
                assert_eq!(wrapper.components[1].component_type, "application");
            }
            other => panic!("expected versioned tools, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_tools_versioned_dedupes_by_name_and_version() {
        let mut left_syft = ToolComponent::from(tool("syft", "1.0"));
        left_syft.purl = Some("pkg:golang/github.com/anchore/syft@1.0".into());
        let mut right_syft = ToolComponent::from(tool("syft", "1.0"));
        right_syft.purl = Some("pkg:generic/syft@1.0".into());
        let left = ToolsRepresentation::Versioned(ToolComponents {
            components: vec![left_syft.clone()],
            extra: Map::new(),
        });
        let right = ToolsRepresentation::Versioned(ToolComponents {
            components: vec![right_syft, ToolComponent::from(tool("cachi2", "0.5"))],
            extra: Map::new(),
        });
        match merge_tools(Some(&left), Some(&right)).unwrap() {
            ToolsRepresentation::Versioned(wrapper) => {
                assert_eq!(wrapper.components.len(), 2);
                assert_eq!(wrapper.components[0], left_syft);
                assert_eq!(wrapper.components[1].name, "cachi2");
            }
            other => panic!("expected versioned tools, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_tools_missing_sides() {
        let tools = ToolsRepresentation::Flat(vec![tool("syft", "1.0")]);
        assert_eq!(merge_tools(None, None), None);
        assert_eq!(merge_tools(Some(&tools), None), Some(tools.clone()));
        assert_eq!(merge_tools(None, Some(&tools)), Some(tools));
    }

    #[test]
    fn test_merge_cyclonedx_keeps_left_envelope() {
        let mut left = bom(vec![component("bash", Some("5"), None)]);
        left.extra.insert("serialNumber".into(), "urn:uuid:left".into());
        let right = bom(vec![component("ex", Some("v1"), Some("pkg:golang/ex@v1"))]);

        let merged = merge_cyclonedx(&left, &right, MergePolicy::PreferAuthority).unwrap();
        assert_eq!(merged.extra["serialNumber"], "urn:uuid:left");
        assert_eq!(merged.components.len(), 2);
    }

    #[test]
    fn test_merge_formulation_appends_new_entries() {
        let formula = CdxFormula {
            components: vec![component("ubi", None, Some("pkg:oci/ubi@sha256:1"))],
            extra: Map::new(),
        };
        let left = bom(vec![]);
        let mut right = bom(vec![]);
        right.formulation = Some(vec![formula.clone()]);
        let merged = merge_cyclonedx(&left, &right, MergePolicy::ApparentSameness).unwrap();
        assert_eq!(merged.formulation, Some(vec![formula.clone()]));

        let again = merge_cyclonedx(&merged, &right, MergePolicy::ApparentSameness).unwrap();
        assert_eq!(again.formulation, Some(vec![formula]));
    }
}
