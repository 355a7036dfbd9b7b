//! Property-based tests for purl identity and component merging.

use proptest::prelude::*;
use sbom_merge::matching::{apparent_key, PurlNormalizer};
use sbom_merge::merge::{merge_by_apparent_sameness, merge_by_preferring_authority};
use sbom_merge::model::{CdxComponent, Purl};
use std::collections::HashSet;

fn component(name: &str, version: &str, purl: Option<String>) -> CdxComponent {
    let mut component = CdxComponent::new("library", name);
    component.version = Some(version.to_string());
    component.purl = purl;
    component
}

fn npm_component() -> impl Strategy<Value = CdxComponent> {
    ("[a-z][a-z0-9-]{0,8}", "[0-9]\\.[0-9]{1,2}", any::<bool>()).prop_map(
        |(name, version, with_purl)| {
            let purl = with_purl.then(|| format!("pkg:npm/{name}@{version}"));
            component(&name, &version, purl)
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn purl_parse_doesnt_panic(s in "\\PC{0,200}") {
        let _ = Purl::parse(&s);
    }

    #[test]
    fn coarse_key_ignores_qualifiers_and_subpath(
        name in "[a-z][a-z0-9]{0,10}",
        version in "[0-9]{1,2}\\.[0-9]{1,2}",
        arch in "(x86_64|aarch64|noarch)",
        subpath in "[a-z]{1,6}",
    ) {
        let normalizer = PurlNormalizer::new();
        let plain = Purl::parse(&format!("pkg:rpm/redhat/{name}@{version}")).unwrap();
        let noisy = Purl::parse(&format!("pkg:rpm/redhat/{name}@{version}?arch={arch}#{subpath}")).unwrap();
        prop_assert_eq!(normalizer.normalize_coarse(&plain), normalizer.normalize_coarse(&noisy));
        prop_assert_ne!(normalizer.normalize_full(&plain), normalizer.normalize_full(&noisy));
    }

    #[test]
    fn canonical_rendering_is_stable(
        name in "[a-z][a-z0-9.-]{0,10}",
        version in "[0-9]{1,2}\\.[0-9]{1,2}",
    ) {
        let rendered = Purl::parse(&format!("pkg:pypi/{name}@{version}")).unwrap().to_string();
        let reparsed = Purl::parse(&rendered).unwrap().to_string();
        prop_assert_eq!(rendered, reparsed);
    }

    #[test]
    fn empty_scanner_keeps_authority(authority in prop::collection::vec(npm_component(), 0..20)) {
        let authority: Vec<CdxComponent> =
            authority.into_iter().filter(|c| c.purl.is_some()).collect();
        let merged = merge_by_preferring_authority(&[], &authority).unwrap();
        prop_assert_eq!(merged, authority);
    }

    #[test]
    fn authority_components_always_survive(
        scanner in prop::collection::vec(npm_component(), 0..20),
        authority in prop::collection::vec(npm_component(), 0..20),
    ) {
        let authority: Vec<CdxComponent> =
            authority.into_iter().filter(|c| c.purl.is_some()).collect();
        let merged = merge_by_preferring_authority(&scanner, &authority).unwrap();
        prop_assert_eq!(&merged[merged.len() - authority.len()..], authority.as_slice());
        for kept in &merged[..merged.len() - authority.len()] {
            let duplicated = authority.iter().any(|a| a.purl.is_some() && a.purl == kept.purl);
            prop_assert!(!duplicated, "scanner duplicate of {:?} kept", kept.purl);
        }
    }

    #[test]
    fn apparent_sameness_keeps_first_occurrence(
        first in prop::collection::vec(npm_component(), 0..20),
        second in prop::collection::vec(npm_component(), 0..20),
    ) {
        let merged = merge_by_apparent_sameness(&first, &second);
        let keys: Vec<String> = merged.iter().map(apparent_key).collect();
        let unique: HashSet<&String> = keys.iter().collect();
        prop_assert_eq!(unique.len(), keys.len());

        for item in first.iter().chain(&second) {
            let key = apparent_key(item);
            let winner = first.iter().chain(&second).find(|c| apparent_key(*c) == key);
            prop_assert!(merged.iter().any(|m| Some(m) == winner));
        }
    }
}
