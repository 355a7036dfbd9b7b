//! Scanner duplicate detection against an authoritative resolver report.

use super::identity::{authority_keys, parsed_purls, scanner_keys, SbomItem};
use super::purl::is_version_subpath;
use crate::error::Result;
use std::collections::HashSet;
use std::fmt;

/// Why a scanner item was judged to duplicate a resolver item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateReason {
    /// Golang build-local replace directive
    LocalReplacement,
    /// Same name as a dependency the resolver fetched outside the package index
    NonRegistry,
    /// npm package that is a local workspace of the resolved project
    LocalWorkspace,
    /// Fine key matches a resolver coarse key
    SameIdentity,
}

impl fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::LocalReplacement => "local replacement",
            Self::NonRegistry => "non-registry dependency",
            Self::LocalWorkspace => "local workspace package",
            Self::SameIdentity => "same identity",
        };
        f.write_str(reason)
    }
}

/// Golang item produced by a build-local `replace` directive.
///
/// Scanners mis-report these; the resolver reports them correctly, so they
/// are always dropped from scanner output.
pub fn is_local_replacement<I: SbomItem + ?Sized>(item: &I) -> bool {
    let devel = item.item_version() == Some("(devel)");
    let dotted = item.item_name().starts_with('.');
    parsed_purls(item).iter().filter(|p| p.ty == "golang").any(|purl| {
        dotted
            || devel
            || purl.qualified_name().starts_with('.')
            || purl.version.as_deref() == Some("(devel)")
            || purl
                .subpath
                .as_deref()
                .is_some_and(|subpath| !is_version_subpath(subpath))
    })
}

/// pypi/npm item fetched from a VCS or a direct URL instead of the index.
pub fn is_non_registry<I: SbomItem + ?Sized>(item: &I) -> bool {
    parsed_purls(item).iter().any(|purl| {
        matches!(purl.ty.as_str(), "pypi" | "npm")
            && (purl.qualifier("vcs_url").is_some() || purl.qualifier("download_url").is_some())
    })
}

/// Index of an authoritative item list used to filter scanner output.
#[derive(Debug, Default)]
pub struct ScannerFilter {
    keys: HashSet<String>,
    non_registry_names: HashSet<String>,
    local_paths: HashSet<String>,
}

impl ScannerFilter {
    /// Index the authoritative items.
    pub fn new<I: SbomItem>(authority: &[I]) -> Result<Self> {
        let mut filter = Self::default();
        for item in authority {
            filter.keys.extend(authority_keys(item)?);
            if is_non_registry(item) {
                filter.non_registry_names.insert(item.item_name().to_string());
            }
            for purl in parsed_purls(item) {
                if purl.ty == "npm" {
                    if let Some(subpath) = purl.subpath.as_deref() {
                        filter.local_paths.insert(normalize_path(subpath));
                    }
                }
            }
        }
        Ok(filter)
    }

    /// Classify a scanner item; `None` means it is kept.
    pub fn duplicate_reason<I: SbomItem + ?Sized>(&self, item: &I) -> Option<DuplicateReason> {
        if is_local_replacement(item) {
            return Some(DuplicateReason::LocalReplacement);
        }
        if self.non_registry_names.contains(item.item_name()) {
            return Some(DuplicateReason::NonRegistry);
        }
        if self.is_local_workspace(item) {
            return Some(DuplicateReason::LocalWorkspace);
        }
        if scanner_keys(item).iter().any(|key| self.keys.contains(key)) {
            return Some(DuplicateReason::SameIdentity);
        }
        None
    }

    fn is_local_workspace<I: SbomItem + ?Sized>(&self, item: &I) -> bool {
        if self.local_paths.is_empty() {
            return false;
        }
        parsed_purls(item)
            .iter()
            .filter(|purl| purl.ty == "npm")
            .any(|purl| self.local_paths.contains(&normalize_path(&purl.qualified_name())))
    }
}

/// Drop empty and `.` segments so `./packages/a/` equals `packages/a`.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CdxComponent;

    fn component(name: &str, version: Option<&str>, purl: Option<&str>) -> CdxComponent {
        let mut c = CdxComponent::new("library", name);
        c.version = version.map(str::to_string);
        c.purl = purl.map(str::to_string);
        c
    }

    #[test]
    fn test_local_replacement_devel_version() {
        let c = component("./local", Some("(devel)"), Some("pkg:golang/./local@(devel)"));
        assert!(is_local_replacement(&c));
    }

    #[test]
    fn test_local_replacement_non_version_subpath() {
        let c = component("x", Some("v1.0.0"), Some("pkg:golang/github.com/a/x@v1.0.0#pkg/sub"));
        assert!(is_local_replacement(&c));
        let major = component("x", Some("v2.0.0"), Some("pkg:golang/github.com/a/x@v2.0.0#v2"));
        assert!(!is_local_replacement(&major));
    }

    #[test]
    fn test_local_replacement_requires_golang() {
        let c = component(".hidden", Some("(devel)"), Some("pkg:npm/.hidden@1"));
        assert!(!is_local_replacement(&c));
        assert!(!is_local_replacement(&component("./x", Some("(devel)"), None)));
    }

    #[test]
    fn test_non_registry() {
        assert!(is_non_registry(&component(
            "foo",
            None,
            Some("pkg:pypi/foo@1.0?vcs_url=git%2Bhttps://github.com/a/foo")
        )));
        assert!(is_non_registry(&component(
            "bar",
            None,
            Some("pkg:npm/bar@1.0?download_url=https://x/bar.tgz")
        )));
        assert!(!is_non_registry(&component(
            "baz",
            None,
            Some("pkg:golang/baz@1.0?vcs_url=git%2Bhttps://x")
        )));
    }

    #[test]
    fn test_filter_same_identity() {
        let authority = vec![component("ex", Some("v1.0.0"), Some("pkg:golang/ex@v1.0.0?type=module"))];
        let filter = ScannerFilter::new(&authority).unwrap();
        let scanner = component("ex", Some("v1.0.0"), Some("pkg:golang/ex@v1.0.0"));
        assert_eq!(filter.duplicate_reason(&scanner), Some(DuplicateReason::SameIdentity));
    }

    #[test]
    fn test_filter_non_registry_matches_by_name() {
        let authority = vec![component(
            "foo",
            Some("1.0"),
            Some("pkg:pypi/foo@1.0?vcs_url=git%2Bhttps://github.com/a/foo%40abcdef"),
        )];
        let filter = ScannerFilter::new(&authority).unwrap();
        let scanner = component("foo", Some("0.0.0"), Some("pkg:pypi/foo@0.0.0"));
        assert_eq!(filter.duplicate_reason(&scanner), Some(DuplicateReason::NonRegistry));
    }

    #[test]
    fn test_filter_npm_local_workspace() {
        let authority = vec![component(
            "workspace-a",
            Some("1.0.0"),
            Some("pkg:npm/workspace-a@1.0.0#packages/workspace-a"),
        )];
        let filter = ScannerFilter::new(&authority).unwrap();
        let scanner = component("workspace-a", None, Some("pkg:npm/packages/workspace-a"));
        assert_eq!(filter.duplicate_reason(&scanner), Some(DuplicateReason::LocalWorkspace));
    }

    #[test]
    fn test_filter_keeps_unrelated_and_os_packages() {
        let authority = vec![component("ex", Some("v1"), Some("pkg:golang/ex@v1"))];
        let filter = ScannerFilter::new(&authority).unwrap();
        assert_eq!(filter.duplicate_reason(&component("bash", Some("5.1"), None)), None);
        assert_eq!(
            filter.duplicate_reason(&component("ex", Some("v2"), Some("pkg:golang/ex@v2"))),
            None
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./packages//a/"), "packages/a");
    }
}
