//! PURL normalization for cross-tool identity.

use crate::model::Purl;

/// PURL normalizer producing the comparison keys used during merges.
///
/// Dependency resolvers report package identity exactly, so their purls are
/// keyed coarsely. Filesystem and image scanners follow different ecosystem
/// conventions, so their purls are first rewritten into the resolver's
/// convention.
pub struct PurlNormalizer;

impl PurlNormalizer {
    /// Create a new PURL normalizer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Key for an authoritative purl: qualifiers and subpath are packaging noise.
    #[must_use]
    pub fn normalize_coarse(&self, purl: &Purl) -> String {
        purl.without_qualifiers_and_subpath().to_string()
    }

    /// Key for a scanner purl, rewritten into resolver conventions.
    ///
    /// Golang versions are percent-encoded by the canonical rendering, so
    /// build metadata such as `+incompatible` compares equal on both sides.
    #[must_use]
    pub fn normalize_fine(&self, purl: &Purl) -> String {
        let mut key = purl.clone();
        match key.ty.as_str() {
            "pypi" => self.normalize_pypi(&mut key),
            "golang" => self.normalize_golang(&mut key),
            _ => {}
        }
        key.to_string()
    }

    /// Full canonical purl, qualifiers and subpath included.
    #[must_use]
    pub fn normalize_full(&self, purl: &Purl) -> String {
        purl.to_string()
    }

    /// `PyPI` names are case-insensitive
    fn normalize_pypi(&self, purl: &mut Purl) {
        purl.name = purl.name.to_lowercase();
    }

    /// Scanners report a module major version (`/v2`) as subpath; resolvers
    /// report it as the last path segment of the module.
    fn normalize_golang(&self, purl: &mut Purl) {
        let Some(subpath) = purl.subpath.take() else {
            return;
        };
        if !is_version_subpath(&subpath) {
            purl.subpath = Some(subpath);
            return;
        }
        purl.namespace = Some(purl.qualified_name());
        purl.name = subpath;
    }
}

impl Default for PurlNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// `v` followed by decimal digits, e.g. `v2`.
#[must_use]
pub fn is_version_subpath(subpath: &str) -> bool {
    subpath
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}
