//! Identity keys for components and packages.

use super::purl::PurlNormalizer;
use crate::error::Result;
use crate::model::{CdxComponent, Purl, SpdxPackage, ToolComponent};

/// Anything that carries package identity: a name, an optional version and
/// zero or more purls.
pub trait SbomItem {
    fn item_name(&self) -> &str;

    fn item_version(&self) -> Option<&str>;

    /// Raw purl strings, in document order.
    fn raw_purls(&self) -> Vec<&str>;
}

impl SbomItem for CdxComponent {
    fn item_name(&self) -> &str {
        &self.name
    }

    fn item_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn raw_purls(&self) -> Vec<&str> {
        self.purl.as_deref().into_iter().collect()
    }
}

impl SbomItem for ToolComponent {
    fn item_name(&self) -> &str {
        &self.name
    }

    fn item_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn raw_purls(&self) -> Vec<&str> {
        self.purl.as_deref().into_iter().collect()
    }
}

impl SbomItem for SpdxPackage {
    fn item_name(&self) -> &str {
        &self.name
    }

    fn item_version(&self) -> Option<&str> {
        self.version_info.as_deref()
    }

    fn raw_purls(&self) -> Vec<&str> {
        self.purl_locators().collect()
    }
}

/// `name@version`, the identity of items without a purl.
pub fn name_version_key<I: SbomItem + ?Sized>(item: &I) -> String {
    format!("{}@{}", item.item_name(), item.item_version().unwrap_or_default())
}

/// Parsed purls of an item; unparseable ones are skipped.
pub fn parsed_purls<I: SbomItem + ?Sized>(item: &I) -> Vec<Purl> {
    item.raw_purls()
        .into_iter()
        .filter_map(|raw| match Purl::parse(raw) {
            Ok(purl) => Some(purl),
            Err(err) => {
                tracing::debug!("Ignoring purl of '{}': {}", item.item_name(), err);
                None
            }
        })
        .collect()
}

/// Coarse keys of an authoritative item. A malformed purl is an error since
/// the resolver's identities are trusted as ground truth.
pub fn authority_keys<I: SbomItem + ?Sized>(item: &I) -> Result<Vec<String>> {
    let normalizer = PurlNormalizer::new();
    item.raw_purls()
        .into_iter()
        .map(|raw| Purl::parse(raw).map(|purl| normalizer.normalize_coarse(&purl)))
        .collect()
}

/// Fine keys of a scanner item, or `name@version` when it has no usable purl.
pub fn scanner_keys<I: SbomItem + ?Sized>(item: &I) -> Vec<String> {
    let normalizer = PurlNormalizer::new();
    let keys: Vec<String> = parsed_purls(item)
        .iter()
        .map(|purl| normalizer.normalize_fine(purl))
        .collect();
    if keys.is_empty() {
        vec![name_version_key(item)]
    } else {
        keys
    }
}

/// Key used when neither side is authoritative: the full purl, or
/// `name@version` without one.
pub fn apparent_key<I: SbomItem + ?Sized>(item: &I) -> String {
    let normalizer = PurlNormalizer::new();
    parsed_purls(item)
        .first()
        .map_or_else(|| name_version_key(item), |purl| normalizer.normalize_full(purl))
}
