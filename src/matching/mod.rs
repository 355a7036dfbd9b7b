//! PURL identity resolution.
//!
//! Decides which entries reported by different tools denote the same
//! package:
//! - [`PurlNormalizer`] builds coarse (resolver) and fine (scanner) keys
//! - [`SbomItem`] abstracts over CycloneDX components, tool components and SPDX packages
//! - [`ScannerFilter`] flags scanner entries that duplicate an authoritative report

mod filter;
mod identity;
mod purl;

pub use filter::{is_local_replacement, is_non_registry, DuplicateReason, ScannerFilter};
pub use identity::{
    apparent_key, authority_keys, name_version_key, parsed_purls, scanner_keys, SbomItem,
};
pub use purl::{is_version_subpath, PurlNormalizer};
