//! Digest-pinned container image references.

use crate::error::{ParseErrorKind, Result, SbomMergeError};
use crate::model::Purl;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// `repository[:tag]@algorithm:hex`; the repository may carry a registry port.
static IMAGE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<repository>[^@\s]+?)(?::(?P<tag>[\w][\w.-]{0,127}))?@(?P<digest>[A-Za-z][A-Za-z0-9]*(?:[-_+.][A-Za-z][A-Za-z0-9]*)*:[0-9a-fA-F]{32,})$",
    )
    .expect("static regex")
});

/// An image pinned by digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    /// Registry and path, without tag
    pub repository: String,
    /// Last path segment of the repository
    pub name: String,
    /// `algorithm:hex`
    pub digest: String,
    pub tag: Option<String>,
}

impl ImageReference {
    /// Parse `repository[:tag]@digest`, the format `buildah images` reports.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        let captures = IMAGE_REFERENCE
            .captures(reference)
            .ok_or_else(|| invalid(reference, "expected repository[:tag]@algorithm:digest"))?;
        let repository = captures["repository"].to_string();
        Ok(Self {
            name: last_segment(&repository),
            repository,
            digest: captures["digest"].to_string(),
            tag: captures.name("tag").map(|m| m.as_str().to_string()),
        })
    }

    /// Combine a `repository:tag` URL with a separately known digest.
    pub fn from_url_and_digest(url_with_tag: &str, digest: &str) -> Result<Self> {
        let combined = format!("{}@{}", url_with_tag.trim(), digest.trim());
        let parsed = Self::parse(&combined)?;
        if parsed.tag.is_none() {
            return Err(invalid(url_with_tag, "image URL has no tag"));
        }
        Ok(parsed)
    }

    /// `pkg:oci/<name>@<digest>?repository_url=<repository>`
    #[must_use]
    pub fn purl(&self) -> String {
        Purl::new("oci", &self.name)
            .with_version(&self.digest)
            .with_qualifier("repository_url", &self.repository)
            .to_string()
    }

    /// `repository@digest`
    #[must_use]
    pub fn pullspec(&self) -> String {
        format!("{}@{}", self.repository, self.digest)
    }

    #[must_use]
    pub fn digest_algorithm(&self) -> &str {
        self.digest.split_once(':').map_or("", |(algorithm, _)| algorithm)
    }

    #[must_use]
    pub fn digest_hex(&self) -> &str {
        self.digest.split_once(':').map_or("", |(_, hex)| hex)
    }

    /// Hash algorithm name as CycloneDX spells it (`SHA-256`).
    #[must_use]
    pub fn cyclonedx_hash_algorithm(&self) -> String {
        match self.digest_algorithm() {
            "sha256" => "SHA-256".to_string(),
            "sha512" => "SHA-512".to_string(),
            other => other.to_uppercase(),
        }
    }

    /// Checksum algorithm name as SPDX spells it (`SHA256`).
    #[must_use]
    pub fn spdx_checksum_algorithm(&self) -> String {
        self.digest_algorithm().to_uppercase()
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}:{}@{}", self.repository, tag, self.digest),
            None => write!(f, "{}@{}", self.repository, self.digest),
        }
    }
}

fn last_segment(repository: &str) -> String {
    repository
        .rsplit('/')
        .next()
        .unwrap_or(repository)
        .to_string()
}

fn invalid(reference: &str, reason: &str) -> SbomMergeError {
    SbomMergeError::parse(
        "parsing image reference",
        ParseErrorKind::InvalidImageReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        },
    )
}
