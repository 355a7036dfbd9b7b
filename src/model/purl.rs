//! Package URL value type.
//!
//! Parsing follows the purl grammar (`pkg:type/namespace/name@version?qualifiers#subpath`).
//! Rendering is canonical: qualifiers are sorted and every component is
//! percent-encoded the same way, so two purls that denote the same package
//! render to the same string regardless of how their producers escaped them.

use crate::error::{Result, SbomMergeError};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Characters left unescaped in type, namespace, name, version and subpath segments.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b':');

/// Qualifier values additionally keep `/` readable (`repository_url=quay.io/org/repo`).
const QUALIFIER_VALUE: &AsciiSet = &COMPONENT.remove(b'/');

/// A parsed package URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Purl {
    /// Package type (`golang`, `pypi`, `npm`, `oci`, ...), always lowercase
    pub ty: String,
    /// Optional `/`-separated namespace
    pub namespace: Option<String>,
    /// Package name
    pub name: String,
    /// Optional version
    pub version: Option<String>,
    /// Qualifiers keyed by lowercase name
    pub qualifiers: BTreeMap<String, String>,
    /// Optional `/`-separated subpath
    pub subpath: Option<String>,
}

impl Purl {
    /// Create a purl with just a type and a name.
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into().to_ascii_lowercase(),
            namespace: None,
            name: name.into(),
            version: None,
            qualifiers: BTreeMap::new(),
            subpath: None,
        }
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Add a qualifier.
    #[must_use]
    pub fn with_qualifier(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.qualifiers
            .insert(key.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Parse a purl string.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| SbomMergeError::invalid_purl(raw, reason);

        let rest = strip_scheme(raw.trim()).ok_or_else(|| invalid("missing pkg: scheme"))?;
        let rest = rest.trim_start_matches('/');

        let (rest, subpath) = match rest.rsplit_once('#') {
            Some((head, tail)) => (head, parse_subpath(tail)),
            None => (rest, None),
        };
        let (rest, qualifiers) = match rest.rsplit_once('?') {
            Some((head, tail)) => (head, parse_qualifiers(tail)),
            None => (rest, BTreeMap::new()),
        };

        let (ty, rest) = rest
            .split_once('/')
            .ok_or_else(|| invalid("missing package name"))?;
        if ty.is_empty() {
            return Err(invalid("missing package type"));
        }
        let rest = rest.trim_end_matches('/');

        // An '@' only separates the version when no '/' follows it; npm
        // scopes may appear unescaped in the namespace.
        let (path, version) = match rest.rfind('@') {
            Some(at) if !rest[at..].contains('/') => {
                let version = decode(&rest[at + 1..]);
                (&rest[..at], (!version.is_empty()).then_some(version))
            }
            _ => (rest, None),
        };

        let mut segments: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(decode)
            .collect();
        let name = segments
            .pop()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| invalid("missing package name"))?;
        let namespace = (!segments.is_empty()).then(|| segments.join("/"));

        Ok(Self {
            ty: ty.to_ascii_lowercase(),
            namespace,
            name,
            version,
            qualifiers,
            subpath,
        })
    }

    /// Copy of this purl without qualifiers and subpath.
    #[must_use]
    pub fn without_qualifiers_and_subpath(&self) -> Self {
        Self {
            qualifiers: BTreeMap::new(),
            subpath: None,
            ..self.clone()
        }
    }

    /// Get a qualifier value.
    #[must_use]
    pub fn qualifier(&self, key: &str) -> Option<&str> {
        self.qualifiers.get(key).map(String::as_str)
    }

    /// `namespace/name`, or just the name without a namespace.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl FromStr for Purl {
    type Err = SbomMergeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Purl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pkg:{}/", self.ty)?;
        if let Some(namespace) = &self.namespace {
            for segment in namespace.split('/').filter(|s| !s.is_empty()) {
                write!(f, "{}/", utf8_percent_encode(segment, COMPONENT))?;
            }
        }
        write!(f, "{}", utf8_percent_encode(&self.name, COMPONENT))?;
        if let Some(version) = &self.version {
            write!(f, "@{}", utf8_percent_encode(version, COMPONENT))?;
        }

        let mut separator = '?';
        for (key, value) in self.qualifiers.iter().filter(|(_, v)| !v.is_empty()) {
            write!(
                f,
                "{separator}{key}={}",
                utf8_percent_encode(value, QUALIFIER_VALUE)
            )?;
            separator = '&';
        }

        if let Some(subpath) = &self.subpath {
            let encoded: Vec<String> = subpath
                .split('/')
                .filter(|s| !s.is_empty())
                .map(|s| utf8_percent_encode(s, COMPONENT).to_string())
                .collect();
            if !encoded.is_empty() {
                write!(f, "#{}", encoded.join("/"))?;
            }
        }
        Ok(())
    }
}

fn strip_scheme(raw: &str) -> Option<&str> {
    raw.get(..4)
        .filter(|scheme| scheme.eq_ignore_ascii_case("pkg:"))
        .map(|_| &raw[4..])
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

fn parse_qualifiers(raw: &str) -> BTreeMap<String, String> {
    raw.split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.to_ascii_lowercase(), decode(value)))
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .collect()
}

fn parse_subpath(raw: &str) -> Option<String> {
    let segments: Vec<String> = raw
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(decode)
        .collect();
    (!segments.is_empty()).then(|| segments.join("/"))
}
