//! N-way merge planning over resolver and scanner outputs.

use super::{merge_sbom, MergePolicy};
use crate::error::{MergeErrorKind, ParseErrorKind, Result, SbomMergeError};
use crate::model::Sbom;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The tool that produced an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Flavour {
    /// Source dependency resolver; authoritative
    Cachi2,
    /// Filesystem/image scanner
    Syft,
}

impl FromStr for Flavour {
    type Err = SbomMergeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cachi2" => Ok(Self::Cachi2),
            "syft" => Ok(Self::Syft),
            other => Err(SbomMergeError::parse(
                "parsing input flavour",
                ParseErrorKind::InvalidFlavour(other.to_string()),
            )),
        }
    }
}

impl fmt::Display for Flavour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cachi2 => f.write_str("cachi2"),
            Self::Syft => f.write_str("syft"),
        }
    }
}

/// A `[flavour:]path` command-line argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlavouredInput {
    pub flavour: Flavour,
    pub path: PathBuf,
}

impl FlavouredInput {
    /// Split off a known flavour prefix; anything else is a plain path.
    #[must_use]
    pub fn parse(arg: &str, default: Flavour) -> Self {
        if let Some((prefix, path)) = arg.split_once(':') {
            if let Ok(flavour) = prefix.parse() {
                return Self {
                    flavour,
                    path: PathBuf::from(path),
                };
            }
        }
        Self {
            flavour: default,
            path: PathBuf::from(arg),
        }
    }

    /// Parse every argument; the first defaults to `first_default`, the
    /// others to `default`.
    #[must_use]
    pub fn parse_all(args: &[String], first_default: Flavour, default: Flavour) -> Vec<Self> {
        args.iter()
            .enumerate()
            .map(|(idx, arg)| Self::parse(arg, if idx == 0 { first_default } else { default }))
            .collect()
    }
}

/// Merge any number of resolver and scanner documents into one.
///
/// Scanner documents are reduced pairwise by apparent sameness, then the
/// resolver document (at most one) is applied with authority.
pub fn merge_documents(inputs: Vec<(Flavour, Sbom)>) -> Result<Sbom> {
    if inputs.len() < 2 {
        return Err(SbomMergeError::merge(
            "planning merge",
            MergeErrorKind::NotEnoughInputs(inputs.len()),
        ));
    }
    let format = inputs[0].1.format();
    if let Some((_, other)) = inputs.iter().find(|(_, sbom)| sbom.format() != format) {
        return Err(SbomMergeError::merge(
            "planning merge",
            MergeErrorKind::FormatMismatch {
                left: format.to_string(),
                right: other.format().to_string(),
            },
        ));
    }

    let (resolvers, scanners): (Vec<_>, Vec<_>) = inputs
        .into_iter()
        .partition(|(flavour, _)| *flavour == Flavour::Cachi2);
    if resolvers.len() > 1 {
        return Err(SbomMergeError::merge(
            "planning merge",
            MergeErrorKind::UnsupportedCombination(format!(
                "{} cachi2 documents, at most one is supported",
                resolvers.len()
            )),
        ));
    }
    tracing::info!(
        "Merging {} scanner and {} resolver {} documents",
        scanners.len(),
        resolvers.len(),
        format
    );

    let mut scanners = scanners.into_iter().map(|(_, sbom)| sbom);
    let resolver = resolvers.into_iter().next().map(|(_, sbom)| sbom);
    let Some(first) = scanners.next() else {
        return resolver.ok_or_else(|| {
            SbomMergeError::merge("planning merge", MergeErrorKind::NotEnoughInputs(0))
        });
    };
    let mut merged = first;
    for next in scanners {
        merged = merge_sbom(&merged, &next, MergePolicy::ApparentSameness)?;
    }

    match resolver {
        Some(resolver) => merge_sbom(&merged, &resolver, MergePolicy::PreferAuthority),
        None => Ok(merged),
    }
}
