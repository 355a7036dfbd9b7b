//! Document merging.
//!
//! - [`merge_cyclonedx`] merges flat component lists
//! - [`merge_spdx`] grafts one relationship graph onto another
//! - [`merge_documents`] plans an N-way merge of resolver and scanner outputs

mod cyclonedx;
mod graph;
mod plan;
mod spdx;

pub use cyclonedx::{
    merge_by_apparent_sameness, merge_by_preferring_authority, merge_cyclonedx, merge_tools,
};
pub use graph::{Anchors, RelationshipGraph};
pub use plan::{merge_documents, Flavour, FlavouredInput};
pub use spdx::{merge_annotations, merge_external_refs, merge_spdx, prune_unreferenced};

use crate::error::{MergeErrorKind, Result, SbomMergeError};
use crate::model::Sbom;

/// How to resolve items reported by both documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// The right (incoming) document is the resolver output and always wins
    PreferAuthority,
    /// Both documents are equally trusted; the first occurrence wins
    ApparentSameness,
}

/// Merge two documents of the same dialect.
pub fn merge_sbom(left: &Sbom, right: &Sbom, policy: MergePolicy) -> Result<Sbom> {
    match (left, right) {
        (Sbom::CycloneDx(left), Sbom::CycloneDx(right)) => {
            merge_cyclonedx(left, right, policy).map(Sbom::CycloneDx)
        }
        (Sbom::Spdx(base), Sbom::Spdx(incoming)) => {
            merge_spdx(base, incoming, policy).map(Sbom::Spdx)
        }
        _ => Err(SbomMergeError::merge(
            "merging documents",
            MergeErrorKind::FormatMismatch {
                left: left.format().to_string(),
                right: right.format().to_string(),
            },
        )),
    }
}
