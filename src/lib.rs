//! **Merge and rewrite Software Bills of Materials for container builds.**
//!
//! `sbom-merge` combines the SBOMs produced while building a container image
//! into one document. A dependency resolver (Cachi2) knows exactly which
//! packages it prefetched; a content scanner (Syft) sees everything on disk,
//! including packages the resolver already reported under a slightly different
//! identity. Merging keeps the resolver's view where the two overlap and the
//! scanner's view everywhere else.
//!
//! Both **CycloneDX** 1.x and **SPDX** 2.x JSON are supported. Documents keep
//! their own dialect: CycloneDX components are merged as a flat list, SPDX
//! packages are merged together with their relationship graph.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: typed CycloneDX and SPDX documents that round-trip unknown
//!   fields, plus [`Purl`] parsing and canonical rendering.
//! - **[`matching`]**: purl identity keys deciding when two items are the same
//!   package, and the scanner-duplicate filter.
//! - **[`merge`]**: two-document merges under a [`MergePolicy`] and N-way
//!   merges of `cachi2:`/`syft:` inputs.
//! - **[`provenance`]**: contextual SBOMs that graft a parent image's SBOM under
//!   the component built on top of it.
//! - **[`base_images`]** and **[`image_ref`]**: record base images of a
//!   multi-stage build and make the built image the document's subject.
//! - **[`purls`]**: purl listings for content scanners.
//!
//! ## Merging a resolver and a scanner SBOM
//!
//! ```no_run
//! use sbom_merge::{merge_sbom, MergePolicy, Sbom};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let syft = Sbom::from_json_str(&std::fs::read_to_string("syft.json")?)?;
//!     let cachi2 = Sbom::from_json_str(&std::fs::read_to_string("cachi2.json")?)?;
//!
//!     let merged = merge_sbom(&syft, &cachi2, MergePolicy::PreferAuthority)?;
//!     println!("{} items", merged.item_count());
//!     Ok(())
//! }
//! ```
//!
//! ## Command-Line Interface (CLI)
//!
//! The `sbom-merge` binary wraps these operations in `merge`, `base-images`,
//! `image-ref`, `contextualize` and `purls` subcommands.

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    // `left`/`right` and `base`/`incoming` pairs are clear in context
    clippy::similar_names
)]

pub mod base_images;
pub mod cli;
pub mod config;
pub mod error;
pub mod image_ref;
pub mod matching;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod provenance;
pub mod purls;

// Re-export main types for convenience
pub use base_images::{embed_base_images, ImageReference, ParsedDockerfile, SynthesisOptions};
pub use config::{AppConfig, AppConfigBuilder, ConfigError, Validatable};
pub use error::{ErrorContext, Result, SbomMergeError};
pub use image_ref::add_image_reference;
pub use matching::{PurlNormalizer, ScannerFilter};
pub use merge::{
    merge_cyclonedx, merge_documents, merge_sbom, merge_spdx, Flavour, FlavouredInput, MergePolicy,
};
pub use model::{CycloneDxBom, Purl, Sbom, SbomFormat, SpdxDocument};
pub use provenance::{create_contextual_sbom, ParentSbomSource};
pub use purls::{collect_purls, purl_listing};
