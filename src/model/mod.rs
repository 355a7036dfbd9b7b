//! Document model for CycloneDX and SPDX SBOMs.
//!
//! Documents are modelled as owned values: merge and rewrite operations take
//! their inputs by reference and hand back a new document.

mod cyclonedx;
mod format;
mod purl;
mod spdx;

pub use cyclonedx::{
    CdxComponent, CdxFormula, CdxHash, CdxMetadata, CdxProperty, CycloneDxBom, Tool,
    ToolComponent, ToolComponents, ToolsRepresentation,
};
pub use format::{Sbom, SbomFormat};
pub use purl::Purl;
pub use spdx::{
    Annotation, CreationInfo, DocumentAnnotation, ExternalRef, Relationship, RelationshipType,
    SpdxChecksum, SpdxDocument, SpdxPackage,
};
