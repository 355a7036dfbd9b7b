//! Purl listing for downstream content scanners.

use crate::model::Sbom;
use serde_json::{json, Value};

/// Every purl in the document, in document order.
#[must_use]
pub fn collect_purls(sbom: &Sbom) -> Vec<String> {
    match sbom {
        Sbom::CycloneDx(bom) => bom
            .components
            .iter()
            .filter_map(|c| c.purl.clone())
            .collect(),
        Sbom::Spdx(doc) => doc
            .packages
            .iter()
            .flat_map(|p| p.purl_locators().map(str::to_string))
            .collect(),
    }
}

/// `{"image_contents": {"dependencies": [{"purl": ..}, ..]}}`
#[must_use]
pub fn purl_listing(sbom: &Sbom) -> Value {
    let dependencies: Vec<Value> = collect_purls(sbom)
        .into_iter()
        .map(|purl| json!({ "purl": purl }))
        .collect();
    json!({ "image_contents": { "dependencies": dependencies } })
}
