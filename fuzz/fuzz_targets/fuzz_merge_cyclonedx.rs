#![no_main]
use libfuzzer_sys::fuzz_target;
use sbom_merge::{merge_sbom, MergePolicy, Sbom};

const MAX_WRAPPED_INPUT_LEN: usize = 10_000;

/// Fuzz the component merge with arbitrary component lists.
///
/// Input is wrapped as the components of a scanner document and merged
/// under a fixed resolver document.
fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    if s.len() >= MAX_WRAPPED_INPUT_LEN {
        return;
    }
    let wrapped = format!(r#"{{"bomFormat":"CycloneDX","specVersion":"1.5","components":[{s}]}}"#);
    let Ok(scanner) = Sbom::from_json_str(&wrapped) else {
        return;
    };
    let resolver = r#"{"bomFormat":"CycloneDX","specVersion":"1.4","components":[
        {"type":"library","name":"requests","purl":"pkg:pypi/requests@2.31.0"},
        {"type":"library","name":"mod","purl":"pkg:golang/github.com/ex/mod/v2@v2.0.0"}
    ]}"#;
    if let Ok(resolver) = Sbom::from_json_str(resolver) {
        let _ = merge_sbom(&scanner, &resolver, MergePolicy::PreferAuthority);
        let _ = merge_sbom(&scanner, &scanner, MergePolicy::ApparentSameness);
    }
});
