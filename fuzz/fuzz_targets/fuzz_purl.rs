#![no_main]
use libfuzzer_sys::fuzz_target;
use sbom_merge::{Purl, PurlNormalizer};

/// Fuzz purl parsing, normalization and canonical rendering.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(purl) = Purl::parse(s) {
            let normalizer = PurlNormalizer::new();
            let _ = normalizer.normalize_coarse(&purl);
            let _ = normalizer.normalize_fine(&purl);
            let _ = Purl::parse(&purl.to_string());
        }
    }
});
