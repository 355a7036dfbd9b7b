#![no_main]
use libfuzzer_sys::fuzz_target;
use sbom_merge::Sbom;

/// Fuzz dialect detection and document parsing.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = Sbom::from_json_str(s);
    }
});
