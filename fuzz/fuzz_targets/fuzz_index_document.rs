#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz the YAML index loader.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = drift_tools::ContentIndex::from_yaml_str(s);
    }
});
