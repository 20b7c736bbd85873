#![no_main]
use drift_tools::MappingFamily;
use drift_tools::diff::mappings::parse_mapping_filename;
use libfuzzer_sys::fuzz_target;

/// Fuzz mapping filename parsing against every family's arity.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        for family in MappingFamily::ALL {
            let _ = parse_mapping_filename(family, s);
        }
    }
});
