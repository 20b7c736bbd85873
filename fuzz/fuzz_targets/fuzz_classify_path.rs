#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz repository path classification.
///
/// Every path the tree differ reports goes through the classifier, so any
/// UTF-8 input must classify or fail cleanly.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = drift_tools::classify_path(s);
    }
});
