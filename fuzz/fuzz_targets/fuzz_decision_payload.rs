//! Fuzz target for decision payload normalization.
//!
//! Goal: normalization is total. Any JSON value yields a result, never a panic, and an error
//! field always wins over a pass flag.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_decision_payload
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    for result in evidra_domain::normalize_result_set(&value) {
        if result.error.is_some() {
            assert!(!result.passed, "error must never pass");
        }
        if !result.violations.is_empty() {
            assert!(!result.passed, "violations must never pass");
        }
    }
});
