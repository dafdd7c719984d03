//! Fuzz target for engine report parsing and indexing.
//!
//! Goal: The parser should **never panic** on any input.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_report_parser
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = evidra_files::fuzz::parse_report(text);
        let _ = evidra_files::fuzz::is_valid_check_id(text);
    }
});
