//! Fuzz target for config decoding.
//!
//! Goal: TOML parsing and settings resolution return errors, never panic.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_toml
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data)
        && let Ok(cfg) = evidra_settings::parse_config_toml(text)
    {
        let _ = evidra_settings::configure(&cfg.to_map());
    }
});
