//! Config decoding and validation.
//!
//! This crate is intentionally IO-free: the host hands us a flat string map (or the CLI hands us
//! TOML text) and we turn it into validated [`Settings`].

#![forbid(unsafe_code)]

mod defaults;
mod model;
mod resolve;

pub use model::{EvidraConfigV1, keys};
pub use resolve::{Overrides, Settings, SettingsError, resolve_settings};

use std::collections::BTreeMap;

/// Parse `evidra.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> Result<EvidraConfigV1, SettingsError> {
    let cfg: EvidraConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Decode the host's flat configuration map: the plugin `Configure` entry point.
pub fn configure(map: &BTreeMap<String, String>) -> Result<Settings, SettingsError> {
    resolve_settings(map)
}
