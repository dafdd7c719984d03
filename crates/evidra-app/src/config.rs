use anyhow::Context;
use evidra_settings::{Overrides, Settings};
use std::collections::BTreeMap;

/// Host entry point: decode and validate a flat configuration map.
pub fn configure(map: &BTreeMap<String, String>) -> anyhow::Result<Settings> {
    evidra_settings::configure(map).context("error decoding configuration")
}

/// CLI entry point: TOML text (may be empty) with `--set` overrides layered on top.
pub fn load_settings(config_text: &str, overrides: &Overrides) -> anyhow::Result<Settings> {
    let mut map = if config_text.trim().is_empty() {
        BTreeMap::new()
    } else {
        evidra_settings::parse_config_toml(config_text)
            .context("parse config")?
            .to_map()
    };
    overrides.apply(&mut map);
    configure(&map)
}
