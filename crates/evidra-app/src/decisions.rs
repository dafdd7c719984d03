use anyhow::Context;
use evidra_types::NormalizedResult;

/// Normalize decision JSON: an engine result set, an array of payloads, or one payload.
pub fn normalize_decisions(text: &str) -> anyhow::Result<Vec<NormalizedResult>> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse decision json")?;
    Ok(evidra_domain::normalize_result_set(&value))
}
