use crate::PolicyManifest;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// One evaluation run of the engine over one or more inputs.
///
/// Field names follow the engine's JSON output (`ec-version`, `effective-time`, ...).
/// Produced by the engine; evidra only reads it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    pub success: bool,
    #[schemars(with = "Option<Vec<Input>>")]
    #[serde(default, deserialize_with = "null_as_empty")]
    pub filepaths: Vec<Input>,
    #[serde(default)]
    pub policy: PolicyManifest,
    #[serde(rename = "ec-version", default)]
    pub ec_version: String,
    #[schemars(with = "String")]
    #[serde(rename = "effective-time", with = "time::serde::rfc3339")]
    pub effective_time: OffsetDateTime,
}

/// One evaluated file or resource inside a report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Input {
    pub filepath: String,
    #[schemars(with = "Option<Vec<RuleResult>>")]
    #[serde(default, deserialize_with = "null_as_empty")]
    pub violations: Vec<RuleResult>,
    #[schemars(with = "Option<Vec<RuleResult>>")]
    #[serde(default, deserialize_with = "null_as_empty")]
    pub warnings: Vec<RuleResult>,
    #[schemars(with = "Option<Vec<RuleResult>>")]
    #[serde(default, deserialize_with = "null_as_empty")]
    pub successes: Vec<RuleResult>,
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "success-count", default)]
    pub success_count: u32,
}

/// A single finding reported by the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleResult {
    #[serde(rename = "msg", default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<String>>,
}

// The engine writes absent lists as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl RuleResult {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            metadata: None,
            outputs: None,
        }
    }
}
