use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The policy manifest (`policy.yaml`) written next to the composed policy files.
///
/// Engine reports echo the same shape back under `policy`, so this type is also used when
/// loading reports. Unknown fields are ignored for that reason.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sources: Vec<PolicySource>,
}

/// One source block per catalog rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicySource {
    #[serde(default)]
    pub name: String,
    /// Locations the engine fetches policy from.
    #[serde(default)]
    pub policy: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<String>,
    /// Parameter map of the rule; absent when the rule has no parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_data: Option<JsonValue>,
    #[serde(default)]
    pub config: SourceConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl PolicyManifest {
    /// Check ids included by any source, in source order (duplicates preserved).
    pub fn included_checks(&self) -> impl Iterator<Item = &str> {
        self.sources
            .iter()
            .flat_map(|s| s.config.include.iter().map(String::as_str))
    }
}
