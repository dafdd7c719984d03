use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys of the flat configuration map.
pub mod keys {
    pub const POLICY_TEMPLATES: &str = "policy_templates";
    pub const POLICY_OUTPUT: &str = "policy_output";
    pub const POLICY_RESULTS: &str = "policy_results";
    pub const BUNDLE: &str = "bundle";
    pub const BUNDLE_REVISION: &str = "bundle_revision";
    pub const BUNDLE_TARGET_LOCATION: &str = "bundle_target_location";
    pub const EVIDENCE_ENDPOINT: &str = "evidence_endpoint";
    pub const EVIDENCE_TIMEOUT_MS: &str = "evidence_timeout_ms";
    pub const ACTIVITY_KIND: &str = "activity_kind";
    pub const POLICY_NAME: &str = "policy_name";
    pub const POLICY_DESCRIPTION: &str = "policy_description";
    pub const RESULTS_PATTERN: &str = "results_pattern";
    pub const OPA_BINARY: &str = "opa_binary";

    pub const ALL: &[&str] = &[
        POLICY_TEMPLATES,
        POLICY_OUTPUT,
        POLICY_RESULTS,
        BUNDLE,
        BUNDLE_REVISION,
        BUNDLE_TARGET_LOCATION,
        EVIDENCE_ENDPOINT,
        EVIDENCE_TIMEOUT_MS,
        ACTIVITY_KIND,
        POLICY_NAME,
        POLICY_DESCRIPTION,
        RESULTS_PATTERN,
        OPA_BINARY,
    ];
}

/// `evidra.toml` schema v1.
///
/// A *user-facing* mirror of the flat map the host passes in. Every field is optional here;
/// required-ness is enforced when resolving.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvidraConfigV1 {
    /// Optional schema string for tooling (`evidra.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Directory holding one `<check-id>.rego` template per check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_templates: Option<String>,

    /// Directory the composed policy set is written to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_output: Option<String>,

    /// Directory scanned for engine result reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_results: Option<String>,

    /// Bundle archive path. Empty or absent skips bundling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_revision: Option<String>,

    /// Policy location written into every manifest source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_target_location: Option<String>,

    /// Evidence sink URL. Empty or absent skips publishing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_timeout_ms: Option<u64>,

    /// `api` (default) or `scan`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_description: Option<String>,

    /// Glob (relative to the results directory) selecting report files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opa_binary: Option<String>,
}

impl EvidraConfigV1 {
    /// Flatten into the string map the host-facing entry point consumes.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut m = BTreeMap::new();
        let mut put = |key: &str, value: &Option<String>| {
            if let Some(v) = value {
                m.insert(key.to_string(), v.clone());
            }
        };

        put(keys::POLICY_TEMPLATES, &self.policy_templates);
        put(keys::POLICY_OUTPUT, &self.policy_output);
        put(keys::POLICY_RESULTS, &self.policy_results);
        put(keys::BUNDLE, &self.bundle);
        put(keys::BUNDLE_REVISION, &self.bundle_revision);
        put(keys::BUNDLE_TARGET_LOCATION, &self.bundle_target_location);
        put(keys::EVIDENCE_ENDPOINT, &self.evidence_endpoint);
        put(
            keys::EVIDENCE_TIMEOUT_MS,
            &self.evidence_timeout_ms.map(|v| v.to_string()),
        );
        put(keys::ACTIVITY_KIND, &self.activity_kind);
        put(keys::POLICY_NAME, &self.policy_name);
        put(keys::POLICY_DESCRIPTION, &self.policy_description);
        put(keys::RESULTS_PATTERN, &self.results_pattern);
        put(keys::OPA_BINARY, &self.opa_binary);

        m
    }
}
