//! Tolerant normalization of engine decision payloads.
//!
//! Payload shapes are not contractually fixed, so extraction is best-effort: every field is
//! optional and a field of the wrong type is treated as absent. Normalization never fails; the
//! worst case is a default-deny result.
//!
//! Classification precedence: error > violations > explicit pass flag > default-deny.

use evidra_types::ids::{REASON_DEFAULT_DENY, REASON_ERROR_PREFIX, REASON_PASSED, REASON_VIOLATIONS};
use evidra_types::{NormalizedResult, Outcome, ResourceIdentity};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Fields we know how to read from a decision payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecisionPayload {
    pub pass: Option<bool>,
    pub policy_id: Option<String>,
    pub violations: Vec<String>,
    pub error: Option<String>,
    pub recommendations: Vec<String>,
    pub metadata: Option<BTreeMap<String, JsonValue>>,
    pub resource: Option<ResourceIdentity>,
}

impl DecisionPayload {
    pub fn extract(value: &JsonValue) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        Self {
            pass: obj.get("pass").and_then(JsonValue::as_bool),
            policy_id: non_empty_str(obj.get("policy_id")),
            violations: obj.get("violation").map(violation_names).unwrap_or_default(),
            error: non_empty_str(obj.get("error")),
            recommendations: recommendations(obj),
            metadata: obj.get("metadata").and_then(JsonValue::as_object).map(|m| {
                m.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<BTreeMap<_, _>>()
            }),
            resource: resource(obj),
        }
    }

    pub fn into_normalized(self) -> NormalizedResult {
        let (outcome, passed, reason) = if let Some(err) = &self.error {
            (Outcome::Error, false, format!("{REASON_ERROR_PREFIX}: {err}"))
        } else if !self.violations.is_empty() {
            (Outcome::Fail, false, REASON_VIOLATIONS.to_string())
        } else if self.pass == Some(true) {
            (Outcome::Pass, true, REASON_PASSED.to_string())
        } else {
            (Outcome::Fail, false, REASON_DEFAULT_DENY.to_string())
        };

        NormalizedResult {
            outcome,
            passed,
            policy_id: self.policy_id.unwrap_or_default(),
            reason,
            violations: self.violations,
            recommendations: self.recommendations,
            resource: self.resource,
            metadata: self.metadata,
            error: self.error,
        }
    }
}

/// Normalize a single decision payload.
pub fn normalize(value: &JsonValue) -> NormalizedResult {
    DecisionPayload::extract(value).into_normalized()
}

pub fn normalize_all(values: &[JsonValue]) -> Vec<NormalizedResult> {
    values.iter().map(normalize).collect()
}

/// Normalize every expression value of an engine result set.
///
/// Accepts the engine's JSON output (`{"result": [{"expressions": [{"value": ...}]}]}`), a bare
/// array of results, or a bare array of payloads. Anything else is treated as one payload.
pub fn normalize_result_set(result_set: &JsonValue) -> Vec<NormalizedResult> {
    decision_payloads(result_set).into_iter().map(normalize).collect()
}

fn decision_payloads(result_set: &JsonValue) -> Vec<&JsonValue> {
    let results = match result_set {
        JsonValue::Object(obj) => match obj.get("result") {
            Some(JsonValue::Array(items)) => items,
            // No result array: the object is a payload itself.
            _ => return vec![result_set],
        },
        JsonValue::Array(items) => items,
        other => return vec![other],
    };

    let mut out = Vec::new();
    for item in results {
        match item.get("expressions").and_then(JsonValue::as_array) {
            Some(expressions) => {
                out.extend(expressions.iter().filter_map(|e| e.get("value")));
            }
            None => out.push(item),
        }
    }
    out
}

fn non_empty_str(value: Option<&JsonValue>) -> Option<String> {
    value
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `violation` is usually a rule-name → detail map; sets of names or of `{msg}` objects also
/// show up in the wild.
fn violation_names(value: &JsonValue) -> Vec<String> {
    match value {
        JsonValue::Object(map) => map.keys().cloned().collect(),
        JsonValue::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                JsonValue::String(s) => Some(s.clone()),
                JsonValue::Object(obj) => non_empty_str(obj.get("msg")),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        JsonValue::String(s) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn recommendations(obj: &Map<String, JsonValue>) -> Vec<String> {
    if let Some(items) = obj.get("recommendations").and_then(JsonValue::as_array) {
        return items
            .iter()
            .filter_map(JsonValue::as_str)
            .map(str::to_string)
            .collect();
    }
    non_empty_str(obj.get("recommendation"))
        .into_iter()
        .collect()
}

fn resource(obj: &Map<String, JsonValue>) -> Option<ResourceIdentity> {
    let identity = match obj.get("resource").and_then(JsonValue::as_object) {
        Some(nested) => ResourceIdentity {
            id: non_empty_str(nested.get("id")),
            kind: non_empty_str(nested.get("type")),
            name: non_empty_str(nested.get("name")),
        },
        None => ResourceIdentity {
            id: non_empty_str(obj.get("resource_id")),
            kind: non_empty_str(obj.get("resource_type")),
            name: non_empty_str(obj.get("resource_name")),
        },
    };
    (!identity.is_empty()).then_some(identity)
}
