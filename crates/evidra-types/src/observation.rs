use crate::Outcome;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Result handed back to the orchestration framework.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PvpResult {
    #[serde(default)]
    pub observations_by_check: Vec<Observation>,
}

/// Evidence for one (rule, check) pair that had at least one matching report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Observation {
    pub title: String,
    pub check_id: String,
    pub description: String,
    pub methods: Vec<String>,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub collected: OffsetDateTime,
    pub subjects: Vec<Subject>,
}

/// One evaluated file or resource within an observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Subject {
    pub title: String,
    pub resource_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub result: Outcome,
    pub reason: String,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub evaluated_on: OffsetDateTime,
}
