//! OCSF-shaped activity records pushed to the evidence sink.
//!
//! Both variants share [`ActivityBase`] (metadata, status, resources, timing) and differ only
//! in their class/type identifiers and in the scan sub-record.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which activity class to emit. Chosen by the caller, never inferred from report data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    #[default]
    Api,
    Scan,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::Api => "api",
            ActivityKind::Scan => "scan",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(ActivityKind::Api),
            "scan" => Ok(ActivityKind::Scan),
            other => Err(format!(
                "unknown activity kind: {other} (expected 'api' or 'scan')"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Product {
    pub name: String,
    pub vendor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActivityMetadata {
    pub product: Product,
    /// OCSF schema version the record conforms to.
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceDetails {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActivityBase {
    pub activity_id: i32,
    pub activity_name: String,
    pub category_uid: i32,
    pub category_name: String,
    pub class_uid: i32,
    pub class_name: String,
    pub type_uid: i64,
    pub type_name: String,
    pub status: String,
    pub status_id: i32,
    pub severity: String,
    pub severity_id: i32,
    pub metadata: ActivityMetadata,
    #[serde(default)]
    pub resources: Vec<ResourceDetails>,
    /// Evaluation effective time, milliseconds since the Unix epoch.
    pub time: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ApiActivity {
    #[serde(flatten)]
    pub base: ActivityBase,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScanDetails {
    pub uid: String,
    pub name: String,
    pub type_id: i32,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScanActivity {
    #[serde(flatten)]
    pub base: ActivityBase,
    pub scan: ScanDetails,
    pub num_files: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
#[allow(clippy::large_enum_variant)]
pub enum Activity {
    // Scan first: an API record would otherwise swallow scan fields on deserialize.
    Scan(ScanActivity),
    Api(ApiActivity),
}

impl Activity {
    pub fn base(&self) -> &ActivityBase {
        match self {
            Activity::Api(a) => &a.base,
            Activity::Scan(s) => &s.base,
        }
    }

    pub fn kind(&self) -> ActivityKind {
        match self {
            Activity::Api(_) => ActivityKind::Api,
            Activity::Scan(_) => ActivityKind::Scan,
        }
    }
}
