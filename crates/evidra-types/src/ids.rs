//! Stable identifiers and fixed strings shared across crates.

// Files
pub const MANIFEST_FILE_NAME: &str = "policy.yaml";
pub const POLICY_FILE_EXTENSION: &str = "rego";
pub const DEFAULT_RESULTS_PATTERN: &str = "**/*.json";

/// Policy-language version every bundle is compiled against.
pub const REGO_VERSION: &str = "v1";

// Observations
pub const METHOD_TEST_AUTOMATED: &str = "TEST-AUTOMATED";
pub const SUBJECT_TYPE_RESOURCE: &str = "resource";
pub const REASON_NOT_PROVIDED: &str = "no reason provided";

// Normalized decisions
pub const REASON_DEFAULT_DENY: &str = "no decision / denied";
pub const REASON_PASSED: &str = "policy passed validation";
pub const REASON_VIOLATIONS: &str = "policy denied due to violations";
pub const REASON_ERROR_PREFIX: &str = "policy evaluation error";

// Activity status
pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_SUCCESS_ID: i32 = 1;
pub const STATUS_FAILURE: &str = "failure";
pub const STATUS_FAILURE_ID: i32 = 2;

// Activity metadata
pub const PRODUCT_NAME: &str = "conforma";
pub const VENDOR_NAME: &str = "conforma";
pub const OCSF_SCHEMA_VERSION: &str = "1.5.0";
