use evidra_types::ids;

/// Defaults applied when a key is absent or empty.
///
/// Keep these small and readable. Anything deployment-specific belongs in the host config.
pub const EVIDENCE_TIMEOUT_MS: u64 = 10_000;
pub const RESULTS_PATTERN: &str = ids::DEFAULT_RESULTS_PATTERN;
pub const OPA_BINARY: &str = "opa";

/// Where manifest sources point when no explicit target location is configured:
/// the bundle archive if one is built, otherwise the composed output directory.
pub fn bundle_target_location(bundle: Option<&str>, policy_output: &str) -> String {
    bundle.unwrap_or(policy_output).to_string()
}
