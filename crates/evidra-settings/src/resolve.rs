use crate::{defaults, model::keys};
use camino::Utf8PathBuf;
use evidra_types::ActivityKind;
use globset::Glob;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("invalid override (expected key=value): {0}")]
    InvalidOverride(String),

    #[error("parse config toml: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Validated, defaults-completed configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub policy_templates: Utf8PathBuf,
    pub policy_output: Utf8PathBuf,
    pub policy_results: Utf8PathBuf,
    /// `None` skips bundling.
    pub bundle: Option<Utf8PathBuf>,
    pub bundle_revision: String,
    pub bundle_target_location: String,
    /// `None` skips publishing.
    pub evidence_endpoint: Option<String>,
    pub evidence_timeout: Duration,
    pub activity_kind: ActivityKind,
    pub policy_name: String,
    pub policy_description: String,
    pub results_pattern: String,
    pub opa_binary: String,
}

/// `key=value` assignments layered over a base map (CLI `--set`).
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub entries: BTreeMap<String, String>,
}

impl Overrides {
    pub fn parse<I, S>(assignments: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = BTreeMap::new();
        for a in assignments {
            let a = a.as_ref();
            let Some((key, value)) = a.split_once('=') else {
                return Err(SettingsError::InvalidOverride(a.to_string()));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(SettingsError::InvalidOverride(a.to_string()));
            }
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(Self { entries })
    }

    pub fn apply(&self, base: &mut BTreeMap<String, String>) {
        for (k, v) in &self.entries {
            base.insert(k.clone(), v.clone());
        }
    }
}

pub fn resolve_settings(map: &BTreeMap<String, String>) -> Result<Settings, SettingsError> {
    for key in map.keys() {
        if !keys::ALL.contains(&key.as_str()) {
            tracing::warn!(key = %key, "ignoring unknown setting");
        }
    }

    let policy_templates = required(map, keys::POLICY_TEMPLATES)?;
    let policy_output = required(map, keys::POLICY_OUTPUT)?;
    let policy_results = required(map, keys::POLICY_RESULTS)?;

    let bundle = optional(map, keys::BUNDLE);
    let bundle_target_location = optional(map, keys::BUNDLE_TARGET_LOCATION)
        .unwrap_or_else(|| defaults::bundle_target_location(bundle.as_deref(), &policy_output));

    let evidence_endpoint = optional(map, keys::EVIDENCE_ENDPOINT)
        .map(|url| validate_endpoint(&url).map(|()| url))
        .transpose()?;

    let evidence_timeout_ms = match optional(map, keys::EVIDENCE_TIMEOUT_MS) {
        Some(v) => parse_timeout(&v)?,
        None => defaults::EVIDENCE_TIMEOUT_MS,
    };

    let activity_kind = match optional(map, keys::ACTIVITY_KIND) {
        Some(v) => v.parse::<ActivityKind>().map_err(|reason| SettingsError::Invalid {
            key: keys::ACTIVITY_KIND,
            reason,
        })?,
        None => ActivityKind::default(),
    };

    let results_pattern = optional(map, keys::RESULTS_PATTERN)
        .unwrap_or_else(|| defaults::RESULTS_PATTERN.to_string());
    Glob::new(&results_pattern).map_err(|e| SettingsError::Invalid {
        key: keys::RESULTS_PATTERN,
        reason: e.to_string(),
    })?;

    Ok(Settings {
        policy_templates: Utf8PathBuf::from(policy_templates),
        policy_output: Utf8PathBuf::from(policy_output),
        policy_results: Utf8PathBuf::from(policy_results),
        bundle: bundle.map(Utf8PathBuf::from),
        bundle_revision: optional(map, keys::BUNDLE_REVISION).unwrap_or_default(),
        bundle_target_location,
        evidence_endpoint,
        evidence_timeout: Duration::from_millis(evidence_timeout_ms),
        activity_kind,
        policy_name: optional(map, keys::POLICY_NAME).unwrap_or_default(),
        policy_description: optional(map, keys::POLICY_DESCRIPTION).unwrap_or_default(),
        results_pattern,
        opa_binary: optional(map, keys::OPA_BINARY)
            .unwrap_or_else(|| defaults::OPA_BINARY.to_string()),
    })
}

/// Empty and whitespace-only values count as absent.
fn optional(map: &BTreeMap<String, String>, key: &str) -> Option<String> {
    map.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(map: &BTreeMap<String, String>, key: &'static str) -> Result<String, SettingsError> {
    optional(map, key).ok_or(SettingsError::Missing(key))
}

fn parse_timeout(v: &str) -> Result<u64, SettingsError> {
    match v.parse::<u64>() {
        Ok(0) => Err(SettingsError::Invalid {
            key: keys::EVIDENCE_TIMEOUT_MS,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(ms) => Ok(ms),
        Err(e) => Err(SettingsError::Invalid {
            key: keys::EVIDENCE_TIMEOUT_MS,
            reason: e.to_string(),
        }),
    }
}

fn validate_endpoint(url: &str) -> Result<(), SettingsError> {
    let invalid = |reason: String| SettingsError::Invalid {
        key: keys::EVIDENCE_ENDPOINT,
        reason,
    };
    let parsed = reqwest::Url::parse(url).map_err(|e| invalid(format!("'{url}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("expected an http(s) URL, got '{url}'")));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid(format!("'{url}' has no host")));
    }
    Ok(())
}
