use crate::observe::ReportLookup;
use evidra_types::{Input, PolicyManifest, PolicySource, Report, SourceConfig};
use std::collections::BTreeMap;
use time::OffsetDateTime;

pub fn ts(unix_seconds: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(unix_seconds).expect("valid timestamp")
}

pub fn input(filepath: &str, success: bool) -> Input {
    Input {
        filepath: filepath.to_string(),
        success,
        ..Input::default()
    }
}

/// A report whose single policy source includes `checks`.
pub fn report(policy_name: &str, success: bool, inputs: Vec<Input>, checks: &[&str]) -> Report {
    Report {
        success,
        filepaths: inputs,
        policy: PolicyManifest {
            name: policy_name.to_string(),
            description: String::new(),
            sources: vec![PolicySource {
                name: "source".to_string(),
                policy: vec!["./bundle".to_string()],
                config: SourceConfig {
                    include: checks.iter().map(|c| c.to_string()).collect(),
                    exclude: Vec::new(),
                },
                ..PolicySource::default()
            }],
        },
        ec_version: String::new(),
        effective_time: ts(0),
    }
}

/// In-memory lookup keyed the same way as the on-disk index.
pub struct MapLookup {
    reports: Vec<Report>,
    by_check: BTreeMap<String, Vec<usize>>,
}

impl MapLookup {
    pub fn from_reports(reports: Vec<Report>) -> Self {
        let mut by_check: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, report) in reports.iter().enumerate() {
            for check in report.policy.included_checks() {
                let slot = by_check.entry(check.to_string()).or_default();
                if slot.last() != Some(&idx) {
                    slot.push(idx);
                }
            }
        }
        Self { reports, by_check }
    }
}

impl ReportLookup for MapLookup {
    fn lookup(&self, check_id: &str) -> Vec<&Report> {
        self.by_check
            .get(check_id)
            .map(|idxs| idxs.iter().map(|&i| &self.reports[i]).collect())
            .unwrap_or_default()
    }
}
