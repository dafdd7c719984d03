//! The `results` use case: load engine reports and map them onto the catalog.

use anyhow::Context;
use evidra_domain::{OutcomeCounts, map_observations};
use evidra_files::ReportIndex;
use evidra_settings::Settings;
use evidra_types::{Catalog, PvpResult};
use time::OffsetDateTime;

#[derive(Clone, Debug)]
pub struct ResultsOutput {
    pub result: PvpResult,
    pub counts: OutcomeCounts,
    /// Reports found under the results directory.
    pub reports: usize,
}

/// `collected` is stamped on every observation; pass `OffsetDateTime::now_utc()` outside tests.
pub fn get_results(
    settings: &Settings,
    catalog: &Catalog,
    collected: OffsetDateTime,
) -> anyhow::Result<ResultsOutput> {
    let index = ReportIndex::load(&settings.policy_results, &settings.results_pattern)
        .context("failed to load policy results")?;

    let observations = map_observations(catalog, &index, collected);
    let counts = OutcomeCounts::from_observations(&observations);
    tracing::info!(
        observations = observations.len(),
        pass = counts.pass,
        fail = counts.fail,
        error = counts.error,
        "mapped observations"
    );

    Ok(ResultsOutput {
        result: PvpResult {
            observations_by_check: observations,
        },
        counts,
        reports: index.reports().len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::{Utf8Path, Utf8PathBuf};
    use evidra_types::{Outcome, Rule};
    use std::collections::BTreeMap;
    use tempfile::TempDir;
    use time::macros::datetime;

    fn settings(results: &Utf8Path) -> Settings {
        let mut map = BTreeMap::new();
        map.insert("policy_templates".to_string(), "t".to_string());
        map.insert("policy_output".to_string(), "o".to_string());
        map.insert("policy_results".to_string(), results.to_string());
        crate::configure(&map).expect("settings")
    }

    #[test]
    fn maps_reports_onto_catalog_checks() {
        let tmp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8");
        std::fs::write(
            root.join("report.json"),
            r#"{
                "success": false,
                "effective-time": "2025-03-01T12:00:00Z",
                "policy": {"name": "baseline", "sources": [{"name": "r1", "config": {"include": ["a"]}}]},
                "filepaths": [{"filepath": "deploy/app.yaml", "success": false,
                               "violations": [{"msg": "deny.rule1"}]}]
            }"#,
        )
        .expect("write report");

        let catalog = Catalog::new(vec![Rule::new("r1").with_check("a").with_check("b")]);
        let collected = datetime!(2026-01-02 03:04:05 UTC);

        let out = get_results(&settings(&root), &catalog, collected).expect("results");
        assert_eq!(out.reports, 1);
        assert_eq!(out.counts.fail, 1);

        let obs = &out.result.observations_by_check;
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].check_id, "a");
        assert_eq!(obs[0].collected, collected);
        assert_eq!(obs[0].subjects[0].result, Outcome::Fail);
        assert_eq!(obs[0].subjects[0].reason, "deny.rule1");
    }

    #[test]
    fn missing_results_directory_fails() {
        let tmp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().join("absent")).expect("utf8");
        let err = get_results(&settings(&root), &Catalog::default(), OffsetDateTime::UNIX_EPOCH)
            .expect_err("should fail");
        assert!(format!("{err:#}").starts_with("failed to load policy results"));
    }
}
