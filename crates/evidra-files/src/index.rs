use camino::{Utf8Path, Utf8PathBuf};
use evidra_domain::ReportLookup;
use evidra_types::Report;
use globset::Glob;
use std::collections::BTreeMap;
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("results directory not found: {0}")]
    MissingDir(Utf8PathBuf),

    #[error("invalid results pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },

    #[error("walk {path}: {source}")]
    Walk {
        path: Utf8PathBuf,
        source: walkdir::Error,
    },

    #[error("non UTF-8 path in results directory: {0}")]
    NonUtf8Path(String),

    #[error("read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("parse report {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },
}

/// Engine reports loaded from disk, indexed by the check ids their policy includes.
///
/// Immutable once built; rebuild it for every run.
#[derive(Clone, Debug, Default)]
pub struct ReportIndex {
    reports: Vec<Report>,
    by_check: BTreeMap<String, Vec<usize>>,
}

impl ReportIndex {
    /// Load every file under `dir` whose dir-relative path matches `pattern`.
    ///
    /// Files are visited in file-name order at each level, so discovery order is stable across
    /// platforms. Any unreadable or malformed match fails the whole load.
    pub fn load(dir: &Utf8Path, pattern: &str) -> Result<Self, LoadError> {
        if !dir.is_dir() {
            return Err(LoadError::MissingDir(dir.to_owned()));
        }

        let matcher = Glob::new(pattern)
            .map_err(|source| LoadError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();

        let mut reports = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|source| LoadError::Walk {
                path: source
                    .path()
                    .and_then(Utf8Path::from_path)
                    .map_or_else(|| dir.to_owned(), Utf8Path::to_owned),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = Utf8PathBuf::from_path_buf(entry.into_path())
                .map_err(|p| LoadError::NonUtf8Path(p.display().to_string()))?;
            let rel = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .as_str()
                .replace('\\', "/");
            if !matcher.is_match(&rel) {
                tracing::trace!(path = %rel, "skipping file not matching results pattern");
                continue;
            }

            reports.push(read_report(&path)?);
            tracing::debug!(path = %rel, "loaded report");
        }

        let index = Self::from_reports(reports);
        tracing::info!(
            dir = %dir,
            reports = index.reports.len(),
            checks = index.by_check.len(),
            "indexed engine reports"
        );
        Ok(index)
    }

    /// Build an index over reports that are already in memory, keeping their order.
    pub fn from_reports(reports: Vec<Report>) -> Self {
        let mut by_check: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, report) in reports.iter().enumerate() {
            for check in report.policy.included_checks() {
                let positions = by_check.entry(check.to_string()).or_default();
                // A report listing a check twice is indexed once for it.
                if positions.last() != Some(&idx) {
                    positions.push(idx);
                }
            }
        }
        Self { reports, by_check }
    }

    /// All loaded reports in discovery order.
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn check_ids(&self) -> impl Iterator<Item = &str> {
        self.by_check.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl ReportLookup for ReportIndex {
    fn lookup(&self, check_id: &str) -> Vec<&Report> {
        self.by_check
            .get(check_id)
            .map(|positions| positions.iter().map(|&i| &self.reports[i]).collect())
            .unwrap_or_default()
    }
}

fn read_report(path: &Utf8Path) -> Result<Report, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8 path")
    }

    fn write_file(path: &Utf8Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write file");
    }

    fn report_json(name: &str, includes: &[&str]) -> String {
        serde_json::json!({
            "success": true,
            "ec-version": "v0.6.0",
            "effective-time": "2025-03-01T12:00:00Z",
            "policy": {
                "name": name,
                "sources": [{"name": "r", "policy": ["./bundle"], "config": {"include": includes}}]
            },
            "filepaths": [{"filepath": format!("{name}.yaml"), "success": true}]
        })
        .to_string()
    }

    fn names(reports: Vec<&Report>) -> Vec<&str> {
        reports.into_iter().map(|r| r.policy.name.as_str()).collect()
    }

    #[test]
    fn indexes_reports_by_included_check() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("r1.json"), &report_json("one", &["a", "b"]));
        write_file(&root.join("nested/r2.json"), &report_json("two", &["a"]));

        let index = ReportIndex::load(&root, "**/*.json").expect("load");
        assert_eq!(index.reports().len(), 2);
        assert_eq!(names(index.lookup("a")), vec!["two", "one"]);
        assert_eq!(names(index.lookup("b")), vec!["one"]);
        assert!(index.lookup("c").is_empty());
        assert_eq!(index.check_ids().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn duplicate_includes_are_indexed_once() {
        let index = ReportIndex::from_reports(vec![
            serde_json::from_str(&report_json("dup", &["a", "a"])).expect("parse"),
        ]);
        assert_eq!(index.lookup("a").len(), 1);
    }

    #[test]
    fn files_outside_pattern_are_ignored() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("r1.json"), &report_json("one", &["a"]));
        write_file(&root.join("notes.txt"), "not a report");
        write_file(&root.join("skip/r2.json"), &report_json("two", &["a"]));

        let all = ReportIndex::load(&root, "**/*.json").expect("load");
        assert_eq!(all.reports().len(), 2);

        let top = ReportIndex::load(&root, "r*.json").expect("load");
        assert_eq!(names(top.lookup("a")), vec!["one"]);
    }

    #[test]
    fn malformed_report_fails_with_path() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("good.json"), &report_json("one", &["a"]));
        write_file(&root.join("bad.json"), "{ not json");

        let err = ReportIndex::load(&root, "**/*.json").expect_err("should fail");
        assert!(matches!(err, LoadError::Parse { .. }));
        assert!(err.to_string().contains("bad.json"), "{err}");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp).join("absent");
        let err = ReportIndex::load(&root, "**/*.json").expect_err("should fail");
        assert!(matches!(err, LoadError::MissingDir(_)));
    }

    #[test]
    fn empty_directory_yields_empty_index() {
        let tmp = TempDir::new().expect("temp dir");
        let index = ReportIndex::load(&utf8_root(&tmp), "**/*.json").expect("load");
        assert!(index.is_empty());
        assert!(index.lookup("a").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_is_named_in_walk_error() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("temp dir");
        let root = utf8_root(&tmp);
        write_file(&root.join("a.json"), &report_json("a", &["c1"]));
        let locked = root.join("locked");
        write_file(&locked.join("b.json"), &report_json("b", &["c1"]));
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).expect("chmod");

        // Privileged users can still list the directory.
        if std::fs::read_dir(&locked).is_ok() {
            std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755))
                .expect("chmod");
            return;
        }

        let err = ReportIndex::load(&root, "**/*.json").unwrap_err();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).expect("chmod");

        match err {
            LoadError::Walk { path, .. } => assert_eq!(path, locked),
            other => panic!("expected walk error, got {other}"),
        }
    }
}
