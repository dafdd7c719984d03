//! The `generate` use case: compose the policy set and optionally bundle it.

use anyhow::Context;
use camino::Utf8PathBuf;
use evidra_files::{
    BundleCompiler, BundleRequest, ComposeOptions, ComposeSummary, OpaBundleCompiler,
    PolicySetComposer,
};
use evidra_settings::Settings;
use evidra_types::Catalog;

#[derive(Clone, Debug)]
pub struct GenerateOutput {
    pub summary: ComposeSummary,
    /// Bundle written, when bundling is configured.
    pub bundle: Option<Utf8PathBuf>,
}

/// Compose and bundle with the configured `opa` executable.
pub fn generate(settings: &Settings, catalog: &Catalog) -> anyhow::Result<GenerateOutput> {
    generate_with(
        settings,
        catalog,
        &OpaBundleCompiler::new(settings.opa_binary.clone()),
    )
}

pub fn generate_with(
    settings: &Settings,
    catalog: &Catalog,
    compiler: &dyn BundleCompiler,
) -> anyhow::Result<GenerateOutput> {
    let options = ComposeOptions {
        bundle_target_location: settings.bundle_target_location.clone(),
        policy_name: settings.policy_name.clone(),
        policy_description: settings.policy_description.clone(),
        ..ComposeOptions::new(&settings.policy_templates, &settings.policy_output)
    };

    let summary = PolicySetComposer::new(options)
        .compose(catalog)
        .context("error generating policies")?;

    let bundle = match &settings.bundle {
        Some(bundle) => {
            tracing::info!(bundle = %bundle, "creating policy bundle");
            let request = BundleRequest::new(&settings.policy_output, bundle)
                .with_revision(Some(settings.bundle_revision.clone()));
            compiler
                .compile(&request)
                .context("error creating policy bundle")?;
            Some(bundle.clone())
        }
        None => None,
    };

    Ok(GenerateOutput { summary, bundle })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use evidra_files::BundleError;
    use evidra_types::Rule;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingCompiler {
        requests: RefCell<Vec<BundleRequest>>,
        fail: bool,
    }

    impl BundleCompiler for RecordingCompiler {
        fn compile(&self, request: &BundleRequest) -> Result<(), BundleError> {
            self.requests.borrow_mut().push(request.clone());
            if self.fail {
                return Err(BundleError::Failed {
                    program: "opa".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "rego_parse_error".to_string(),
                });
            }
            Ok(())
        }
    }

    fn settings(root: &Utf8Path, extra: &[(&str, &str)]) -> Settings {
        let mut map = BTreeMap::new();
        map.insert("policy_templates".to_string(), root.join("templates").to_string());
        map.insert("policy_output".to_string(), root.join("out").to_string());
        map.insert("policy_results".to_string(), root.join("results").to_string());
        for (k, v) in extra {
            map.insert(k.to_string(), v.to_string());
        }
        crate::configure(&map).expect("settings")
    }

    fn setup() -> (TempDir, Utf8PathBuf, Catalog) {
        let tmp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf8");
        std::fs::create_dir_all(root.join("templates")).expect("mkdir");
        std::fs::write(root.join("templates/a.rego"), "package a\n").expect("write");
        let catalog = Catalog::new(vec![Rule::new("r1").with_check("a")]);
        (tmp, root, catalog)
    }

    #[test]
    fn no_bundle_configured_skips_compiler() {
        let (_tmp, root, catalog) = setup();
        let compiler = RecordingCompiler::default();

        let out = generate_with(&settings(&root, &[]), &catalog, &compiler).expect("generate");
        assert_eq!(out.bundle, None);
        assert_eq!(out.summary.sources, 1);
        assert!(compiler.requests.borrow().is_empty());
    }

    #[test]
    fn bundle_request_uses_output_dir_revision_and_v1() {
        let (_tmp, root, catalog) = setup();
        let bundle = root.join("dist/bundle.tar.gz");
        let s = settings(
            &root,
            &[("bundle", bundle.as_str()), ("bundle_revision", "rev-7"), ("policy_name", "baseline")],
        );
        let compiler = RecordingCompiler::default();

        let out = generate_with(&s, &catalog, &compiler).expect("generate");
        assert_eq!(out.bundle.as_ref(), Some(&bundle));

        let requests = compiler.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].source_dir, root.join("out"));
        assert_eq!(requests[0].output, bundle);
        assert_eq!(requests[0].revision.as_deref(), Some("rev-7"));
        assert_eq!(requests[0].rego_version, "v1");

        // Sources point at the bundle when no explicit target location is set.
        let manifest = std::fs::read_to_string(&out.summary.manifest).expect("manifest");
        assert!(manifest.contains(bundle.as_str()), "{manifest}");
        assert!(manifest.contains("baseline"), "{manifest}");
    }

    #[test]
    fn compose_and_bundle_failures_are_labelled() {
        let (_tmp, root, _) = setup();
        let missing = Catalog::new(vec![Rule::new("r1").with_check("ghost")]);
        let err = generate_with(&settings(&root, &[]), &missing, &RecordingCompiler::default())
            .expect_err("missing template");
        assert!(format!("{err:#}").starts_with("error generating policies"));

        let (_tmp2, root2, catalog) = setup();
        let s = settings(&root2, &[("bundle", "b.tar.gz")]);
        let failing = RecordingCompiler {
            fail: true,
            ..RecordingCompiler::default()
        };
        let err = generate_with(&s, &catalog, &failing).expect_err("bundle failure");
        let chain = format!("{err:#}");
        assert!(chain.starts_with("error creating policy bundle"), "{chain}");
        assert!(chain.contains("rego_parse_error"), "{chain}");
    }
}
