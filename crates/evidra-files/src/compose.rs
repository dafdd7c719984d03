use camino::{Utf8Path, Utf8PathBuf};
use evidra_types::ids::{MANIFEST_FILE_NAME, POLICY_FILE_EXTENSION};
use evidra_types::{Catalog, PolicyManifest, PolicySource, Rule, SourceConfig};
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("create output directory {path}: {source}")]
    CreateDir {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("rule {rule}: invalid check id {check:?} (must be a plain file name)")]
    InvalidCheckId { rule: String, check: String },

    #[error("policy template not found: {0}")]
    MissingTemplate(Utf8PathBuf),

    #[error("copy {from} to {to}: {source}")]
    Copy {
        from: Utf8PathBuf,
        to: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("serialize policy manifest: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        source: std::io::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Directory holding `<check-id>.<extension>` templates.
    pub templates: Utf8PathBuf,
    pub output: Utf8PathBuf,
    /// Written into every source's `policy` list.
    pub bundle_target_location: String,
    pub policy_name: String,
    pub policy_description: String,
    pub extension: String,
}

impl ComposeOptions {
    pub fn new(templates: impl Into<Utf8PathBuf>, output: impl Into<Utf8PathBuf>) -> Self {
        let output = output.into();
        Self {
            templates: templates.into(),
            bundle_target_location: output.to_string(),
            output,
            policy_name: String::new(),
            policy_description: String::new(),
            extension: POLICY_FILE_EXTENSION.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposeSummary {
    pub manifest: Utf8PathBuf,
    /// Copied policy files, in catalog order.
    pub policy_files: Vec<Utf8PathBuf>,
    pub sources: usize,
}

/// Materializes a catalog into an engine-consumable policy directory.
#[derive(Clone, Debug)]
pub struct PolicySetComposer {
    options: ComposeOptions,
}

impl PolicySetComposer {
    pub fn new(options: ComposeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Copy one template per check into the output directory and write `policy.yaml`.
    ///
    /// On a missing template the files copied so far are left in place and no manifest is
    /// written.
    pub fn compose(&self, catalog: &Catalog) -> Result<ComposeSummary, ComposeError> {
        let opts = &self.options;
        std::fs::create_dir_all(&opts.output).map_err(|source| ComposeError::CreateDir {
            path: opts.output.clone(),
            source,
        })?;

        let mut manifest = PolicyManifest {
            name: opts.policy_name.clone(),
            description: opts.policy_description.clone(),
            sources: Vec::with_capacity(catalog.rules.len()),
        };
        let mut policy_files = Vec::new();

        for rule in &catalog.rules {
            let mut source = policy_source(rule, &opts.bundle_target_location);

            for check in &rule.checks {
                if !validate_check_id(&check.id) {
                    return Err(ComposeError::InvalidCheckId {
                        rule: rule.id.clone(),
                        check: check.id.clone(),
                    });
                }
                let file_name = format!("{}.{}", check.id, opts.extension);
                let from = opts.templates.join(&file_name);
                let to = opts.output.join(&file_name);
                copy_template(&from, &to)?;
                tracing::debug!(rule = %rule.id, check = %check.id, "copied policy template");

                source.config.include.push(check.id.clone());
                policy_files.push(to);
            }

            manifest.sources.push(source);
        }

        let manifest_path = opts.output.join(MANIFEST_FILE_NAME);
        let text = serde_yaml::to_string(&manifest)?;
        std::fs::write(&manifest_path, text).map_err(|source| ComposeError::Write {
            path: manifest_path.clone(),
            source,
        })?;

        tracing::info!(
            output = %opts.output,
            sources = manifest.sources.len(),
            files = policy_files.len(),
            "composed policy set"
        );

        Ok(ComposeSummary {
            manifest: manifest_path,
            policy_files,
            sources: manifest.sources.len(),
        })
    }
}

/// Source block for one rule, without includes.
fn policy_source(rule: &Rule, location: &str) -> PolicySource {
    let mut params = Map::new();
    for p in &rule.parameters {
        // Later duplicates overwrite earlier ones.
        params.insert(p.id.clone(), JsonValue::String(p.value.clone()));
    }

    PolicySource {
        name: rule.id.clone(),
        policy: vec![location.to_string()],
        data: Vec::new(),
        rule_data: (!params.is_empty()).then_some(JsonValue::Object(params)),
        config: SourceConfig::default(),
    }
}

/// Check ids become file names; refuse anything that could leave the directory.
pub(crate) fn validate_check_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\'])
        && !id.contains('\0')
        && !Utf8Path::new(id).has_root()
}

fn copy_template(from: &Utf8Path, to: &Utf8Path) -> Result<(), ComposeError> {
    if !from.is_file() {
        return Err(ComposeError::MissingTemplate(from.to_owned()));
    }
    std::fs::copy(from, to).map_err(|source| ComposeError::Copy {
        from: from.to_owned(),
        to: to.to_owned(),
        source,
    })?;
    Ok(())
}
