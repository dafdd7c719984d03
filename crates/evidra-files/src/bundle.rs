use camino::{Utf8Path, Utf8PathBuf};
use evidra_types::ids::REGO_VERSION;
use std::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("create bundle directory {path}: {source}")]
    CreateDir {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} build exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundleRequest {
    /// Composed policy directory.
    pub source_dir: Utf8PathBuf,
    /// Bundle archive to produce.
    pub output: Utf8PathBuf,
    pub revision: Option<String>,
    pub rego_version: String,
}

impl BundleRequest {
    pub fn new(source_dir: impl Into<Utf8PathBuf>, output: impl Into<Utf8PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output: output.into(),
            revision: None,
            rego_version: REGO_VERSION.to_string(),
        }
    }

    pub fn with_revision(mut self, revision: Option<String>) -> Self {
        self.revision = revision.filter(|r| !r.is_empty());
        self
    }
}

/// Compiles a composed policy directory into a distributable bundle.
pub trait BundleCompiler {
    fn compile(&self, request: &BundleRequest) -> Result<(), BundleError>;
}

/// Runs the `opa` executable.
#[derive(Clone, Debug)]
pub struct OpaBundleCompiler {
    program: String,
}

impl Default for OpaBundleCompiler {
    fn default() -> Self {
        Self::new("opa")
    }
}

impl OpaBundleCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn args(&self, request: &BundleRequest) -> Vec<String> {
        let mut args = vec![
            "build".to_string(),
            "--bundle".to_string(),
            request.source_dir.to_string(),
        ];
        if let Some(rev) = &request.revision {
            args.push("--revision".to_string());
            args.push(rev.clone());
        }
        args.push("--output".to_string());
        args.push(request.output.to_string());
        if request.rego_version == REGO_VERSION {
            args.push("--v1-compatible".to_string());
        }
        args
    }
}

impl BundleCompiler for OpaBundleCompiler {
    fn compile(&self, request: &BundleRequest) -> Result<(), BundleError> {
        ensure_parent(&request.output)?;

        let args = self.args(request);
        tracing::debug!(program = %self.program, ?args, "running bundle compiler");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| BundleError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BundleError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        tracing::info!(bundle = %request.output, "built policy bundle");
        Ok(())
    }
}

fn ensure_parent(path: &Utf8Path) -> Result<(), BundleError> {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|source| BundleError::CreateDir {
                path: parent.to_owned(),
                source,
            })
        }
        _ => Ok(()),
    }
}
