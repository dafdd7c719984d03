//! CLI entry point for evidra.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, and exit codes.
//! All business logic lives in the `evidra-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use evidra_app::{PublishInput, load_catalog, load_settings};
use evidra_settings::{Overrides, Settings};
use evidra_types::ActivityKind;
use std::io::Read;
use std::time::{Duration, Instant};
use time::OffsetDateTime;

#[derive(Parser, Debug)]
#[command(
    name = "evidra",
    version,
    about = "Compose policy sets and turn engine results into compliance evidence"
)]
struct Cli {
    /// Path to evidra config TOML (missing file is allowed).
    #[arg(long, default_value = "evidra.toml", global = true)]
    config: Utf8PathBuf,

    /// Override a setting (repeatable), e.g. `--set policy_output=out`.
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    set: Vec<String>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compose the policy set for a catalog and bundle it if configured.
    Generate {
        /// Rule catalog (JSON or YAML).
        #[arg(long)]
        catalog: Utf8PathBuf,
    },

    /// Map engine result reports onto a catalog and emit observations as JSON.
    Results {
        /// Rule catalog (JSON or YAML).
        #[arg(long)]
        catalog: Utf8PathBuf,

        /// Where to write the observations (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Post one activity per result report to the evidence endpoint.
    Publish {
        /// Activity class to emit (api or scan); defaults to `activity_kind`.
        #[arg(long)]
        kind: Option<ActivityKind>,

        /// Overall deadline for all posts, in milliseconds.
        #[arg(long)]
        deadline_ms: Option<u64>,
    },

    /// Normalize raw decision JSON (file path or `-` for stdin).
    Normalize { input: String },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("evidra error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("evidra=debug,evidra_app=debug,evidra_files=debug,evidra_evidence=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.cmd {
        Commands::Generate { ref catalog } => cmd_generate(&cli, catalog),
        Commands::Results {
            ref catalog,
            ref output,
        } => cmd_results(&cli, catalog, output.as_deref()),
        Commands::Publish { kind, deadline_ms } => cmd_publish(&cli, kind, deadline_ms),
        Commands::Normalize { ref input } => cmd_normalize(input),
    }
}

fn settings(cli: &Cli) -> anyhow::Result<Settings> {
    // Missing config file is allowed; `--set` can supply everything.
    let cfg_text = match std::fs::read_to_string(&cli.config) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(config = %cli.config, "config file not found; using overrides only");
            String::new()
        }
        Err(err) => return Err(err).with_context(|| format!("read config {}", cli.config)),
    };
    let overrides = Overrides::parse(&cli.set).context("parse --set")?;
    load_settings(&cfg_text, &overrides)
}

fn cmd_generate(cli: &Cli, catalog: &Utf8Path) -> anyhow::Result<()> {
    let settings = settings(cli)?;
    let catalog = load_catalog(catalog)?;
    let out = evidra_app::generate(&settings, &catalog)?;

    println!(
        "evidra: wrote {} policy files and {}",
        out.summary.policy_files.len(),
        out.summary.manifest
    );
    if let Some(bundle) = out.bundle {
        println!("evidra: built bundle {bundle}");
    }
    Ok(())
}

fn cmd_results(cli: &Cli, catalog: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<()> {
    let settings = settings(cli)?;
    let catalog = load_catalog(catalog)?;
    let out = evidra_app::get_results(&settings, &catalog, OffsetDateTime::now_utc())?;

    let json = serde_json::to_string_pretty(&out.result).context("serialize observations")?;
    match output {
        Some(path) => write_text_file(path, &json).context("write observations")?,
        None => println!("{json}"),
    }

    eprintln!(
        "evidra: {} observations from {} reports (pass {}, fail {}, error {})",
        out.result.observations_by_check.len(),
        out.reports,
        out.counts.pass,
        out.counts.fail,
        out.counts.error
    );
    Ok(())
}

fn cmd_publish(cli: &Cli, kind: Option<ActivityKind>, deadline_ms: Option<u64>) -> anyhow::Result<()> {
    let settings = settings(cli)?;
    let input = PublishInput {
        kind,
        deadline: deadline_ms.map(|ms| Instant::now() + Duration::from_millis(ms)),
    };
    let summary = evidra_app::publish_evidence(&settings, input)?;
    println!(
        "evidra: published {} {} activities to {}",
        summary.published, summary.kind, summary.endpoint
    );
    Ok(())
}

fn cmd_normalize(input: &str) -> anyhow::Result<()> {
    let text = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("read {input}"))?
    };

    let results = evidra_app::normalize_decisions(&text)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&results).context("serialize results")?
    );
    Ok(())
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    std::fs::write(path, text).with_context(|| format!("write text: {path}"))?;
    Ok(())
}
