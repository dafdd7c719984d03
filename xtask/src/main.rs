//! Developer tasks for the evidra workspace: JSON schemas and fixture conformance.

use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use evidra_domain::{map_observations, report_to_activity};
use evidra_files::ReportIndex;
use evidra_types::{ActivityKind, Catalog};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Workspace root: xtask lives one level below it.
fn project_root() -> anyhow::Result<PathBuf> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("{} has no parent directory", manifest_dir.display()))
}

fn schemas_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("schemas"))
}

fn plugin_fixture_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("tests").join("fixtures").join("plugin"))
}

/// A schema file under `schemas/` and the type it is generated from.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "evidra.catalog.json",
            generate: || schema_for!(evidra_types::Catalog),
        },
        SchemaSpec {
            filename: "evidra.policy-manifest.json",
            generate: || schema_for!(evidra_types::PolicyManifest),
        },
        SchemaSpec {
            filename: "evidra.engine-report.json",
            generate: || schema_for!(evidra_types::Report),
        },
        SchemaSpec {
            filename: "evidra.normalized-result.json",
            generate: || schema_for!(evidra_types::NormalizedResult),
        },
        SchemaSpec {
            filename: "evidra.observations.json",
            generate: || schema_for!(evidra_types::PvpResult),
        },
        SchemaSpec {
            filename: "evidra.activity.json",
            generate: || schema_for!(evidra_types::Activity),
        },
        SchemaSpec {
            filename: "evidra.config.v1.json",
            generate: || schema_for!(evidra_settings::EvidraConfigV1),
        },
    ]
}

fn schema_value(filename: &str) -> anyhow::Result<serde_json::Value> {
    let spec = schema_specs()
        .into_iter()
        .find(|s| s.filename == filename)
        .with_context(|| format!("no schema named {filename}"))?;
    serde_json::to_value((spec.generate)()).context("convert schema to json")
}

/// Every schema as (target path, pretty JSON with trailing newline).
fn rendered_schemas() -> anyhow::Result<Vec<(PathBuf, String)>> {
    let dir = schemas_dir()?;
    schema_specs()
        .into_iter()
        .map(|spec| {
            let mut text = serde_json::to_string_pretty(&(spec.generate)())
                .with_context(|| format!("serialize {}", spec.filename))?;
            text.push('\n');
            Ok((dir.join(spec.filename), text))
        })
        .collect()
}

fn emit_schemas() -> anyhow::Result<()> {
    fs::create_dir_all(schemas_dir()?).context("create schemas/")?;
    for (path, text) in rendered_schemas()? {
        fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

/// Fails when a checked-in schema is missing or differs from the generated one.
fn validate_schemas() -> anyhow::Result<()> {
    let mut stale = Vec::new();
    for (path, expected) in rendered_schemas()? {
        match fs::read_to_string(&path) {
            Ok(actual) if actual == expected => {}
            Ok(_) => stale.push(format!("{} (out of date)", path.display())),
            Err(_) => stale.push(format!("{} (missing)", path.display())),
        }
    }

    if stale.is_empty() {
        println!("schemas up to date");
        return Ok(());
    }
    for entry in &stale {
        eprintln!("  - {entry}");
    }
    bail!(
        "{} schema file(s) need regenerating; run `cargo xtask emit-schemas`",
        stale.len()
    )
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  emit-schemas      write schemas/*.json from the evidra types");
    eprintln!("  validate-schemas  fail if schemas/ is stale");
    eprintln!("  print-schema-ids  list schema ids");
    eprintln!("  conform           check tests/fixtures/plugin against the schemas and golden file");
    eprintln!("  help              this message");
}

fn compile(filename: &str) -> anyhow::Result<jsonschema::Validator> {
    let mut schema = schema_value(filename)?;
    // Logical identifier, not a resolvable URL.
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$id");
    }
    jsonschema::validator_for(&schema)
        .map_err(|e| anyhow::anyhow!("compile {filename}: {e}"))
}

/// Collect schema violations for `instance` under a `label`.
fn check_instance(
    validator: &jsonschema::Validator,
    label: &str,
    instance: &serde_json::Value,
    errors: &mut Vec<String>,
) {
    for err in validator.iter_errors(instance) {
        errors.push(format!("{label}: schema validation: {err}"));
    }
}

/// Fixture conformance.
///
/// This checks:
/// 1. Every result report in the fixture validates against the engine report schema
/// 2. The catalog validates against the catalog schema
/// 3. Activities derived from the reports validate against the activity schema (both kinds)
/// 4. Observations derived from catalog + reports match `expected.observations.json` and
///    validate against the observations schema
fn conform() -> anyhow::Result<()> {
    let fixture = Utf8PathBuf::from_path_buf(plugin_fixture_dir()?)
        .map_err(|p| anyhow::anyhow!("fixture path is not UTF-8: {}", p.display()))?;
    if !fixture.exists() {
        bail!("plugin fixture not found at {fixture}");
    }

    let report_schema = compile("evidra.engine-report.json")?;
    let catalog_schema = compile("evidra.catalog.json")?;
    let activity_schema = compile("evidra.activity.json")?;
    let observations_schema = compile("evidra.observations.json")?;
    println!("✓ schemas compile");

    let mut errors = Vec::new();

    // Raw report files, validated as JSON before typed parsing.
    let results_dir = fixture.join("results");
    let index = ReportIndex::load(&results_dir, evidra_types::ids::DEFAULT_RESULTS_PATTERN)
        .context("load fixture results")?;
    let mut report_files: Vec<PathBuf> = Vec::new();
    collect_json_files(results_dir.as_std_path(), &mut report_files)?;
    report_files.sort();
    for path in &report_files {
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let value: serde_json::Value =
            serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
        check_instance(&report_schema, &path.display().to_string(), &value, &mut errors);
    }
    println!("✓ checked {} engine reports", report_files.len());

    let catalog_text =
        fs::read_to_string(fixture.join("catalog.yaml")).context("read fixture catalog")?;
    let catalog: Catalog = serde_yaml::from_str(&catalog_text).context("parse fixture catalog")?;
    check_instance(
        &catalog_schema,
        "catalog.yaml",
        &serde_json::to_value(&catalog)?,
        &mut errors,
    );
    println!("✓ checked catalog ({} rules)", catalog.rules.len());

    for (i, report) in index.reports().iter().enumerate() {
        for kind in [ActivityKind::Api, ActivityKind::Scan] {
            let activity = serde_json::to_value(report_to_activity(report, kind))?;
            check_instance(
                &activity_schema,
                &format!("activity[{i}] ({kind})"),
                &activity,
                &mut errors,
            );
        }
    }
    println!("✓ checked activities for {} reports", index.reports().len());

    let observations = evidra_types::PvpResult {
        observations_by_check: map_observations(&catalog, &index, OffsetDateTime::now_utc()),
    };
    let actual = serde_json::to_value(&observations)?;
    check_instance(&observations_schema, "observations", &actual, &mut errors);

    let expected_text = fs::read_to_string(fixture.join("expected.observations.json"))
        .context("read expected observations")?;
    let expected: serde_json::Value =
        serde_json::from_str(&expected_text).context("parse expected observations")?;
    if evidra_test_util::normalize_nondeterministic(actual) != expected {
        errors.push("observations differ from expected.observations.json".to_string());
    }
    println!(
        "✓ checked {} observations against the golden file",
        observations.observations_by_check.len()
    );

    if errors.is_empty() {
        println!("conformance ok");
        return Ok(());
    }

    for e in &errors {
        eprintln!("  - {e}");
    }
    bail!("conformance failed: {} problem(s)", errors.len())
}

fn collect_json_files(dir: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            collect_json_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            out.push(path);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cmd = std::env::args().nth(1).unwrap_or_else(|| "help".to_string());

    match cmd.as_str() {
        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => {
            print_help();
            bail!("unknown command: {other}")
        }
    }
    .context("xtask failed")
}
