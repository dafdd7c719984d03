//! Observation mapping: join the rule catalog against loaded reports.

use evidra_types::ids::{METHOD_TEST_AUTOMATED, REASON_NOT_PROVIDED, SUBJECT_TYPE_RESOURCE};
use evidra_types::{Catalog, Input, Observation, Outcome, Report, Subject};
use time::OffsetDateTime;

/// Source of reports keyed by check id.
///
/// Unknown ids must yield an empty list, never an error.
pub trait ReportLookup {
    fn lookup(&self, check_id: &str) -> Vec<&Report>;
}

/// One observation per (rule, check) pair with at least one matching report, in catalog order.
///
/// `collected` is stamped on every observation; callers pass the current time.
pub fn map_observations<L: ReportLookup + ?Sized>(
    catalog: &Catalog,
    reports: &L,
    collected: OffsetDateTime,
) -> Vec<Observation> {
    let mut out = Vec::new();

    for (rule, check) in catalog.rule_checks() {
        let matching = reports.lookup(&check.id);
        if matching.is_empty() {
            // Absence of evidence is not failure.
            continue;
        }

        out.push(Observation {
            title: rule.id.clone(),
            check_id: check.id.clone(),
            description: format!("Observation of check {}", check.id),
            methods: vec![METHOD_TEST_AUTOMATED.to_string()],
            collected,
            subjects: matching.into_iter().flat_map(report_subjects).collect(),
        });
    }

    out
}

/// One subject per input of the report, in input order.
pub fn report_subjects(report: &Report) -> Vec<Subject> {
    report
        .filepaths
        .iter()
        .map(|input| {
            let result = classify_input(input);
            Subject {
                title: format!("{} assessment for {}", report.policy.name, input.filepath),
                resource_id: input.filepath.clone(),
                kind: SUBJECT_TYPE_RESOURCE.to_string(),
                result,
                reason: subject_reason(input, result),
                evaluated_on: report.effective_time,
            }
        })
        .collect()
}

/// Input-level classification: an input passes only when it succeeded with no violations
/// recorded against it; anything else fails.
pub fn classify_input(input: &Input) -> Outcome {
    if input.success && input.violations.is_empty() {
        Outcome::Pass
    } else {
        Outcome::Fail
    }
}

fn subject_reason(input: &Input, result: Outcome) -> String {
    let messages = match result {
        Outcome::Pass => &input.successes,
        Outcome::Fail => &input.violations,
        Outcome::Error => return REASON_NOT_PROVIDED.to_string(),
    };
    // "; "-separated, not concatenated bare.
    messages
        .iter()
        .map(|r| r.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
