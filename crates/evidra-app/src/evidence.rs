//! The `publish` use case: one activity per loaded report, posted to the evidence sink.

use anyhow::Context;
use evidra_domain::report_to_activity;
use evidra_evidence::EvidencePublisher;
use evidra_files::ReportIndex;
use evidra_settings::Settings;
use evidra_types::ActivityKind;
use std::time::Instant;

#[derive(Clone, Debug, Default)]
pub struct PublishInput {
    /// Overrides `activity_kind` from settings.
    pub kind: Option<ActivityKind>,
    /// Overall deadline across every post.
    pub deadline: Option<Instant>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishSummary {
    pub endpoint: String,
    pub kind: ActivityKind,
    pub published: usize,
}

/// Stops at the first failed post; activities already accepted stay accepted.
pub fn publish_evidence(settings: &Settings, input: PublishInput) -> anyhow::Result<PublishSummary> {
    let endpoint = settings
        .evidence_endpoint
        .as_deref()
        .context("evidence_endpoint is not configured")?;
    let kind = input.kind.unwrap_or(settings.activity_kind);

    let index = ReportIndex::load(&settings.policy_results, &settings.results_pattern)
        .context("failed to load policy results")?;
    let publisher = EvidencePublisher::new(endpoint, settings.evidence_timeout)?;

    for (i, report) in index.reports().iter().enumerate() {
        let activity = report_to_activity(report, kind);
        publisher
            .publish_until(&activity, input.deadline)
            .with_context(|| {
                format!("publish evidence for report {} ({})", i + 1, report.policy.name)
            })?;
    }

    Ok(PublishSummary {
        endpoint: endpoint.to_string(),
        kind,
        published: index.reports().len(),
    })
}
