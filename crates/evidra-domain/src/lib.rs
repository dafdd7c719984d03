//! Pure projections over engine output (no IO).
//!
//! Input: decision payloads, engine reports, and the rule catalog, loaded elsewhere.
//! Output: normalized decisions, observations, and activity records.

#![forbid(unsafe_code)]

pub mod activity;
pub mod normalize;
pub mod observe;
pub mod summary;

#[cfg(test)]
mod proptest;
#[cfg(test)]
mod test_support;

pub use activity::{report_status, report_to_activity};
pub use normalize::{DecisionPayload, normalize, normalize_all, normalize_result_set};
pub use observe::{ReportLookup, classify_input, map_observations, report_subjects};
pub use summary::OutcomeCounts;
