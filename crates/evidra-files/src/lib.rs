//! Filesystem adapters: compose policy sets, compile bundles, load engine reports.
//!
//! This crate is allowed to do filesystem IO. The only external process it starts is the
//! bundle compiler, and only through [`BundleCompiler`].

#![forbid(unsafe_code)]

mod bundle;
mod compose;
mod index;

pub use bundle::{BundleCompiler, BundleError, BundleRequest, OpaBundleCompiler};
pub use compose::{ComposeError, ComposeOptions, ComposeSummary, PolicySetComposer};
pub use index::{LoadError, ReportIndex};

/// Fuzz-friendly API for testing parsing robustness without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    use evidra_types::Report;

    /// Parse arbitrary text as an engine report and index it.
    ///
    /// Returns the number of distinct check ids the report includes.
    pub fn parse_report(text: &str) -> Result<usize, serde_json::Error> {
        let report: Report = serde_json::from_str(text)?;
        let index = super::ReportIndex::from_reports(vec![report]);
        Ok(index.check_ids().count())
    }

    /// Validate an arbitrary string as a check id the composer would accept.
    pub fn is_valid_check_id(id: &str) -> bool {
        super::compose::validate_check_id(id)
    }
}
