//! Stable DTOs and IDs used across the evidra workspace.
//!
//! This crate is intentionally boring:
//! - the rule catalog handed to us by the orchestration framework
//! - the engine result report we read back from disk
//! - the policy manifest we write
//! - normalized decisions, observations, and activity records we emit

#![forbid(unsafe_code)]

pub mod activity;
pub mod catalog;
pub mod decision;
pub mod ids;
pub mod manifest;
pub mod observation;
pub mod report;

pub use activity::{
    Activity, ActivityBase, ActivityKind, ActivityMetadata, ApiActivity, Product, ResourceDetails,
    ScanActivity, ScanDetails,
};
pub use catalog::{Catalog, Check, Parameter, Rule};
pub use decision::{NormalizedResult, Outcome, ResourceIdentity};
pub use manifest::{PolicyManifest, PolicySource, SourceConfig};
pub use observation::{Observation, PvpResult, Subject};
pub use report::{Input, Report, RuleResult};
