//! Use case orchestration for evidra.
//!
//! This crate provides the application layer: use cases that coordinate settings, the pure
//! domain projections, the filesystem adapters, and the evidence client. It is intentionally
//! thin and delegates heavy lifting to the appropriate layers.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod catalog;
mod config;
mod decisions;
mod evidence;
mod generate;
mod results;

pub use catalog::{CatalogFormat, load_catalog, parse_catalog};
pub use config::{configure, load_settings};
pub use decisions::normalize_decisions;
pub use evidence::{PublishInput, PublishSummary, publish_evidence};
pub use generate::{GenerateOutput, generate, generate_with};
pub use results::{ResultsOutput, get_results};
