//! phpvercheck - PHP minimum version checker.
//!
//! phpvercheck finds the lowest PHP version a project can run on. It scans
//! the project's source for calls to runtime functions, static methods and
//! class constructions, looks each one up in a function catalog, and reports
//! the highest minimum version among the matches together with the
//! extensions they come from.
//!
//! # Architecture
//!
//! - `catalog`: loading and indexing the function catalog
//! - `scan`: file discovery, call extraction, matching and aggregation
//! - `version`: numeric version comparison
//! - `config`: YAML configuration schema
//! - `report`: output formatting (pretty, JSON, bare version)
//!
//! Call extraction is a lexical heuristic, not a parser. See
//! [`scan::extract_calls`] for what it can and cannot see.
//!
//! # Example
//!
//! ```no_run
//! use phpvercheck::catalog::{Catalog, LoadOptions};
//!
//! let catalog = Catalog::load("functions/functions.xml", LoadOptions::default())?;
//! let report = phpvercheck::check_project(".", &catalog)?;
//! println!("{}", report.required_version_label());
//! # Ok::<(), phpvercheck::CheckError>(())
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod report;
pub mod scan;
pub mod version;

use std::path::Path;

pub use catalog::{Catalog, FunctionRecord};
pub use config::Config;
pub use error::CheckError;
pub use scan::{CallKind, CallToken, Report, Runner};
pub use version::Version;

/// Check a project with default settings: `php`/`phtml` files, scanned
/// sequentially.
pub fn check_project<P: AsRef<Path>>(root: P, catalog: &Catalog) -> Result<Report, CheckError> {
    Runner::new(catalog).run(root)
}
