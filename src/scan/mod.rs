//! Project scanning: discovery, call extraction, catalog matching and
//! version aggregation.

mod aggregate;
mod discover;
mod extract;
mod matcher;
mod runner;

pub use aggregate::{
    Aggregator, ExtensionUsage, Report, SkippedFile, UNKNOWN_VERSION, VERSION_WARNING,
};
pub use discover::{discover, Discovery, DiscoveryConfig, DEFAULT_EXTENSIONS};
pub use extract::{extract_calls, php_regions, CallKind, CallToken};
pub use matcher::resolve;
pub use runner::Runner;
