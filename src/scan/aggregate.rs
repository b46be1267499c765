//! Folding matched catalog records into a project report.
//!
//! Every update is a set union or a max, so partial aggregates built over
//! any partition of the files merge into the same result in any order.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::catalog::FunctionRecord;
use crate::version::{max_version, Version};

/// Shown when a matched symbol has no documented version.
pub const VERSION_WARNING: &str = "WARNING: the given required version could be higher, as the \
documentation of some functions used in this project lacks details about the required version.";

/// Label used when no matched symbol carried a version.
pub const UNKNOWN_VERSION: &str = "unknown";

/// A file that could not be read during the run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// An extension used by the project and the highest version it requires.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionUsage {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_version: Option<Version>,
}

/// Running aggregate for one check run.
#[derive(Debug, Default, Clone)]
pub struct Aggregator {
    required_version: Option<Version>,
    // Keys are lowercased; values hold the display spelling.
    used_functions: BTreeMap<String, String>,
    used_classes: BTreeMap<String, String>,
    used_extensions: BTreeMap<String, ExtensionUsage>,
    version_warning: bool,
    unversioned: BTreeMap<String, String>,
    files_scanned: usize,
    skipped: Vec<SkippedFile>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one matched record.
    pub fn record(&mut self, record: &FunctionRecord) {
        let qualified = record.qualified_name();

        insert_spelling(&mut self.used_functions, &qualified);
        if let Some(owner) = &record.owner {
            insert_spelling(&mut self.used_classes, owner);
        }

        if let Some(ext) = &record.extension {
            let usage = self
                .used_extensions
                .entry(ext.name.to_lowercase())
                .or_insert_with(|| ExtensionUsage {
                    name: ext.name.clone(),
                    required_version: None,
                });
            if ext.name < usage.name {
                usage.name = ext.name.clone();
            }
            usage.required_version =
                max_version(usage.required_version.take(), ext.min_version.clone());
        }

        match &record.min_version {
            Some(version) => {
                self.required_version =
                    max_version(self.required_version.take(), Some(version.clone()));
            }
            None => {
                self.version_warning = true;
                insert_spelling(&mut self.unversioned, &qualified);
            }
        }
    }

    /// Count a file as scanned.
    pub fn file_scanned(&mut self) {
        self.files_scanned += 1;
    }

    /// Note a file that could not be read.
    pub fn file_skipped(&mut self, skipped: SkippedFile) {
        self.skipped.push(skipped);
    }

    /// Merge another partial aggregate into this one.
    pub fn merge(&mut self, other: Aggregator) {
        self.required_version = max_version(self.required_version.take(), other.required_version);

        for (key, value) in other.used_functions {
            insert_keyed(&mut self.used_functions, key, value);
        }
        for (key, value) in other.used_classes {
            insert_keyed(&mut self.used_classes, key, value);
        }
        for (key, value) in other.unversioned {
            insert_keyed(&mut self.unversioned, key, value);
        }

        for (key, usage) in other.used_extensions {
            match self.used_extensions.get_mut(&key) {
                Some(existing) => {
                    if usage.name < existing.name {
                        existing.name = usage.name;
                    }
                    existing.required_version =
                        max_version(existing.required_version.take(), usage.required_version);
                }
                None => {
                    self.used_extensions.insert(key, usage);
                }
            }
        }

        self.version_warning |= other.version_warning;
        self.files_scanned += other.files_scanned;
        self.skipped.extend(other.skipped);
    }

    /// Consuming form of [`Aggregator::merge`], for reductions.
    pub fn merged(mut self, other: Aggregator) -> Aggregator {
        self.merge(other);
        self
    }

    /// Freeze into a report.
    pub fn finish(mut self) -> Report {
        self.skipped.sort();
        Report {
            required_version: self.required_version,
            used_functions: self.used_functions.into_values().collect(),
            used_classes: self.used_classes.into_values().collect(),
            used_extensions: self.used_extensions.into_values().collect(),
            version_warning: self.version_warning,
            unversioned: self.unversioned.into_values().collect(),
            files_scanned: self.files_scanned,
            skipped: self.skipped,
        }
    }
}

// Spelling conflicts between catalog duplicates resolve to the smallest
// spelling so the outcome does not depend on fold order.
fn insert_spelling(map: &mut BTreeMap<String, String>, value: &str) {
    insert_keyed(map, value.to_lowercase(), value.to_string());
}

fn insert_keyed(map: &mut BTreeMap<String, String>, key: String, value: String) {
    match map.get_mut(&key) {
        Some(existing) => {
            if value < *existing {
                *existing = value;
            }
        }
        None => {
            map.insert(key, value);
        }
    }
}

/// Final result of a check run.
///
/// All lists are sorted case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Highest version required by any matched symbol, `None` if unknown.
    pub required_version: Option<Version>,
    /// Qualified names (`Owner::name` or `name`) of matched symbols.
    pub used_functions: Vec<String>,
    /// Owners of matched symbols.
    pub used_classes: Vec<String>,
    pub used_extensions: Vec<ExtensionUsage>,
    /// Set when a matched symbol had no documented version.
    pub version_warning: bool,
    /// Qualified names of matched symbols without a version.
    pub unversioned: Vec<String>,
    pub files_scanned: usize,
    pub skipped: Vec<SkippedFile>,
}

impl Report {
    /// Required version, or `"unknown"`.
    pub fn required_version_label(&self) -> String {
        self.required_version
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
    }

    /// User-facing caveat when some matched symbols lack version data.
    pub fn warning_text(&self) -> Option<String> {
        if !self.version_warning {
            return None;
        }

        let mut text = VERSION_WARNING.to_string();
        if !self.unversioned.is_empty() {
            text.push_str("\nThis is due to the use of the following functions: ");
            text.push_str(&self.unversioned.join(", "));
            text.push('.');
        }
        Some(text)
    }

    /// Whether the required version is above `target`. Unknown never exceeds.
    pub fn exceeds(&self, target: &Version) -> bool {
        match &self.required_version {
            Some(required) => required.segments_gt(target),
            None => false,
        }
    }
}
