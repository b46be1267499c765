//! Output formatting for check results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - Version: the bare required version, for scripts

use colored::*;
use serde::{Deserialize, Serialize};

use crate::scan::{ExtensionUsage, Report, SkippedFile};
use crate::version::Version;

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report structure.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub catalog: String,
    pub required_version: String,
    pub used_functions: Vec<String>,
    pub used_classes: Vec<String>,
    pub used_extensions: Vec<JsonExtension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unversioned_functions: Vec<String>,
    pub files_scanned: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<JsonSkippedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_version: Option<String>,
    pub passed: bool,
}

/// An extension and the version it requires.
#[derive(Serialize, Deserialize)]
pub struct JsonExtension {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_version: Option<String>,
}

/// A file that could not be read.
#[derive(Serialize, Deserialize)]
pub struct JsonSkippedFile {
    pub path: String,
    pub reason: String,
}

impl JsonReport {
    /// Build the JSON view of a report.
    pub fn new(path: &str, catalog: &str, report: &Report, target: Option<&Version>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            path: path.to_string(),
            catalog: catalog.to_string(),
            required_version: report.required_version_label(),
            used_functions: report.used_functions.clone(),
            used_classes: report.used_classes.clone(),
            used_extensions: report.used_extensions.iter().map(extension_to_json).collect(),
            warning: report.warning_text(),
            unversioned_functions: report.unversioned.clone(),
            files_scanned: report.files_scanned,
            skipped: report.skipped.iter().map(skipped_to_json).collect(),
            target_version: target.map(|t| t.to_string()),
            passed: passed(report, target),
        }
    }
}

fn extension_to_json(e: &ExtensionUsage) -> JsonExtension {
    JsonExtension {
        name: e.name.clone(),
        required_version: e.required_version.as_ref().map(|v| v.to_string()),
    }
}

fn skipped_to_json(s: &SkippedFile) -> JsonSkippedFile {
    JsonSkippedFile {
        path: s.path.to_string_lossy().to_string(),
        reason: s.reason.clone(),
    }
}

/// Whether the report stays within the target version, if any.
pub fn passed(report: &Report, target: Option<&Version>) -> bool {
    target.map(|t| !report.exceeds(t)).unwrap_or(true)
}

/// Write results in JSON format.
pub fn write_json(
    path: &str,
    catalog: &str,
    report: &Report,
    target: Option<&Version>,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&JsonReport::new(path, catalog, report, target))?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Version Format
// =============================================================================

/// Print only the required version.
pub fn write_version(report: &Report) {
    println!("{}", report.required_version_label());
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(path: &str, catalog: &str, report: &Report, target: Option<&Version>) {
    // Header
    println!();
    print!("  ");
    print!("{}", "phpvercheck".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", path);
    print!("  {}", "Catalog:  ".dimmed());
    println!("{}", catalog);
    print!("  {}", "Files:    ".dimmed());
    print!("{}", report.files_scanned);
    if !report.skipped.is_empty() {
        print!(
            "  {}",
            format!("({} unreadable)", report.skipped.len()).yellow()
        );
    }
    println!();
    println!();

    write_required_version(report);
    println!();

    if !report.used_extensions.is_empty() {
        write_extensions(&report.used_extensions);
        println!();
    }

    if !report.used_classes.is_empty() {
        write_list("Classes", &report.used_classes);
        println!();
    }

    if !report.used_functions.is_empty() {
        write_list("Functions", &report.used_functions);
        println!();
    }

    if let Some(warning) = report.warning_text() {
        for line in warning.lines() {
            println!("  {}", line.yellow());
        }
        println!();
    }

    if !report.skipped.is_empty() {
        write_skipped(&report.skipped);
        println!();
    }

    if let Some(target) = target {
        write_final_status(report, target);
        println!();
    }
}

fn write_required_version(report: &Report) {
    print!("  {}", "Required version: ".bold());
    match &report.required_version {
        Some(v) => println!("{}", v.to_string().green().bold()),
        None => println!("{}", report.required_version_label().yellow()),
    }
}

fn write_extensions(extensions: &[ExtensionUsage]) {
    println!("  {} ({}):", "Extensions".bold(), extensions.len());
    for ext in extensions {
        match &ext.required_version {
            Some(v) => println!("    {:<24} {}", ext.name, format!(">= {}", v).dimmed()),
            None => println!("    {}", ext.name),
        }
    }
}

fn write_list(title: &str, items: &[String]) {
    println!("  {} ({}):", title.bold(), items.len());
    for item in items {
        println!("    {}", item);
    }
}

fn write_skipped(skipped: &[SkippedFile]) {
    println!("  {} ({}):", "Skipped".dimmed(), skipped.len());
    for s in skipped {
        print!("    {}", s.path.display().to_string().blue());
        println!("  {}", s.reason.dimmed());
    }
}

fn write_final_status(report: &Report, target: &Version) {
    print!("  {}", format!("Target: {}", target).dimmed());
    print!("  Required: {}  ", report.required_version_label());

    if passed(report, Some(target)) {
        print!("{}", "PASSED".green());
    } else {
        print!("{}", "FAILED".red());
    }
    println!();
}
