//! Configuration file schema for phpvercheck.
//!
//! All fields are optional; command-line flags take precedence.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::LoadOptions;
use crate::scan::{DiscoveryConfig, DEFAULT_EXTENSIONS};
use crate::version::{lenient_string, Version};

/// Default config file names to search for.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["phpvercheck.yaml", ".phpvercheck.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Path to the function catalog (.xml, .json, .yaml)
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    /// Source file extensions to scan (default: php, phtml)
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Glob patterns for paths to exclude, relative to the project root
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Qualified names (`Owner::name` or `name`) that are never counted
    #[serde(default)]
    pub ignored_symbols: Vec<String>,
    /// Highest runtime version the project may require
    #[serde(default, deserialize_with = "lenient_string")]
    pub target_version: Option<String>,
    /// Scan files in parallel (default: true)
    #[serde(default)]
    pub parallel: Option<bool>,
    /// Keep catalog descriptions in memory (default: false)
    #[serde(default)]
    pub include_descriptions: Option<bool>,
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Look for a config file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Extensions to scan, falling back to the defaults.
    pub fn extensions(&self) -> Vec<String> {
        if self.extensions.is_empty() {
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
        } else {
            self.extensions.clone()
        }
    }

    /// Discovery settings derived from this config.
    pub fn discovery(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            extensions: self.extensions(),
            excluded_paths: self.excluded_paths.clone(),
        }
    }

    /// Catalog load settings derived from this config.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            include_descriptions: self.include_descriptions.unwrap_or(false),
        }
    }

    /// Returns whether to scan in parallel (defaults to true).
    pub fn should_run_parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    /// Parsed target version, if one is set.
    pub fn target(&self) -> anyhow::Result<Option<Version>> {
        match self.target_version.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s
                .parse::<Version>()
                .map(Some)
                .map_err(|e| anyhow::anyhow!(e)),
        }
    }
}

/// Validate a config for semantic errors.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    for ext in &config.extensions {
        if ext.trim_start_matches('.').trim().is_empty() {
            anyhow::bail!("extensions must not contain empty entries");
        }
    }

    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded path {:?}: {}", pattern, e))?;
    }

    config.target()?;
    Ok(())
}
