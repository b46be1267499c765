//! Check runner that ties discovery, extraction, matching and aggregation
//! together.

use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::{
    discover, extract_calls, resolve, Aggregator, DiscoveryConfig, Report, SkippedFile,
};
use crate::catalog::{Catalog, FunctionRecord};
use crate::error::CheckError;

/// Executes a check run against a borrowed catalog.
pub struct Runner<'c> {
    catalog: &'c Catalog,
    discovery: DiscoveryConfig,
    ignored: HashSet<String>,
    parallel: bool,
    cancel: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl<'c> Runner<'c> {
    /// Create a sequential runner with default discovery settings.
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            discovery: DiscoveryConfig::default(),
            ignored: HashSet::new(),
            parallel: false,
            cancel: None,
            deadline: None,
        }
    }

    /// Set which files are discovered.
    pub fn discovery(mut self, config: DiscoveryConfig) -> Self {
        self.discovery = config;
        self
    }

    /// Qualified names (`Owner::name` or `name`) that are never counted.
    pub fn ignore_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignored = symbols
            .into_iter()
            .map(|s| s.as_ref().to_lowercase())
            .collect();
        self
    }

    /// Scan files on the rayon thread pool instead of one at a time.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Abort the run when `flag` becomes true. Checked between files.
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Abort the run once `deadline` has passed. Checked between files.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Check every discovered file under `root`.
    pub fn run<P: AsRef<Path>>(&self, root: P) -> Result<Report, CheckError> {
        let mut discovery = discover(root, &self.discovery)?;
        tracing::debug!("scanning {}", discovery.root().display());

        let mut aggregate = if self.parallel {
            let files: Vec<PathBuf> = discovery.by_ref().collect();
            files
                .par_iter()
                .try_fold(
                    Aggregator::new,
                    |mut acc: Aggregator, path: &PathBuf| -> Result<Aggregator, CheckError> {
                        self.checkpoint()?;
                        self.scan_file(path, &mut acc);
                        Ok(acc)
                    },
                )
                .try_reduce(Aggregator::new, |a, b| Ok(a.merged(b)))?
        } else {
            let mut acc = Aggregator::new();
            for path in discovery.by_ref() {
                self.checkpoint()?;
                self.scan_file(&path, &mut acc);
            }
            acc
        };

        for skipped in discovery.take_skipped() {
            aggregate.file_skipped(skipped);
        }

        let report = aggregate.finish();
        tracing::debug!(
            "scanned {} files, {} skipped, required version {}",
            report.files_scanned,
            report.skipped.len(),
            report.required_version_label()
        );
        Ok(report)
    }

    /// Extract, match and fold a single file. Unreadable files are recorded
    /// as skipped.
    pub fn scan_file(&self, path: &Path, acc: &mut Aggregator) {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("cannot read {}: {}", path.display(), e);
                acc.file_skipped(SkippedFile {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        // Legacy sources are often Latin-1; identifiers are ASCII either way.
        let content = String::from_utf8_lossy(&bytes);
        let tokens = extract_calls(&content);
        acc.file_scanned();

        let mut matched = 0;
        for token in &tokens {
            if let Some(record) = resolve(self.catalog, token) {
                if self.is_ignored(record) {
                    continue;
                }
                acc.record(record);
                matched += 1;
            }
        }

        tracing::debug!(
            "{}: {} call sites, {} matched",
            path.display(),
            tokens.len(),
            matched
        );
    }

    fn is_ignored(&self, record: &FunctionRecord) -> bool {
        !self.ignored.is_empty()
            && self
                .ignored
                .contains(&record.qualified_name().to_lowercase())
    }

    fn checkpoint(&self) -> Result<(), CheckError> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(CheckError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(CheckError::DeadlineExceeded);
            }
        }
        Ok(())
    }
}
