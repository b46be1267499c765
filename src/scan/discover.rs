//! Discovery of source files under a project root.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::SkippedFile;
use crate::error::CheckError;

/// Extensions scanned when nothing else is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["php", "phtml"];

/// Which files discovery yields.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Recognized file extensions, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Glob patterns, matched against paths relative to the root.
    pub excluded_paths: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            excluded_paths: Vec::new(),
        }
    }
}

/// Lazy, single-pass walk over the matching files under a root.
///
/// Symbolic links are never followed and never yielded. Entries that cannot
/// be read are logged and collected for [`Discovery::take_skipped`]; they do not
/// stop the walk.
pub struct Discovery {
    root: PathBuf,
    walker: walkdir::FilterEntry<walkdir::IntoIter, Box<dyn FnMut(&DirEntry) -> bool + Send>>,
    extensions: HashSet<String>,
    skipped: Vec<SkippedFile>,
}

/// Start discovering files under `root`.
///
/// Fails with [`CheckError::RootUnresolvable`] when the root is missing,
/// is not a directory, or cannot be listed.
pub fn discover<P: AsRef<Path>>(root: P, config: &DiscoveryConfig) -> Result<Discovery, CheckError> {
    let requested = root.as_ref();
    let unresolvable = |reason: String| CheckError::RootUnresolvable {
        path: requested.to_path_buf(),
        reason,
    };

    let root = requested
        .canonicalize()
        .map_err(|e| unresolvable(e.to_string()))?;

    let metadata = fs::metadata(&root).map_err(|e| unresolvable(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(unresolvable("not a directory".to_string()));
    }
    fs::read_dir(&root).map_err(|e| unresolvable(e.to_string()))?;

    let excluded = build_globset(&config.excluded_paths)?;
    let extensions = config
        .extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect();

    let prune_root = root.clone();
    let filter: Box<dyn FnMut(&DirEntry) -> bool + Send> = Box::new(move |entry| {
        // The root was canonicalized above; indirection below it is not.
        if entry.depth() == 0 {
            return true;
        }
        if is_link_real(entry) {
            tracing::debug!("skipping symbolic link {}", entry.path().display());
            return false;
        }
        match &excluded {
            Some(set) => !set.is_match(relative_path(&prune_root, entry.path())),
            None => true,
        }
    });

    let walker = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(filter);

    Ok(Discovery {
        root,
        walker,
        extensions,
        skipped: Vec::new(),
    })
}

impl Discovery {
    /// Canonical root being walked.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Take the skipped entries, leaving the list empty.
    pub fn take_skipped(&mut self) -> Vec<SkippedFile> {
        std::mem::take(&mut self.skipped)
    }

    fn has_recognized_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }
}

impl Iterator for Discovery {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.has_recognized_extension(entry.path()) {
                        return Some(entry.into_path());
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    tracing::warn!("cannot read {}: {}", path.display(), e);
                    self.skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }
}

/// Whether an entry is a symbolic link or reached through one.
///
/// A directory whose canonical path differs from the path we reached it by
/// is treated as a link even when the entry itself is not a symlink.
fn is_link_real(entry: &DirEntry) -> bool {
    if entry.path_is_symlink() || entry.file_type().is_symlink() {
        return true;
    }
    if entry.file_type().is_dir() {
        return match entry.path().canonicalize() {
            Ok(canonical) => canonical != entry.path(),
            Err(_) => false,
        };
    }
    false
}

fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>, CheckError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| CheckError::Config(format!("excluded path {:?}: {}", pattern, e)))?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .map_err(|e| CheckError::Config(format!("excluded paths: {}", e)))?;
    Ok(Some(set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(discovery: Discovery) -> Vec<String> {
        let mut names: Vec<String> = discovery
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_discover_recurses_and_filters_extensions() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("lib/deep")).unwrap();
        std::fs::write(temp.path().join("index.php"), "<?php").unwrap();
        std::fs::write(temp.path().join("lib/view.PHTML"), "<?php").unwrap();
        std::fs::write(temp.path().join("lib/deep/util.php"), "<?php").unwrap();
        std::fs::write(temp.path().join("lib/readme.txt"), "text").unwrap();
        std::fs::write(temp.path().join("Makefile"), "all:").unwrap();

        let discovery = discover(temp.path(), &DiscoveryConfig::default()).unwrap();
        assert_eq!(names(discovery), vec!["index.php", "util.php", "view.PHTML"]);
    }

    #[test]
    fn test_discover_yields_absolute_paths() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("index.php"), "<?php").unwrap();

        let paths: Vec<_> = discover(temp.path(), &DiscoveryConfig::default())
            .unwrap()
            .collect();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].is_absolute());
    }

    #[test]
    fn test_discover_custom_extensions() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.php"), "").unwrap();
        std::fs::write(temp.path().join("b.inc"), "").unwrap();

        let config = DiscoveryConfig {
            extensions: vec![".INC".to_string()],
            ..Default::default()
        };
        assert_eq!(names(discover(temp.path(), &config).unwrap()), vec!["b.inc"]);
    }

    #[test]
    fn test_discover_excluded_paths() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("vendor/pkg")).unwrap();
        std::fs::write(temp.path().join("index.php"), "").unwrap();
        std::fs::write(temp.path().join("vendor/pkg/lib.php"), "").unwrap();

        let config = DiscoveryConfig {
            excluded_paths: vec!["vendor".to_string()],
            ..Default::default()
        };
        assert_eq!(names(discover(temp.path(), &config).unwrap()), vec!["index.php"]);
    }

    #[test]
    fn test_discover_invalid_glob() {
        let temp = TempDir::new().unwrap();
        let config = DiscoveryConfig {
            excluded_paths: vec!["[".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            discover(temp.path(), &config),
            Err(CheckError::Config(_))
        ));
    }

    #[test]
    fn test_discover_missing_root() {
        let temp = TempDir::new().unwrap();
        let result = discover(temp.path().join("nope"), &DiscoveryConfig::default());
        assert!(matches!(result, Err(CheckError::RootUnresolvable { .. })));
    }

    #[test]
    fn test_discover_root_is_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("index.php");
        std::fs::write(&file, "").unwrap();
        let result = discover(&file, &DiscoveryConfig::default());
        assert!(matches!(result, Err(CheckError::RootUnresolvable { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_skips_symlinks() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("linked.php"), "").unwrap();
        std::fs::write(outside.path().join("target.php"), "").unwrap();

        std::fs::create_dir(temp.path().join("real")).unwrap();
        std::fs::write(temp.path().join("real/own.php"), "").unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("linkdir")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("target.php"),
            temp.path().join("alias.php"),
        )
        .unwrap();
        // A cycle back to the root must not hang the walk.
        std::os::unix::fs::symlink(temp.path(), temp.path().join("real/loop")).unwrap();

        let discovery = discover(temp.path(), &DiscoveryConfig::default()).unwrap();
        assert_eq!(names(discovery), vec!["own.php"]);
    }
}
