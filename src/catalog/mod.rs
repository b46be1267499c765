//! The function catalog: known runtime symbols with the version and
//! extension that provide them.
//!
//! A catalog is loaded once and then only read. Every check run borrows it,
//! so one catalog can serve many runs (and many worker threads) at once.

mod format;

pub use format::CatalogFormat;

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::CheckError;
use crate::version::Version;

/// The runtime extension that provides a symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtensionRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_version: Option<Version>,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_version: Option<Version>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<ExtensionRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FunctionRecord {
    /// Create a free function record with no extension.
    pub fn new(name: &str, min_version: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            owner: None,
            min_version: min_version.and_then(Version::parse),
            extension: None,
            description: None,
        }
    }

    /// Set the owning class.
    pub fn owned_by(mut self, owner: &str) -> Self {
        self.owner = Some(owner.to_string());
        self
    }

    /// Set the providing extension.
    pub fn in_extension(mut self, name: &str, min_version: Option<&str>) -> Self {
        self.extension = Some(ExtensionRef {
            name: name.to_string(),
            min_version: min_version.and_then(Version::parse),
        });
        self
    }

    /// `Owner::name` for methods, `name` for free functions.
    pub fn qualified_name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{}::{}", owner, self.name),
            None => self.name.clone(),
        }
    }
}

/// Options that affect how a catalog is loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Keep entry descriptions in memory.
    pub include_descriptions: bool,
}

/// In-memory catalog index.
///
/// Records keep their catalog order. Both indexes store positions into that
/// order, so the first candidate returned for a key is always the earliest
/// entry in the source document.
#[derive(Debug, Default)]
pub struct Catalog {
    records: Vec<FunctionRecord>,
    by_name: HashMap<String, Vec<usize>>,
    by_owner: HashMap<String, Vec<usize>>,
}

impl Catalog {
    /// Build a catalog from records already in memory.
    pub fn from_records(records: Vec<FunctionRecord>) -> Self {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_owner: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, record) in records.iter().enumerate() {
            by_name
                .entry(record.name.to_lowercase())
                .or_default()
                .push(idx);
            if let Some(owner) = &record.owner {
                by_owner.entry(owner.to_lowercase()).or_default().push(idx);
            }
        }

        Self {
            records,
            by_name,
            by_owner,
        }
    }

    /// Load a catalog file. The format is chosen from the file extension.
    pub fn load<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self, CheckError> {
        let path = path.as_ref();
        let format = CatalogFormat::from_path(path).ok_or_else(|| {
            CheckError::UnsupportedCatalogFormat {
                path: path.to_path_buf(),
            }
        })?;

        let content = fs::read_to_string(path).map_err(|source| CheckError::CatalogUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let mut records = format
            .parse(&content)
            .map_err(|reason| CheckError::CatalogMalformed {
                path: path.to_path_buf(),
                reason,
            })?;

        if !options.include_descriptions {
            for record in &mut records {
                record.description = None;
            }
        }

        tracing::debug!(
            "loaded {} catalog entries from {} ({:?})",
            records.len(),
            path.display(),
            format
        );

        Ok(Self::from_records(records))
    }

    /// All records in catalog order.
    pub fn records(&self) -> &[FunctionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose name equals `name` (case-insensitive), in catalog order.
    pub fn candidates_by_name<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a FunctionRecord> + 'a {
        self.indexed(self.by_name.get(&name.to_lowercase()))
    }

    /// Records owned by `owner` (case-insensitive), in catalog order.
    pub fn candidates_by_owner<'a>(
        &'a self,
        owner: &str,
    ) -> impl Iterator<Item = &'a FunctionRecord> + 'a {
        self.indexed(self.by_owner.get(&owner.to_lowercase()))
    }

    fn indexed<'a>(
        &'a self,
        positions: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a FunctionRecord> + 'a {
        positions
            .into_iter()
            .flatten()
            .map(move |&idx| &self.records[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_index_preserves_catalog_order() {
        let catalog = Catalog::from_records(vec![
            FunctionRecord::new("open", Some("5.0.0")).owned_by("ZipArchive"),
            FunctionRecord::new("Open", Some("7.0.0")).owned_by("Other"),
            FunctionRecord::new("open", Some("8.0.0")).owned_by("ZipArchive"),
        ]);

        let versions: Vec<_> = catalog
            .candidates_by_name("OPEN")
            .map(|r| r.min_version.as_ref().unwrap().as_str().to_string())
            .collect();
        assert_eq!(versions, vec!["5.0.0", "7.0.0", "8.0.0"]);

        assert_eq!(catalog.candidates_by_owner("ziparchive").count(), 2);
        assert_eq!(catalog.candidates_by_name("missing").count(), 0);
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(FunctionRecord::new("strlen", None).qualified_name(), "strlen");
        assert_eq!(
            FunctionRecord::new("from", None)
                .owned_by("BackedEnum")
                .qualified_name(),
            "BackedEnum::from"
        );
    }

    #[test]
    fn test_load_unreadable() {
        let temp = TempDir::new().unwrap();
        let err = Catalog::load(temp.path().join("missing.xml"), LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, CheckError::CatalogUnreadable { .. }));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.txt");
        std::fs::write(&path, "strlen").unwrap();
        let err = Catalog::load(&path, LoadOptions::default()).unwrap_err();
        assert!(matches!(err, CheckError::UnsupportedCatalogFormat { .. }));
    }

    #[test]
    fn test_load_missing_name_is_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"name": "strlen", "minVersion": "4.0"}, {"minVersion": "5.0"}]"#,
        )
        .unwrap();
        let err = Catalog::load(&path, LoadOptions::default()).unwrap_err();
        match err {
            CheckError::CatalogMalformed { reason, .. } => assert!(reason.contains("entry 2")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_drops_descriptions_by_default() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.yaml");
        std::fs::write(
            &path,
            "- name: strlen\n  minVersion: \"4.0\"\n  description: Get string length\n",
        )
        .unwrap();

        let catalog = Catalog::load(&path, LoadOptions::default()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.records()[0].description.is_none());

        let catalog = Catalog::load(
            &path,
            LoadOptions {
                include_descriptions: true,
            },
        )
        .unwrap();
        assert_eq!(
            catalog.records()[0].description.as_deref(),
            Some("Get string length")
        );
    }
}
