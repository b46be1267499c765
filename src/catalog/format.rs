//! Catalog document formats.
//!
//! The crawler that builds the catalog writes XML:
//!
//! ```xml
//! <functions>
//!   <function>
//!     <name>open</name>
//!     <version>5.2.0</version>
//!     <class>ZipArchive</class>
//!     <extension><name>zip</name><version>1.1.0</version></extension>
//!   </function>
//! </functions>
//! ```
//!
//! Version text is taken literally: a `<version>0</version>` written for
//! entries without a documented PHP version counts as version 0, not as
//! unknown. Only an empty or missing version is unknown.
//!
//! Hand-maintained catalogs may use JSON or YAML instead, either as a bare
//! list of entries or as an object with a `functions` list.

use serde::Deserialize;
use std::path::Path;

use super::{ExtensionRef, FunctionRecord};
use crate::version::{lenient_string, Version};

/// Supported catalog encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Xml,
    Json,
    Yaml,
}

impl CatalogFormat {
    /// Pick a format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "xml" => Some(CatalogFormat::Xml),
            "json" => Some(CatalogFormat::Json),
            "yaml" | "yml" => Some(CatalogFormat::Yaml),
            _ => None,
        }
    }

    /// Decode a catalog document into records, in document order.
    pub fn parse(self, content: &str) -> Result<Vec<FunctionRecord>, String> {
        let entries: Vec<RawEntry> = match self {
            CatalogFormat::Xml => {
                let doc: XmlDocument =
                    quick_xml::de::from_str(content).map_err(|e| e.to_string())?;
                doc.functions.into_iter().map(XmlEntry::into_raw).collect()
            }
            CatalogFormat::Json => serde_json::from_str::<Document>(content)
                .map_err(|e| e.to_string())?
                .into_entries(),
            CatalogFormat::Yaml => serde_yaml::from_str::<Document>(content)
                .map_err(|e| e.to_string())?
                .into_entries(),
        };

        entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| entry.into_record(idx + 1))
            .collect()
    }
}

/// Format-neutral entry, before validation.
#[derive(Debug, Default)]
struct RawEntry {
    name: Option<String>,
    owner: Option<String>,
    min_version: Option<String>,
    extension: Option<(Option<String>, Option<String>)>,
    description: Option<String>,
}

impl RawEntry {
    /// Validate and convert. `position` is 1-based for error messages.
    fn into_record(self, position: usize) -> Result<FunctionRecord, String> {
        let name = non_empty(self.name)
            .ok_or_else(|| format!("entry {} has no name", position))?;

        let extension = self.extension.and_then(|(ext_name, ext_version)| {
            non_empty(ext_name).map(|name| ExtensionRef {
                name,
                min_version: non_empty(ext_version).as_deref().and_then(Version::parse),
            })
        });

        Ok(FunctionRecord {
            name,
            owner: non_empty(self.owner),
            min_version: non_empty(self.min_version).as_deref().and_then(Version::parse),
            extension,
            description: non_empty(self.description),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// XML
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct XmlDocument {
    #[serde(rename = "function", default)]
    functions: Vec<XmlEntry>,
}

#[derive(Deserialize)]
struct XmlEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    extension: Option<XmlExtension>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct XmlExtension {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

impl XmlEntry {
    fn into_raw(self) -> RawEntry {
        RawEntry {
            name: self.name,
            owner: self.class,
            min_version: self.version,
            extension: self.extension.map(|e| (e.name, e.version)),
            description: self.description,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON / YAML
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    List(Vec<StructuredEntry>),
    Wrapped { functions: Vec<StructuredEntry> },
}

impl Document {
    fn into_entries(self) -> Vec<RawEntry> {
        let entries = match self {
            Document::List(entries) => entries,
            Document::Wrapped { functions } => functions,
        };
        entries.into_iter().map(StructuredEntry::into_raw).collect()
    }
}

#[derive(Deserialize)]
struct StructuredEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "class")]
    owner: Option<String>,
    #[serde(
        default,
        rename = "minVersion",
        alias = "min_version",
        alias = "version",
        deserialize_with = "lenient_string"
    )]
    min_version: Option<String>,
    #[serde(default)]
    extension: Option<StructuredExtension>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct StructuredExtension {
    #[serde(default)]
    name: Option<String>,
    #[serde(
        default,
        rename = "minVersion",
        alias = "min_version",
        alias = "version",
        deserialize_with = "lenient_string"
    )]
    min_version: Option<String>,
}

impl StructuredEntry {
    fn into_raw(self) -> RawEntry {
        RawEntry {
            name: self.name,
            owner: self.owner,
            min_version: self.min_version,
            extension: self.extension.map(|e| (e.name, e.min_version)),
            description: self.description,
        }
    }
}
