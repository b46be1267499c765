//! Resolution of call tokens against the catalog.

use super::CallToken;
use crate::catalog::{Catalog, FunctionRecord};

/// Resolve a call token to at most one catalog record.
///
/// Every field present on the token must match:
/// - an owner-qualified token only matches records with the same owner
///   (case-insensitive), and the same name when the token has one;
/// - a bare token only matches owner-less records with the same name.
///
/// When several records match, the earliest in catalog order wins. No match
/// is not an error; project-local and third-party calls are simply unknown.
pub fn resolve<'a>(catalog: &'a Catalog, token: &CallToken) -> Option<&'a FunctionRecord> {
    match (&token.owner, &token.name) {
        (Some(owner), Some(name)) => catalog
            .candidates_by_name(name)
            .find(|r| owner_matches(r, owner)),
        (Some(owner), None) => catalog.candidates_by_owner(owner).next(),
        (None, Some(name)) => catalog.candidates_by_name(name).find(|r| r.owner.is_none()),
        (None, None) => None,
    }
}

fn owner_matches(record: &FunctionRecord, owner: &str) -> bool {
    record
        .owner
        .as_deref()
        .map(|o| o.eq_ignore_ascii_case(owner))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_records(vec![
            FunctionRecord::new("array_map", Some("4.0.6")),
            FunctionRecord::new("enum", Some("8.1.0")).owned_by("UnitEnum"),
            FunctionRecord::new("open", Some("5.2.0")).owned_by("ZipArchive"),
            FunctionRecord::new("open", Some("9.9.9")).owned_by("ZipArchive"),
            FunctionRecord::new("open", Some("7.0.0")),
        ])
    }

    fn version(record: Option<&FunctionRecord>) -> Option<String> {
        record.and_then(|r| r.min_version.as_ref().map(|v| v.to_string()))
    }

    #[test]
    fn test_free_call_matches_ownerless_only() {
        let catalog = catalog();
        assert_eq!(
            version(resolve(&catalog, &CallToken::free("ARRAY_MAP"))),
            Some("4.0.6".to_string())
        );
        assert_eq!(
            version(resolve(&catalog, &CallToken::free("open"))),
            Some("7.0.0".to_string())
        );
        assert!(resolve(&catalog, &CallToken::free("enum")).is_none());
    }

    #[test]
    fn test_owned_call_never_matches_ownerless() {
        let catalog = catalog();
        assert!(resolve(&catalog, &CallToken::method("Foo", "array_map")).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let catalog = catalog();
        assert_eq!(
            version(resolve(&catalog, &CallToken::method("ziparchive", "OPEN"))),
            Some("5.2.0".to_string())
        );
    }

    #[test]
    fn test_construction_matches_by_owner() {
        let catalog = catalog();
        let record = resolve(&catalog, &CallToken::construction("UnitEnum")).unwrap();
        assert_eq!(record.qualified_name(), "UnitEnum::enum");
        assert!(resolve(&catalog, &CallToken::construction("Unknown")).is_none());
    }

    #[test]
    fn test_unknown_symbol_is_none() {
        assert!(resolve(&catalog(), &CallToken::free("my_helper")).is_none());
    }
}
