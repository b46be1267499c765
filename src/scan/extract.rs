//! Heuristic call-site extraction from raw PHP source text.
//!
//! This is a lexical pass, not a parser. Within each `<?php` region it looks
//! for `identifier(args);` shapes, optionally preceded by `new` or
//! `function` (matched case-insensitively, as PHP does). Known limits:
//!
//! - string literals and comments are not recognized, so calls inside them
//!   are reported;
//! - argument lists containing `)` (nested calls) never match, so neither
//!   the outer nor the inner call is reported;
//! - the call must be followed by `;`, so calls in conditions are missed;
//! - instance calls (`$obj->method();`) are reported as free calls to
//!   `method` because the receiver's class is unknown;
//! - namespaced names (`\Foo\bar();`, `new \Foo\Bar();`) lose their
//!   namespace prefix and are matched by their last segment.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

const OPEN_TAG: &str = "<?php";
const CLOSE_TAG: &str = "?>";

lazy_static! {
    /// Call-shaped token: optional keyword, identifier, argument list, `;`.
    static ref CALL_PATTERN: Regex =
        Regex::new(r"(?:(?i:\b(new|function))\s+)?([A-Za-z0-9_:\\]+)\s*\([^)]*\)\s*;")
            .unwrap();
}

/// Words that can precede `(...);` but never name a callable.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "elseif", "while", "for", "foreach", "switch", "match", "catch", "return", "and", "or",
    "xor", "fn",
];

/// Pseudo-owners that refer to the calling class itself.
const SELF_REFERENCES: &[&str] = &["self", "parent", "static"];

/// How a call site was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CallKind {
    /// `name(...)`
    FreeCall,
    /// `Owner::name(...)`
    StaticOrInstanceCall,
    /// `new Owner(...)`
    Construction,
}

/// A call site extracted from source.
///
/// Field order matters: the derived ordering is what deduplicates tokens
/// by `(owner, name)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallToken {
    pub owner: Option<String>,
    pub name: Option<String>,
    pub kind: CallKind,
}

impl CallToken {
    pub fn free(name: &str) -> Self {
        Self {
            owner: None,
            name: Some(name.to_string()),
            kind: CallKind::FreeCall,
        }
    }

    pub fn method(owner: &str, name: &str) -> Self {
        Self {
            owner: Some(owner.to_string()),
            name: Some(name.to_string()),
            kind: CallKind::StaticOrInstanceCall,
        }
    }

    pub fn construction(owner: &str) -> Self {
        Self {
            owner: Some(owner.to_string()),
            name: None,
            kind: CallKind::Construction,
        }
    }
}

/// Extract the distinct call tokens in a file's text.
pub fn extract_calls(content: &str) -> BTreeSet<CallToken> {
    php_regions(content)
        .flat_map(|region| CALL_PATTERN.captures_iter(region))
        .filter_map(|caps| {
            let keyword = caps.get(1).map(|m| m.as_str());
            let ident = caps.get(2)?.as_str();
            classify(keyword, ident)
        })
        .collect()
}

/// Iterate the embedded PHP regions of a file.
///
/// A region runs from an opening tag to the next closing tag, or to the end
/// of the file when the closing tag is omitted. The scan resumes after the
/// end of each region, so no text is visited twice.
pub fn php_regions(content: &str) -> impl Iterator<Item = &str> {
    // ASCII lowercasing keeps byte offsets aligned with `content`.
    let lower = content.to_ascii_lowercase();
    let mut offset = 0;
    let mut regions = Vec::new();

    while let Some(found) = lower[offset..].find(OPEN_TAG) {
        let start = offset + found;
        let body = start + OPEN_TAG.len();
        let end = match lower[body..].find(CLOSE_TAG) {
            Some(close) => body + close + CLOSE_TAG.len(),
            None => content.len(),
        };
        regions.push(&content[start..end]);
        offset = end;
    }

    regions.into_iter()
}

fn classify(keyword: Option<&str>, ident: &str) -> Option<CallToken> {
    let ident = unqualify(ident);
    match keyword {
        Some(kw) if kw.eq_ignore_ascii_case("function") => None,
        Some(_) => {
            let owner = ident.trim_matches(':');
            if owner.is_empty() || is_self_reference(owner) {
                return None;
            }
            Some(CallToken::construction(owner))
        }
        None => match ident.split_once("::") {
            Some((owner, name)) => {
                if owner.is_empty() || name.is_empty() || name.contains("::") {
                    return None;
                }
                if is_self_reference(owner) {
                    return None;
                }
                Some(CallToken::method(owner, name))
            }
            None => {
                if ident.is_empty()
                    || ident.contains(':')
                    || is_self_reference(ident)
                    || is_control_keyword(ident)
                {
                    return None;
                }
                Some(CallToken::free(ident))
            }
        },
    }
}

/// Drop a namespace prefix: `\Foo\Bar::baz` becomes `Bar::baz`.
fn unqualify(ident: &str) -> &str {
    ident.rsplit('\\').next().unwrap_or(ident)
}

fn is_self_reference(ident: &str) -> bool {
    SELF_REFERENCES.iter().any(|s| s.eq_ignore_ascii_case(ident))
}

fn is_control_keyword(ident: &str) -> bool {
    CONTROL_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(ident))
}
