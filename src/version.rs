//! Runtime version numbers as they appear in the catalog.
//!
//! Versions are compared numerically per dot-separated segment, so `5.10.0`
//! sorts above `5.9.1`. Segments that carry a suffix (`7.0.0RC1`) contribute
//! their leading digits only. Missing trailing segments count as zero.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// A parsed version string.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    segments: Vec<u64>,
}

impl Version {
    /// Parse a version string. Returns `None` for blank input.
    pub fn parse(s: &str) -> Option<Self> {
        let raw = s.trim();
        if raw.is_empty() {
            return None;
        }

        let segments = raw.split('.').map(leading_number).collect();

        Some(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The version exactly as written in the catalog.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Numeric segments, without trailing zero padding.
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// Numerically greater, ignoring spelling ("8.1.0" is not above "8.1").
    pub fn segments_gt(&self, other: &Self) -> bool {
        self.cmp_segments(other) == Ordering::Greater
    }

    fn cmp_segments(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

fn leading_number(segment: &str) -> u64 {
    let digits: String = segment
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

impl Ord for Version {
    // Numerically equal spellings ("5.3" / "5.3.0") fall back to the raw text
    // so that max() picks the same value regardless of fold order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_segments(other)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl std::str::FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s).ok_or_else(|| format!("invalid version: {:?}", s))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Keep the larger of two optional versions.
pub fn max_version(a: Option<Version>, b: Option<Version>) -> Option<Version> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Scalar accepted where a version string is expected.
///
/// Hand-written YAML tends to carry `8.1` unquoted, which arrives as a float.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(u64),
    Float(f64),
}

/// Deserialize an optional string that may have been written as a number.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Scalar> = Option::deserialize(deserializer)?;
    Ok(value.map(|s| match s {
        Scalar::Text(t) => t,
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
    }))
}
