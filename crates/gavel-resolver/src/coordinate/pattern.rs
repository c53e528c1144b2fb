use std::fmt;
use std::str::FromStr;

use gavel_version::{Version, VersionRange};
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::{ResolutionError, Result};
use super::Coordinate;

#[derive(Debug, Clone)]
enum VersionMatcher {
    Glob(Pattern),
    Range(VersionRange),
}

/// An exclusion or inclusion rule: `group:artifact[:version]`.
///
/// Group and artifact accept `*` wildcards. The version part is either a
/// wildcard pattern or a version/range such as `[1.0,2.0)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactPattern {
    raw: String,
    group: Pattern,
    artifact: Pattern,
    version: Option<VersionMatcher>,
}

impl ArtifactPattern {
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        let invalid = |reason: String| ResolutionError::InvalidCoordinate {
            input: raw.to_string(),
            reason,
        };

        // Only the first two colons split; ranges may not contain colons anyway
        let mut parts = raw.splitn(3, ':');
        let group = parts.next().unwrap_or_default();
        let artifact = parts.next().unwrap_or("*");
        let version = parts.next();

        if group.is_empty() || artifact.is_empty() {
            return Err(invalid("group and artifact must not be empty".to_string()));
        }

        let compile = |part: &str| Pattern::new(part).map_err(|e| invalid(e.to_string()));

        let version = match version.map(str::trim) {
            None | Some("") | Some("*") => None,
            Some(v) if v.contains('*') => Some(VersionMatcher::Glob(compile(v)?)),
            Some(v) => Some(VersionMatcher::Range(VersionRange::parse(v)?)),
        };

        Ok(Self {
            raw: raw.to_string(),
            group: compile(group)?,
            artifact: compile(artifact)?,
            version,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check whether a coordinate falls under this pattern
    pub fn matches(&self, coordinate: &Coordinate) -> bool {
        if !self.group.matches(&coordinate.group) || !self.artifact.matches(&coordinate.artifact) {
            return false;
        }
        match &self.version {
            None => true,
            Some(VersionMatcher::Glob(pattern)) => pattern.matches(&coordinate.version),
            Some(VersionMatcher::Range(range)) => match VersionRange::parse(&coordinate.version) {
                // a range on the coordinate side matches when it can only mean a version we exclude
                Ok(theirs) => match theirs.pinned() {
                    Some(version) => range.contains(version),
                    None => false,
                },
                Err(_) => range.contains(&Version::parse(&coordinate.version)),
            },
        }
    }
}

impl PartialEq for ArtifactPattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ArtifactPattern {}

impl fmt::Display for ArtifactPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ArtifactPattern {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self> {
        ArtifactPattern::parse(s)
    }
}

impl TryFrom<String> for ArtifactPattern {
    type Error = ResolutionError;

    fn try_from(value: String) -> Result<Self> {
        ArtifactPattern::parse(&value)
    }
}

impl From<ArtifactPattern> for String {
    fn from(pattern: ArtifactPattern) -> Self {
        pattern.raw
    }
}
