//! Artifact coordinates
//!
//! A [`Coordinate`] names a module (`group:artifact:version`) together with
//! the attributes of the edge that reached it: scope, optional flag and the
//! exclusion/inclusion patterns applied below it.

mod pattern;
mod scope;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use gavel_version::{Version, VersionRange};
use serde::{Deserialize, Serialize};

use crate::error::{ResolutionError, Result};

pub use pattern::ArtifactPattern;
pub use scope::Scope;

/// Default packaging type
pub const DEFAULT_TYPE: &str = "jar";

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

fn is_default_type(kind: &str) -> bool {
    kind == DEFAULT_TYPE
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A module coordinate plus per-edge attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    /// A concrete version or, on queries, a version range
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,

    #[serde(rename = "type", default = "default_type", skip_serializing_if = "is_default_type")]
    pub kind: String,

    #[serde(default)]
    pub scope: Scope,

    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<ArtifactPattern>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inclusions: Vec<ArtifactPattern>,

    /// Opaque back-reference to whatever produced this coordinate
    #[serde(skip)]
    pub tracker: Option<Arc<str>>,
}

impl Coordinate {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            classifier: None,
            kind: default_type(),
            scope: Scope::default(),
            optional: false,
            exclusions: Vec::new(),
            inclusions: Vec::new(),
            tracker: None,
        }
    }

    /// Parse `group:artifact:version[:classifier[:type]]`
    pub fn parse(input: &str) -> Result<Self> {
        let parts: Vec<&str> = input.trim().split(':').collect();
        let invalid = |reason: &str| ResolutionError::InvalidCoordinate {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        if parts.len() < 3 || parts.len() > 5 {
            return Err(invalid("expected group:artifact:version[:classifier[:type]]"));
        }
        if parts[..3].iter().any(|p| p.trim().is_empty()) {
            return Err(invalid("group, artifact and version must not be empty"));
        }

        let mut coordinate = Coordinate::new(parts[0].trim(), parts[1].trim(), parts[2].trim());
        if let Some(classifier) = parts.get(3).map(|c| c.trim()).filter(|c| !c.is_empty()) {
            coordinate.classifier = Some(classifier.to_string());
        }
        if let Some(kind) = parts.get(4).map(|t| t.trim()).filter(|t| !t.is_empty()) {
            coordinate.kind = kind.to_string();
        }
        Ok(coordinate)
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Add an exclusion pattern such as `c:c` or `c:c:2`
    pub fn with_exclusion(mut self, pattern: &str) -> Result<Self> {
        self.exclusions.push(ArtifactPattern::parse(pattern)?);
        Ok(self)
    }

    /// Add an inclusion pattern
    pub fn with_inclusion(mut self, pattern: &str) -> Result<Self> {
        self.inclusions.push(ArtifactPattern::parse(pattern)?);
        Ok(self)
    }

    pub fn with_tracker(mut self, tracker: impl Into<Arc<str>>) -> Self {
        self.tracker = Some(tracker.into());
        self
    }

    /// `group:artifact`
    pub fn ga(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    /// `group:artifact:version`
    pub fn gav(&self) -> String {
        format!("{}:{}:{}", self.group, self.artifact, self.version)
    }

    pub fn same_ga(&self, other: &Coordinate) -> bool {
        self.group == other.group && self.artifact == other.artifact
    }

    /// Same GA and equal versions under Maven ordering (`1.0` equals `1`)
    pub fn same_gav(&self, other: &Coordinate) -> bool {
        self.same_ga(other)
            && (self.version == other.version
                || Version::parse(&self.version) == Version::parse(&other.version))
    }

    /// Interpret the version field as a range
    pub fn version_range(&self) -> Result<VersionRange> {
        Ok(VersionRange::parse(&self.version)?)
    }

    pub fn parsed_version(&self) -> Version {
        Version::parse(&self.version)
    }

    pub fn is_snapshot(&self) -> bool {
        self.parsed_version().is_snapshot()
    }

    /// Copy of this coordinate carrying a concrete version
    pub fn resolved_to(&self, version: &str) -> Coordinate {
        let mut resolved = self.clone();
        resolved.version = version.to_string();
        resolved
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.group == other.group
            && self.artifact == other.artifact
            && self.version == other.version
            && self.classifier == other.classifier
            && self.kind == other.kind
            && self.scope == other.scope
            && self.optional == other.optional
            && self.exclusions == other.exclusions
            && self.inclusions == other.inclusions
    }
}

impl Eq for Coordinate {}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)?;
        match (&self.classifier, is_default_type(&self.kind)) {
            (Some(classifier), true) => write!(f, ":{}", classifier),
            (Some(classifier), false) => write!(f, ":{}:{}", classifier, self.kind),
            (None, false) => write!(f, "::{}", self.kind),
            (None, true) => Ok(()),
        }
    }
}

impl FromStr for Coordinate {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self> {
        Coordinate::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let c = Coordinate::parse("org.example:core:1.2.3").unwrap();
        assert_eq!(c.group, "org.example");
        assert_eq!(c.artifact, "core");
        assert_eq!(c.version, "1.2.3");
        assert_eq!(c.kind, "jar");
        assert_eq!(c.scope, Scope::Compile);
        assert!(c.classifier.is_none());

        let c = Coordinate::parse("org.example:core:1.0:sources:zip").unwrap();
        assert_eq!(c.classifier.as_deref(), Some("sources"));
        assert_eq!(c.kind, "zip");
    }

    #[test]
    fn test_parse_errors() {
        assert!(Coordinate::parse("a:b").is_err());
        assert!(Coordinate::parse("a::1").is_err());
        assert!(Coordinate::parse("a:b:1:c:d:e").is_err());
    }

    #[test]
    fn test_equalities() {
        let a = Coordinate::parse("g:a:1.0").unwrap();
        let b = Coordinate::parse("g:a:1").unwrap().with_scope(Scope::Test);
        let c = Coordinate::parse("g:a:2").unwrap();

        assert!(a.same_ga(&c));
        assert!(a.same_gav(&b));
        assert!(!a.same_gav(&c));
        assert_ne!(a, b);
        assert_eq!(a, Coordinate::parse("g:a:1.0").unwrap().with_tracker("repo-1"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Coordinate::parse("g:a:1").unwrap().to_string(), "g:a:1");
        assert_eq!(Coordinate::parse("g:a:1:tests").unwrap().to_string(), "g:a:1:tests");
        assert_eq!(Coordinate::parse("g:a:1::pom").unwrap().to_string(), "g:a:1::pom");
        assert_eq!(Coordinate::parse("g:a:1").unwrap().gav(), "g:a:1");
        assert_eq!(Coordinate::parse("g:a:1").unwrap().ga(), "g:a");
    }

    #[test]
    fn test_exclusions_builder() {
        let c = Coordinate::parse("a:a:1")
            .unwrap()
            .with_exclusion("c:c:2")
            .unwrap()
            .with_exclusion("d:*")
            .unwrap();
        assert_eq!(c.exclusions.len(), 2);
        assert!(c.exclusions[1].matches(&Coordinate::parse("d:x:9").unwrap()));
    }

    #[test]
    fn test_serde() {
        let c = Coordinate::parse("g:a:[1,2)").unwrap().with_optional(true);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["version"], "[1,2)");
        assert_eq!(json["optional"], true);
        assert!(json.get("type").is_none());

        let back: Coordinate = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
        assert_eq!(back.kind, "jar");
    }
}
