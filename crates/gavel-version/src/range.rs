//! Maven version range syntax
//!
//! ```text
//! 1.0            the version 1.0 and nothing else
//! [1.0]          same, explicit
//! [1.0,2.0)      1.0 <= v < 2.0
//! (,1.0]         v <= 1.0
//! [1.5,)         v >= 1.5
//! (,1.0],[1.2,)  v <= 1.0 or v >= 1.2
//! ```

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use crate::version::Version;

/// Error type for range parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Empty version range")]
    Empty,
    #[error("Unbalanced brackets in version range \"{0}\"")]
    Unbalanced(String),
    #[error("Single version \"{0}\" must be enclosed in inclusive brackets")]
    ExactMustBeInclusive(String),
    #[error("Lower bound is greater than upper bound in \"{0}\"")]
    Reversed(String),
    #[error("Restrictions overlap in version range \"{0}\"")]
    Overlap(String),
    #[error("Malformed version range \"{0}\"")]
    Malformed(String),
}

/// Lower or upper end of a restriction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    version: Version,
    is_inclusive: bool,
}

impl Bound {
    /// Create a new bound
    pub fn new(version: Version, is_inclusive: bool) -> Self {
        Self { version, is_inclusive }
    }

    /// Get the version of this bound
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Check if the bound is inclusive
    pub fn is_inclusive(&self) -> bool {
        self.is_inclusive
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]",
            self.version,
            if self.is_inclusive { "inclusive" } else { "exclusive" }
        )
    }
}

/// One bracketed interval of a range. A missing bound is unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction {
    lower: Option<Bound>,
    upper: Option<Bound>,
}

impl Restriction {
    /// Interval containing exactly one version
    pub fn exact(version: Version) -> Self {
        Self {
            lower: Some(Bound::new(version.clone(), true)),
            upper: Some(Bound::new(version, true)),
        }
    }

    pub fn lower(&self) -> Option<&Bound> {
        self.lower.as_ref()
    }

    pub fn upper(&self) -> Option<&Bound> {
        self.upper.as_ref()
    }

    /// Check whether the version lies inside this interval
    pub fn contains(&self, version: &Version) -> bool {
        if let Some(lower) = &self.lower {
            match version.cmp(&lower.version) {
                Ordering::Less => return false,
                Ordering::Equal if !lower.is_inclusive => return false,
                _ => {}
            }
        }
        if let Some(upper) = &self.upper {
            match version.cmp(&upper.version) {
                Ordering::Greater => return false,
                Ordering::Equal if !upper.is_inclusive => return false,
                _ => {}
            }
        }
        true
    }

    fn is_exact(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(l), Some(u)) => l.is_inclusive && u.is_inclusive && l.version == u.version,
            _ => false,
        }
    }

    fn parse(spec: &str) -> Result<Self, VersionError> {
        let lower_inclusive = spec.starts_with('[');
        let upper_inclusive = spec.ends_with(']');
        let inner = spec[1..spec.len() - 1].trim();

        match inner.find(',') {
            None => {
                if !lower_inclusive || !upper_inclusive {
                    return Err(VersionError::ExactMustBeInclusive(spec.to_string()));
                }
                if inner.is_empty() {
                    return Err(VersionError::Malformed(spec.to_string()));
                }
                Ok(Restriction::exact(Version::parse(inner)))
            }
            Some(comma) => {
                let lower = inner[..comma].trim();
                let upper = inner[comma + 1..].trim();
                if upper.contains(',') {
                    return Err(VersionError::Malformed(spec.to_string()));
                }
                let lower = (!lower.is_empty()).then(|| Bound::new(Version::parse(lower), lower_inclusive));
                let upper = (!upper.is_empty()).then(|| Bound::new(Version::parse(upper), upper_inclusive));

                if let (Some(l), Some(u)) = (&lower, &upper) {
                    match l.version.cmp(&u.version) {
                        Ordering::Greater => return Err(VersionError::Reversed(spec.to_string())),
                        Ordering::Equal if !(l.is_inclusive && u.is_inclusive) => {
                            return Err(VersionError::Reversed(spec.to_string()))
                        }
                        _ => {}
                    }
                }
                Ok(Restriction { lower, upper })
            }
        }
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_exact() {
            if let Some(lower) = &self.lower {
                return write!(f, "[{}]", lower.version);
            }
        }
        let open = match &self.lower {
            Some(l) if l.is_inclusive => '[',
            _ => '(',
        };
        let close = match &self.upper {
            Some(u) if u.is_inclusive => ']',
            _ => ')',
        };
        write!(f, "{}", open)?;
        if let Some(l) = &self.lower {
            write!(f, "{}", l.version)?;
        }
        write!(f, ",")?;
        if let Some(u) = &self.upper {
            write!(f, "{}", u.version)?;
        }
        write!(f, "{}", close)
    }
}

/// A parsed version range: a union of ordered, non-overlapping restrictions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    restrictions: Vec<Restriction>,
    pinned: Option<Version>,
}

impl VersionRange {
    /// Parse a version or range specification.
    ///
    /// A bare version pins that exact version.
    pub fn parse(spec: &str) -> Result<Self, VersionError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(VersionError::Empty);
        }

        if !spec.starts_with('[') && !spec.starts_with('(') {
            if spec.contains(['[', ']', '(', ')', ',']) {
                return Err(VersionError::Malformed(spec.to_string()));
            }
            let version = Version::parse(spec);
            return Ok(Self {
                restrictions: vec![Restriction::exact(version.clone())],
                pinned: Some(version),
            });
        }

        let mut restrictions: Vec<Restriction> = Vec::new();
        let mut rest = spec;
        while !rest.is_empty() {
            if !rest.starts_with('[') && !rest.starts_with('(') {
                return Err(VersionError::Malformed(spec.to_string()));
            }
            let close = rest
                .find([']', ')'])
                .ok_or_else(|| VersionError::Unbalanced(spec.to_string()))?;
            let restriction = Restriction::parse(&rest[..=close])?;

            if let Some(previous) = restrictions.last() {
                if !Self::ordered(previous, &restriction) {
                    return Err(VersionError::Overlap(spec.to_string()));
                }
            }
            restrictions.push(restriction);

            rest = rest[close + 1..].trim_start();
            if let Some(stripped) = rest.strip_prefix(',') {
                rest = stripped.trim_start();
                if rest.is_empty() {
                    return Err(VersionError::Malformed(spec.to_string()));
                }
            } else if !rest.is_empty() {
                return Err(VersionError::Malformed(spec.to_string()));
            }
        }

        let pinned = match restrictions.as_slice() {
            [only] if only.is_exact() => only.lower.as_ref().map(|b| b.version.clone()),
            _ => None,
        };

        Ok(Self { restrictions, pinned })
    }

    /// `previous` must end strictly before `next` starts
    fn ordered(previous: &Restriction, next: &Restriction) -> bool {
        let (Some(upper), Some(lower)) = (&previous.upper, &next.lower) else {
            return false;
        };
        match upper.version.cmp(&lower.version) {
            Ordering::Less => true,
            Ordering::Equal => !(upper.is_inclusive && lower.is_inclusive),
            Ordering::Greater => false,
        }
    }

    /// Check whether a version satisfies this range
    pub fn contains(&self, version: &Version) -> bool {
        self.restrictions.iter().any(|r| r.contains(version))
    }

    /// Parse and check a version string
    pub fn contains_str(&self, version: &str) -> bool {
        self.contains(&Version::parse(version))
    }

    /// The single version this range pins, if any
    pub fn pinned(&self) -> Option<&Version> {
        self.pinned.as_ref()
    }

    /// Check if this range matches exactly one version
    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    pub fn restrictions(&self) -> &[Restriction] {
        &self.restrictions
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pinned) = &self.pinned {
            return write!(f, "{}", pinned);
        }
        let parts: Vec<String> = self.restrictions.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl std::str::FromStr for VersionRange {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionRange::parse(s)
    }
}
