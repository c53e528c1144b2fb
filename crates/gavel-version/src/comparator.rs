//! Version comparison utilities

use std::cmp::Ordering;

use crate::version::Version;

/// Comparator for version strings using Maven ordering
pub struct VersionComparator;

impl VersionComparator {
    /// Check if version1 > version2
    pub fn greater_than(version1: &str, version2: &str) -> bool {
        Self::compare(version1, version2) == Ordering::Greater
    }

    /// Check if version1 >= version2
    pub fn greater_than_or_equal_to(version1: &str, version2: &str) -> bool {
        Self::compare(version1, version2) != Ordering::Less
    }

    /// Check if version1 < version2
    pub fn less_than(version1: &str, version2: &str) -> bool {
        Self::compare(version1, version2) == Ordering::Less
    }

    /// Check if version1 <= version2
    pub fn less_than_or_equal_to(version1: &str, version2: &str) -> bool {
        Self::compare(version1, version2) != Ordering::Greater
    }

    /// Check if version1 == version2
    pub fn equal_to(version1: &str, version2: &str) -> bool {
        Self::compare(version1, version2) == Ordering::Equal
    }

    /// Three-way comparison of two version strings
    pub fn compare(version1: &str, version2: &str) -> Ordering {
        Version::parse(version1).cmp(&Version::parse(version2))
    }

    /// Pick the highest version, optionally ignoring snapshots.
    ///
    /// Ties keep the first occurrence.
    pub fn find_latest<'a, I>(versions: I, no_snapshots: bool) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best: Option<(&'a str, Version)> = None;
        for candidate in versions {
            let parsed = Version::parse(candidate);
            if no_snapshots && parsed.is_snapshot() {
                continue;
            }
            let replace = match &best {
                Some((_, current)) => parsed > *current,
                None => true,
            };
            if replace {
                best = Some((candidate, parsed));
            }
        }
        best.map(|(raw, _)| raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greater_than() {
        assert!(VersionComparator::greater_than("1.25.0", "1.24.0"));
        assert!(!VersionComparator::greater_than("1.25.0", "1.25.0"));
        assert!(VersionComparator::greater_than("1.0", "1.0-SNAPSHOT"));
        assert!(VersionComparator::greater_than("1.0-sp1", "1.0"));
    }

    #[test]
    fn test_equal_to() {
        assert!(VersionComparator::equal_to("1", "1.0.0"));
        assert!(VersionComparator::equal_to("1.0-ga", "1.0"));
        assert!(!VersionComparator::equal_to("1.0", "1.0.1"));
    }

    #[test]
    fn test_less_than_or_equal() {
        assert!(VersionComparator::less_than_or_equal_to("1.0", "1.0"));
        assert!(VersionComparator::less_than_or_equal_to("1.0-rc1", "1.0"));
        assert!(VersionComparator::less_than("1.0-alpha-1", "1.0-beta-1"));
        assert!(VersionComparator::greater_than_or_equal_to("2", "1.9.9"));
    }

    #[test]
    fn test_find_latest() {
        let versions = ["1.0", "2.0-SNAPSHOT", "1.5", "1.10"];
        assert_eq!(VersionComparator::find_latest(versions, false), Some("2.0-SNAPSHOT"));
        assert_eq!(VersionComparator::find_latest(versions, true), Some("1.10"));
        assert_eq!(VersionComparator::find_latest(["1.0-SNAPSHOT"], true), None);
        assert_eq!(VersionComparator::find_latest(Vec::<&str>::new(), false), None);
    }
}
