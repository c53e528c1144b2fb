use gavel_version::Version;
use indexmap::IndexMap;

use crate::coordinate::{ArtifactPattern, Coordinate};

/// Veto hook consulted for every candidate the tree builder considers.
pub trait ArtifactFilter: Send + Sync {
    /// Return true to keep the candidate out of the tree
    fn veto(&self, coordinate: &Coordinate) -> bool;
}

/// Vetoes listed versions per `group:artifact`
#[derive(Debug, Clone, Default)]
pub struct VetoMap {
    vetoes: IndexMap<String, Vec<Version>>,
}

impl VetoMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Veto one version of a module, e.g. `("org.example:core", "1.2")`
    pub fn veto_version(mut self, ga: &str, version: &str) -> Self {
        self.vetoes.entry(ga.to_string()).or_default().push(Version::parse(version));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.vetoes.is_empty()
    }
}

impl ArtifactFilter for VetoMap {
    fn veto(&self, coordinate: &Coordinate) -> bool {
        let Some(versions) = self.vetoes.get(&coordinate.ga()) else {
            return false;
        };
        let version = coordinate.parsed_version();
        versions.iter().any(|v| *v == version)
    }
}

impl ArtifactFilter for ArtifactPattern {
    fn veto(&self, coordinate: &Coordinate) -> bool {
        self.matches(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_veto_map() {
        let vetoes = VetoMap::new().veto_version("b:b", "2").veto_version("b:b", "3.0");
        assert!(vetoes.veto(&Coordinate::parse("b:b:2").unwrap()));
        assert!(vetoes.veto(&Coordinate::parse("b:b:3").unwrap()));
        assert!(!vetoes.veto(&Coordinate::parse("b:b:1").unwrap()));
        assert!(!vetoes.veto(&Coordinate::parse("c:c:2").unwrap()));
    }

    #[test]
    fn test_pattern_as_filter() {
        let filter: Box<dyn ArtifactFilter> = Box::new(ArtifactPattern::parse("b:*").unwrap());
        assert!(filter.veto(&Coordinate::parse("b:x:1").unwrap()));
        assert!(!filter.veto(&Coordinate::parse("c:x:1").unwrap()));
    }
}
