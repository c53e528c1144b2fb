use gavel_version::{Version, VersionRange};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coordinate::Coordinate;

/// Error type for metadata readers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Invalid query {query}: {reason}")]
    InvalidQuery { query: String, reason: String },

    #[error("Failed to read metadata for {coordinate}: {reason}")]
    Read { coordinate: String, reason: String },
}

/// One version of a module as reported by a metadata source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub coordinate: Coordinate,
    #[serde(default)]
    pub dependencies: Vec<Coordinate>,
}

impl MetadataRecord {
    pub fn new(coordinate: Coordinate, dependencies: Vec<Coordinate>) -> Self {
        Self { coordinate, dependencies }
    }
}

/// Source of module metadata.
///
/// `read` returns every known version matching the query's GA and version
/// range, oldest first, each with its declared dependencies. An unknown
/// module yields an empty list, not an error.
pub trait MetadataReader: Send + Sync {
    fn read(&self, query: &Coordinate) -> Result<Vec<MetadataRecord>, MetadataError>;
}

/// Metadata catalogue held in memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryReader {
    modules: IndexMap<String, Vec<MetadataRecord>>,
}

impl InMemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one module version
    pub fn add(&mut self, record: MetadataRecord) -> &mut Self {
        self.modules.entry(record.coordinate.ga()).or_default().push(record);
        self
    }

    /// Register `gav` with dependencies written as coordinate strings
    pub fn add_artifact(&mut self, gav: &str, dependencies: &[&str]) -> crate::Result<&mut Self> {
        let coordinate = Coordinate::parse(gav)?;
        let dependencies = dependencies
            .iter()
            .map(|d| Coordinate::parse(d))
            .collect::<crate::Result<Vec<_>>>()?;
        Ok(self.add(MetadataRecord::new(coordinate, dependencies)))
    }

    /// Load a catalogue from a JSON object keyed by `group:artifact`
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.modules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetadataReader for InMemoryReader {
    fn read(&self, query: &Coordinate) -> Result<Vec<MetadataRecord>, MetadataError> {
        let range = VersionRange::parse(&query.version).map_err(|e| MetadataError::InvalidQuery {
            query: query.to_string(),
            reason: e.to_string(),
        })?;

        let Some(records) = self.modules.get(&query.ga()) else {
            return Ok(Vec::new());
        };

        let mut matching: Vec<(Version, MetadataRecord)> = records
            .iter()
            .map(|r| (r.coordinate.parsed_version(), r))
            .filter(|(version, _)| range.contains(version))
            .map(|(version, r)| (version, r.clone()))
            .collect();
        matching.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(matching.into_iter().map(|(_, r)| r).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> InMemoryReader {
        let mut reader = InMemoryReader::new();
        reader
            .add_artifact("b:b:2", &[])
            .unwrap()
            .add_artifact("b:b:1", &["c:c:1"])
            .unwrap()
            .add_artifact("b:b:3-SNAPSHOT", &[])
            .unwrap();
        reader
    }

    #[test]
    fn test_range_query_is_sorted_ascending() {
        let records = reader().read(&Coordinate::parse("b:b:[1,3)").unwrap()).unwrap();
        let versions: Vec<&str> = records.iter().map(|r| r.coordinate.version.as_str()).collect();
        assert_eq!(versions, vec!["1", "2", "3-SNAPSHOT"]);
        assert_eq!(records[0].dependencies.len(), 1);
    }

    #[test]
    fn test_pinned_query() {
        let records = reader().read(&Coordinate::parse("b:b:2.0").unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].coordinate.version, "2");
    }

    #[test]
    fn test_unknown_module_is_empty() {
        let records = reader().read(&Coordinate::parse("x:x:1").unwrap()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_invalid_range() {
        let result = reader().read(&Coordinate::parse("b:b:[3,1]").unwrap());
        assert!(matches!(result, Err(MetadataError::InvalidQuery { .. })));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "a:a": [
                { "coordinate": { "group": "a", "artifact": "a", "version": "1" },
                  "dependencies": [ { "group": "b", "artifact": "b", "version": "[1,2]", "optional": true } ] }
            ]
        }"#;
        let reader = InMemoryReader::from_json(json).unwrap();
        assert_eq!(reader.len(), 1);
        let records = reader.read(&Coordinate::parse("a:a:1").unwrap()).unwrap();
        assert!(records[0].dependencies[0].optional);
    }
}
