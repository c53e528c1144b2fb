use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::source::{ConfigLoader, ConfigSource, RawConfig};
use crate::coordinate::Scope;
use crate::error::{ResolutionError, Result};
use crate::solver::{BucketCardinality, Policy, Preference, SolverConfig};

const KEYS: [&str; 5] = ["policies", "timeout-ms", "scope", "include-snapshots", "bucket-cardinality"];

/// Resolver settings.
///
/// Built from (lowest to highest priority) defaults, the global
/// `resolver.json`, the project `gavel.json` and `GAVEL_*` environment
/// variables. Both files keep their settings under a `config` key:
///
/// ```json
/// { "config": { "policies": ["nearest", "newest"], "timeout-ms": 5000 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolverConfig {
    /// Comparators applied to every GA bucket, most significant first
    #[serde(default = "default_policies")]
    pub policies: Vec<Preference>,

    /// Solver budget in milliseconds; unlimited when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Scope the root's dependencies are resolved for
    #[serde(default)]
    pub scope: Scope,

    #[serde(default)]
    pub include_snapshots: bool,

    #[serde(default)]
    pub bucket_cardinality: BucketCardinality,

    #[serde(skip)]
    sources: HashMap<String, ConfigSource>,
}

fn default_policies() -> Vec<Preference> {
    vec![Preference::Nearest, Preference::Newest]
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            policies: default_policies(),
            timeout_ms: None,
            scope: Scope::default(),
            include_snapshots: false,
            bucket_cardinality: BucketCardinality::default(),
            sources: HashMap::new(),
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build configuration from all sources
    pub fn build<P: AsRef<Path>>(project_dir: Option<P>, use_environment: bool) -> Result<Self> {
        Self::load(&ConfigLoader::new(use_environment), project_dir)
    }

    /// Build configuration from all sources through a prepared loader
    pub fn load<P: AsRef<Path>>(loader: &ConfigLoader, project_dir: Option<P>) -> Result<Self> {
        let mut config = Self::default();
        for key in KEYS {
            config.sources.insert(key.to_string(), ConfigSource::Default);
        }

        let global_config = loader.load_global_config()?;
        config.merge_raw_config(global_config, ConfigSource::Global)?;

        if let Some(project_dir) = &project_dir {
            let project_config = loader.load_project_config(project_dir)?;
            config.merge_raw_config(project_config, ConfigSource::Project)?;
        }

        if loader.uses_environment() {
            config.apply_env_overrides(loader)?;
        }

        Ok(config)
    }

    /// Where a setting came from
    pub fn get_source(&self, key: &str) -> Option<&ConfigSource> {
        self.sources.get(key)
    }

    pub fn set_policies(&mut self, policies: Vec<Preference>) {
        self.policies = policies;
        self.sources.insert("policies".to_string(), ConfigSource::Command);
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self.sources.insert("timeout-ms".to_string(), ConfigSource::Command);
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn policy(&self) -> Policy {
        Policy::from_preferences(&self.policies)
    }

    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            timeout: self.timeout(),
            bucket_cardinality: self.bucket_cardinality,
        }
    }

    fn merge_raw_config(&mut self, raw: RawConfig, source: ConfigSource) -> Result<()> {
        if let Some(config_map) = raw.config {
            for (key, value) in config_map {
                self.merge_config_value(&key, value, source.clone())?;
            }
        }
        Ok(())
    }

    /// Merge one value; values of the wrong JSON type are ignored
    fn merge_config_value(&mut self, key: &str, value: serde_json::Value, source: ConfigSource) -> Result<()> {
        match key {
            "policies" => {
                let names: Option<Vec<&str>> = match &value {
                    serde_json::Value::Array(items) => items.iter().map(|v| v.as_str()).collect(),
                    serde_json::Value::String(list) => Some(list.split(',').collect()),
                    _ => None,
                };
                if let Some(names) = names {
                    self.policies = Preference::parse_list(&names.join(","))
                        .map_err(|e| ResolutionError::Config(format!("{} ({})", e, source.as_str())))?;
                    self.sources.insert(key.to_string(), source);
                }
            }
            "timeout-ms" => {
                if let Some(n) = value.as_u64() {
                    self.timeout_ms = Some(n);
                    self.sources.insert(key.to_string(), source);
                } else if value.is_null() {
                    self.timeout_ms = None;
                    self.sources.insert(key.to_string(), source);
                }
            }
            "scope" => {
                if let Some(s) = value.as_str() {
                    self.scope = s
                        .parse()
                        .map_err(|e| ResolutionError::Config(format!("{} ({})", e, source.as_str())))?;
                    self.sources.insert(key.to_string(), source);
                }
            }
            "include-snapshots" => {
                if let Some(b) = value.as_bool() {
                    self.include_snapshots = b;
                    self.sources.insert(key.to_string(), source);
                }
            }
            "bucket-cardinality" => {
                if let Some(s) = value.as_str() {
                    if let Some(cardinality) = BucketCardinality::from_str(s) {
                        self.bucket_cardinality = cardinality;
                        self.sources.insert(key.to_string(), source);
                    }
                }
            }
            _ => log::debug!("Ignoring unknown configuration key \"{}\"", key),
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self, loader: &ConfigLoader) -> Result<()> {
        let env_source = |key: &str| ConfigSource::Environment(ConfigLoader::env_var_name(key));

        if let Some(list) = loader.get_env_config("policies") {
            self.policies = Preference::parse_list(&list)
                .map_err(|e| ResolutionError::Config(format!("{} (GAVEL_POLICIES)", e)))?;
            self.sources.insert("policies".to_string(), env_source("policies"));
        }

        if let Some(timeout) = loader.get_env_u64("timeout-ms") {
            self.timeout_ms = Some(timeout);
            self.sources.insert("timeout-ms".to_string(), env_source("timeout-ms"));
        }

        if let Some(scope) = loader.get_env_config("scope") {
            self.scope = scope
                .parse()
                .map_err(|e| ResolutionError::Config(format!("{} (GAVEL_SCOPE)", e)))?;
            self.sources.insert("scope".to_string(), env_source("scope"));
        }

        if let Some(include) = loader.get_env_bool("include-snapshots") {
            self.include_snapshots = include;
            self.sources.insert("include-snapshots".to_string(), env_source("include-snapshots"));
        }

        if let Some(cardinality) = loader
            .get_env_config("bucket-cardinality")
            .and_then(|s| BucketCardinality::from_str(&s))
        {
            self.bucket_cardinality = cardinality;
            self.sources.insert("bucket-cardinality".to_string(), env_source("bucket-cardinality"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawConfig {
        serde_json::from_value(json!({ "config": value })).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert_eq!(config.policies, vec![Preference::Nearest, Preference::Newest]);
        assert_eq!(config.timeout(), None);
        assert_eq!(config.scope, Scope::Compile);
        assert!(!config.include_snapshots);
        assert_eq!(config.bucket_cardinality, BucketCardinality::ExactlyOne);
        assert_eq!(config.policy().names(), vec!["nearest", "newest"]);
    }

    #[test]
    fn test_merge_values() {
        let mut config = ResolverConfig::default();
        config
            .merge_raw_config(
                raw(json!({
                    "policies": ["releases-first", "newest"],
                    "timeout-ms": 250,
                    "scope": "runtime",
                    "include-snapshots": true,
                    "bucket-cardinality": "at-most-one",
                })),
                ConfigSource::Project,
            )
            .unwrap();

        assert_eq!(config.policies, vec![Preference::ReleasesFirst, Preference::Newest]);
        assert_eq!(config.timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.scope, Scope::Runtime);
        assert!(config.include_snapshots);
        assert_eq!(config.bucket_cardinality, BucketCardinality::AtMostOne);
        assert_eq!(config.get_source("scope"), Some(&ConfigSource::Project));

        let solver = config.solver_config();
        assert_eq!(solver.timeout, Some(Duration::from_millis(250)));
        assert_eq!(solver.bucket_cardinality, BucketCardinality::AtMostOne);
    }

    #[test]
    fn test_policies_as_comma_list() {
        let mut config = ResolverConfig::default();
        config
            .merge_raw_config(raw(json!({ "policies": "oldest, farthest" })), ConfigSource::Global)
            .unwrap();
        assert_eq!(config.policies, vec![Preference::Oldest, Preference::Farthest]);

        config
            .merge_raw_config(raw(json!({ "policies": [] })), ConfigSource::Global)
            .unwrap();
        assert!(config.policy().is_empty());
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ResolverConfig::default();
        let err = config
            .merge_raw_config(raw(json!({ "policies": ["latest"] })), ConfigSource::Project)
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Config(_)));

        let err = config
            .merge_raw_config(raw(json!({ "scope": "everything" })), ConfigSource::Project)
            .unwrap_err();
        assert!(matches!(err, ResolutionError::Config(_)));

        // wrong types are skipped
        config
            .merge_raw_config(raw(json!({ "timeout-ms": "soon", "include-snapshots": 1 })), ConfigSource::Project)
            .unwrap();
        assert_eq!(config.timeout_ms, None);
        assert!(!config.include_snapshots);
    }

    #[test]
    fn test_setters_record_command_source() {
        let mut config = ResolverConfig::new();
        config.set_policies(vec![Preference::Farthest]);
        config.set_timeout(Some(Duration::from_secs(2)));
        assert_eq!(config.timeout_ms, Some(2000));
        assert_eq!(config.get_source("policies"), Some(&ConfigSource::Command));
    }

    #[test]
    fn test_serde_round_trip_uses_kebab_case() {
        let config = ResolverConfig::default();
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["policies"], json!(["nearest", "newest"]));
        assert_eq!(value["bucket-cardinality"], json!("exactly-one"));
        assert_eq!(value["include-snapshots"], json!(false));
    }
}
