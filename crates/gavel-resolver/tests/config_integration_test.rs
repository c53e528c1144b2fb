/// Integration tests for the configuration system
///
/// These tests verify that configuration is layered correctly from the
/// global file, the project file and environment variables.

use gavel_resolver::config::{ConfigLoader, ConfigSource, GLOBAL_CONFIG_FILE, PROJECT_CONFIG_FILE};
use gavel_resolver::solver::BucketCardinality;
use gavel_resolver::{Preference, ResolutionError, ResolverConfig, Scope};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn write_config(dir: &Path, name: &str, json: &str) {
    fs::write(dir.join(name), json).unwrap();
}

#[test]
fn test_load_empty_config_file() {
    let temp_dir = TempDir::new().unwrap();
    write_config(temp_dir.path(), GLOBAL_CONFIG_FILE, "{}");

    let loader = ConfigLoader::new(false);
    let raw = loader.load_config_file(temp_dir.path().join(GLOBAL_CONFIG_FILE)).unwrap();
    assert!(raw.config.is_none());
}

#[test]
fn test_build_without_files() {
    let home = TempDir::new().unwrap();
    let loader = ConfigLoader::new(false).with_home(home.path());

    let config = ResolverConfig::load(&loader, None::<&Path>).unwrap();
    assert_eq!(config.policies, vec![Preference::Nearest, Preference::Newest]);
    assert_eq!(config.get_source("policies"), Some(&ConfigSource::Default));
    assert_eq!(config.get_source("timeout-ms"), Some(&ConfigSource::Default));
}

#[test]
fn test_project_overrides_global() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    write_config(
        home.path(),
        GLOBAL_CONFIG_FILE,
        r#"{ "config": { "policies": ["oldest"], "timeout-ms": 1000, "include-snapshots": true } }"#,
    );
    write_config(
        project.path(),
        PROJECT_CONFIG_FILE,
        r#"{ "config": { "timeout-ms": 500, "scope": "test", "bucket-cardinality": "at-most-one" } }"#,
    );

    let loader = ConfigLoader::new(false).with_home(home.path());
    let config = ResolverConfig::load(&loader, Some(project.path())).unwrap();

    assert_eq!(config.policies, vec![Preference::Oldest]);
    assert_eq!(config.get_source("policies"), Some(&ConfigSource::Global));
    assert!(config.include_snapshots);

    assert_eq!(config.timeout(), Some(Duration::from_millis(500)));
    assert_eq!(config.get_source("timeout-ms"), Some(&ConfigSource::Project));
    assert_eq!(config.scope, Scope::Test);
    assert_eq!(config.bucket_cardinality, BucketCardinality::AtMostOne);
}

#[test]
fn test_malformed_file() {
    let project = TempDir::new().unwrap();
    write_config(project.path(), PROJECT_CONFIG_FILE, "{ not json");

    let home = TempDir::new().unwrap();
    let loader = ConfigLoader::new(false).with_home(home.path());
    let err = ResolverConfig::load(&loader, Some(project.path())).unwrap_err();
    assert!(matches!(err, ResolutionError::Config(_)));
}

#[test]
fn test_unknown_policy_in_file() {
    let project = TempDir::new().unwrap();
    write_config(project.path(), PROJECT_CONFIG_FILE, r#"{ "config": { "policies": ["shortest"] } }"#);

    let home = TempDir::new().unwrap();
    let loader = ConfigLoader::new(false).with_home(home.path());
    let err = ResolverConfig::load(&loader, Some(project.path())).unwrap_err();
    assert!(err.to_string().contains("shortest"));
}

#[test]
fn test_environment_overrides_files() {
    let home = TempDir::new().unwrap();
    write_config(
        home.path(),
        GLOBAL_CONFIG_FILE,
        r#"{ "config": { "policies": ["oldest"], "timeout-ms": 1000 } }"#,
    );

    // Set test environment variables
    env::set_var("GAVEL_POLICIES", "farthest,newest");
    env::set_var("GAVEL_TIMEOUT_MS", "250");
    env::set_var("GAVEL_INCLUDE_SNAPSHOTS", "yes");

    let loader = ConfigLoader::new(true).with_home(home.path());
    let config = ResolverConfig::load(&loader, None::<&Path>);

    // Clean up
    env::remove_var("GAVEL_POLICIES");
    env::remove_var("GAVEL_TIMEOUT_MS");
    env::remove_var("GAVEL_INCLUDE_SNAPSHOTS");

    let config = config.unwrap();
    assert_eq!(config.policies, vec![Preference::Farthest, Preference::Newest]);
    assert_eq!(
        config.get_source("policies"),
        Some(&ConfigSource::Environment("GAVEL_POLICIES".to_string()))
    );
    assert_eq!(config.timeout_ms, Some(250));
    assert!(config.include_snapshots);
}
