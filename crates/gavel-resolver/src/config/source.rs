use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ResolutionError, Result};

/// File name of the global configuration inside the gavel home
pub const GLOBAL_CONFIG_FILE: &str = "resolver.json";

/// File name of the project configuration
pub const PROJECT_CONFIG_FILE: &str = "gavel.json";

/// Where a configuration value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in default
    Default,
    /// The global `resolver.json`
    Global,
    /// The project `gavel.json`
    Project,
    /// From an environment variable
    Environment(String),
    /// Set programmatically
    Command,
}

impl ConfigSource {
    pub fn as_str(&self) -> &str {
        match self {
            ConfigSource::Default => "default",
            ConfigSource::Global => "global",
            ConfigSource::Project => "project",
            ConfigSource::Environment(var) => var,
            ConfigSource::Command => "command",
        }
    }
}

/// Configuration as read from a JSON file, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<HashMap<String, serde_json::Value>>,
}

/// Reads configuration files and `GAVEL_*` environment variables
#[derive(Debug, Default)]
pub struct ConfigLoader {
    use_environment: bool,
    home: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(use_environment: bool) -> Self {
        Self {
            use_environment,
            home: None,
        }
    }

    /// Use `home` instead of the platform configuration directory
    pub fn with_home<P: AsRef<Path>>(mut self, home: P) -> Self {
        self.home = Some(home.as_ref().to_path_buf());
        self
    }

    pub fn uses_environment(&self) -> bool {
        self.use_environment
    }

    /// Get a non-empty environment variable, if the environment is enabled
    pub fn get_env(&self, var: &str) -> Option<String> {
        if !self.use_environment {
            return None;
        }

        env::var(var).ok().filter(|s| !s.is_empty())
    }

    /// The gavel home directory holding the global configuration
    pub fn get_home(&self) -> PathBuf {
        if let Some(home) = &self.home {
            return home.clone();
        }

        if let Some(home) = self.get_env("GAVEL_HOME") {
            return PathBuf::from(home);
        }

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "gavel") {
            proj_dirs.config_dir().to_path_buf()
        } else if let Some(base_dirs) = directories::BaseDirs::new() {
            base_dirs.home_dir().join(".gavel")
        } else {
            PathBuf::from(".gavel")
        }
    }

    /// Load a configuration file; a missing file is an empty configuration
    pub fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<RawConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(RawConfig::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ResolutionError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: RawConfig = serde_json::from_str(&contents)
            .map_err(|e| ResolutionError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn load_global_config(&self) -> Result<RawConfig> {
        self.load_config_file(self.get_home().join(GLOBAL_CONFIG_FILE))
    }

    pub fn load_project_config<P: AsRef<Path>>(&self, project_dir: P) -> Result<RawConfig> {
        self.load_config_file(project_dir.as_ref().join(PROJECT_CONFIG_FILE))
    }

    /// Name of the environment variable for a key: `timeout-ms` is `GAVEL_TIMEOUT_MS`
    pub fn env_var_name(key: &str) -> String {
        format!("GAVEL_{}", key.replace('-', "_").to_uppercase())
    }

    pub fn get_env_config(&self, key: &str) -> Option<String> {
        self.get_env(&Self::env_var_name(key))
    }

    pub fn get_env_bool(&self, key: &str) -> Option<bool> {
        self.get_env_config(key)
            .map(|val| !matches!(val.to_lowercase().as_str(), "false" | "0" | "no" | "off"))
    }

    pub fn get_env_u64(&self, key: &str) -> Option<u64> {
        self.get_env_config(key).and_then(|val| val.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_as_str() {
        assert_eq!(ConfigSource::Default.as_str(), "default");
        assert_eq!(ConfigSource::Global.as_str(), "global");
        assert_eq!(ConfigSource::Project.as_str(), "project");
        assert_eq!(ConfigSource::Command.as_str(), "command");
        assert_eq!(ConfigSource::Environment("GAVEL_SCOPE".to_string()).as_str(), "GAVEL_SCOPE");
    }

    #[test]
    fn test_env_disabled() {
        let loader = ConfigLoader::new(false);
        assert!(!loader.uses_environment());
        assert_eq!(loader.get_env("PATH"), None);
        assert_eq!(loader.get_env_config("timeout-ms"), None);
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(ConfigLoader::env_var_name("timeout-ms"), "GAVEL_TIMEOUT_MS");
        assert_eq!(ConfigLoader::env_var_name("include-snapshots"), "GAVEL_INCLUDE_SNAPSHOTS");
    }

    #[test]
    fn test_home_override() {
        let loader = ConfigLoader::new(false).with_home("/tmp/gavel-home");
        assert_eq!(loader.get_home(), PathBuf::from("/tmp/gavel-home"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let loader = ConfigLoader::new(false);
        let raw = loader.load_config_file("/nonexistent/gavel/resolver.json").unwrap();
        assert!(raw.config.is_none());
    }
}
