//! Resolver configuration
//!
//! Settings are merged from several sources, highest priority first:
//!
//! 1. Environment variables (`GAVEL_POLICIES`, `GAVEL_TIMEOUT_MS`,
//!    `GAVEL_SCOPE`, `GAVEL_INCLUDE_SNAPSHOTS`, `GAVEL_BUCKET_CARDINALITY`)
//! 2. Project `gavel.json`
//! 3. Global `resolver.json` in the gavel home (`GAVEL_HOME` or the
//!    platform configuration directory)
//! 4. Built-in defaults
//!
//! # Example
//!
//! ```rust,no_run
//! use gavel_resolver::config::ResolverConfig;
//! use std::path::Path;
//!
//! let config = ResolverConfig::build(Some(Path::new("/path/to/project")), true).unwrap();
//! println!("Policies: {:?}", config.policies);
//! println!("Timeout: {:?}", config.timeout());
//! ```

mod config;
mod source;

pub use config::ResolverConfig;
pub use source::{ConfigLoader, ConfigSource, RawConfig, GLOBAL_CONFIG_FILE, PROJECT_CONFIG_FILE};
