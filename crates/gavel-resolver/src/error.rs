use std::time::Duration;

use gavel_version::VersionError;
use thiserror::Error;

use crate::builder::MetadataError;
use crate::solver::{BackendError, PolicyError};

#[derive(Error, Debug)]
pub enum ResolutionError {
    // Tree and encoding errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid coordinate \"{input}\": {reason}")]
    InvalidCoordinate { input: String, reason: String },

    // Solver errors
    #[error("Constraint contradiction: {0}")]
    Contradiction(String),

    #[error("Constraint solver timed out after {0:?}")]
    Timeout(Duration),

    #[error("No combination of versions satisfies the dependency constraints")]
    Unsatisfiable,

    #[error("Policy failed: {0}")]
    Policy(#[from] PolicyError),

    // Tree builder errors
    #[error("Circular dependency: {}", path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    #[error("No versions found for {query}")]
    NoCandidates { query: String },

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Invalid version range: {0}")]
    InvalidVersion(#[from] VersionError),

    #[error("Event listener failed: {0}")]
    Listener(#[from] anyhow::Error),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResolutionError {
    /// Only a timed out solve may succeed when attempted again
    pub fn is_retryable(&self) -> bool {
        matches!(self, ResolutionError::Timeout(_))
    }
}

impl From<BackendError> for ResolutionError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Contradiction(message) => ResolutionError::Contradiction(message),
            BackendError::Timeout(limit) => ResolutionError::Timeout(limit),
            BackendError::UnknownVariable(literal) => {
                ResolutionError::InvalidInput(format!("literal {} was never allocated", literal))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolutionError>;
