use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResolutionError;

/// Dependency scope of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Provided,
    Runtime,
    Test,
    System,
    Import,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Compile => "compile",
            Scope::Provided => "provided",
            Scope::Runtime => "runtime",
            Scope::Test => "test",
            Scope::System => "system",
            Scope::Import => "import",
        }
    }

    /// Check whether a resolution requested in this scope admits a
    /// dependency declared with `other`.
    pub fn admits(&self, other: Scope) -> bool {
        if *self == other {
            return true;
        }
        match self {
            Scope::Compile => matches!(other, Scope::Provided | Scope::System),
            Scope::Runtime => matches!(other, Scope::Compile),
            Scope::Test => matches!(
                other,
                Scope::Compile | Scope::Provided | Scope::Runtime | Scope::System
            ),
            Scope::Provided => matches!(other, Scope::Compile),
            Scope::System | Scope::Import => false,
        }
    }

    /// `test` and `provided` dependencies of a dependency are not inherited
    pub fn is_transitive(&self) -> bool {
        !matches!(self, Scope::Test | Scope::Provided)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compile" => Ok(Scope::Compile),
            "provided" => Ok(Scope::Provided),
            "runtime" => Ok(Scope::Runtime),
            "test" => Ok(Scope::Test),
            "system" => Ok(Scope::System),
            "import" => Ok(Scope::Import),
            other => Err(ResolutionError::InvalidInput(format!("unknown scope \"{}\"", other))),
        }
    }
}
