pub mod builder;
pub mod config;
pub mod coordinate;
pub mod error;
pub mod event;
pub mod resolver;
pub mod solver;
pub mod tree;

pub use builder::{ArtifactFilter, InMemoryReader, MetadataReader, MetadataRecord, TreeBuilder, VetoMap};
pub use config::{ConfigLoader, ConfigSource, ResolverConfig};
pub use coordinate::{ArtifactPattern, Coordinate, Scope};
pub use error::{ResolutionError, Result};
pub use event::{EventDetail, EventDispatcher, EventListener, EventType, LogEventListener, ResolutionEvent};
pub use resolver::DependencyResolver;
pub use solver::{ConstraintSolver, Policy, Preference, SolverConfig};
pub use tree::{DependencyTree, NodeId, TreeNode};
