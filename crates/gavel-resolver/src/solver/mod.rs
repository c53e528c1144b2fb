//! Conflict resolution over a dependency tree
//!
//! Every node becomes a boolean variable. The tree shape turns into
//! constraints (a selected node needs its parent, a mandatory dependency
//! needs exactly one candidate) and each GA may resolve to only one
//! version. A [`Policy`] ranks the versions of every GA, and the ranking
//! becomes a weighted objective the backend maximizes.

mod backend;
mod context;
mod encoder;
mod policy;
mod solver;


pub use backend::{
    BackendError, Comparison, Decisions, Literal, Normalized, Objective, PbConstraint, PbSolver,
    PseudoBooleanBackend,
};
pub use context::{ConstraintContext, Variable};
pub use encoder::BucketCardinality;
pub use policy::{NodeComparator, Policy, PolicyError, Preference};
pub use solver::{ConstraintSolver, SolverConfig};
