use std::sync::Arc;
use std::time::Instant;

use crate::builder::{ArtifactFilter, MetadataReader, TreeBuilder};
use crate::config::ResolverConfig;
use crate::coordinate::Coordinate;
use crate::error::Result;
use crate::event::{EventDetail, EventDispatcher, ResolutionEvent};
use crate::solver::{ConstraintSolver, Policy};
use crate::tree::DependencyTree;

/// Builds dependency trees and resolves their version conflicts.
///
/// ```rust
/// use std::sync::Arc;
/// use gavel_resolver::{Coordinate, DependencyResolver, InMemoryReader};
///
/// let mut reader = InMemoryReader::new();
/// reader.add_artifact("a:a:1", &["b:b:[1,2]"]).unwrap();
/// reader.add_artifact("b:b:1", &[]).unwrap();
/// reader.add_artifact("b:b:2", &[]).unwrap();
///
/// let resolver = DependencyResolver::new(Arc::new(reader));
/// let resolved = resolver.resolve(&Coordinate::parse("a:a:1").unwrap()).unwrap();
/// assert_eq!(resolved[1].gav(), "b:b:2");
/// ```
pub struct DependencyResolver {
    builder: TreeBuilder,
    config: ResolverConfig,
    policy: Policy,
    events: EventDispatcher,
}

impl DependencyResolver {
    /// A resolver with default configuration: classic nearest-then-newest policy
    pub fn new(reader: Arc<dyn MetadataReader>) -> Self {
        Self::with_config(reader, ResolverConfig::default())
    }

    pub fn with_config(reader: Arc<dyn MetadataReader>, config: ResolverConfig) -> Self {
        let builder = TreeBuilder::new(reader).include_snapshots(config.include_snapshots);
        let policy = config.policy();
        Self {
            builder,
            config,
            policy,
            events: EventDispatcher::new(),
        }
    }

    pub fn with_filter(mut self, filter: Arc<dyn ArtifactFilter>) -> Self {
        self.builder = self.builder.with_filter(filter);
        self
    }

    /// Replace the configured policy, e.g. with custom comparators
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn events_mut(&mut self) -> &mut EventDispatcher {
        &mut self.events
    }

    /// Expand `query` into a full dependency tree for the configured scope
    pub fn build_tree(&self, query: &Coordinate) -> Result<DependencyTree> {
        let start = Instant::now();
        let tree = self.observe(&query.to_string(), self.builder.build_tree(query, self.config.scope))?;
        let root = self.root_name(&tree);
        self.emit(ResolutionEvent::tree_built(
            root,
            tree.count_nodes(),
            tree.count_distinct_nodes(),
            tree.max_depth(),
            start.elapsed(),
        ))?;
        Ok(tree)
    }

    /// Winning coordinates, one per GA
    pub fn resolve_conflicts(&self, tree: &DependencyTree) -> Result<Vec<Coordinate>> {
        let root = self.root_name(tree);
        let start = Instant::now();
        let result = self.solver(tree, &root).and_then(|mut solver| solver.solve());
        let resolved = self.observe(&root, result)?;
        self.emit(ResolutionEvent::solved(root, resolved.len(), start.elapsed()))?;
        Ok(resolved)
    }

    /// The tree pruned to the winning nodes
    pub fn resolve_conflicts_as_tree(&self, tree: &DependencyTree) -> Result<DependencyTree> {
        let root = self.root_name(tree);
        let start = Instant::now();
        let result = self.solver(tree, &root).and_then(|mut solver| solver.solve_as_tree());
        let resolved = self.observe(&root, result)?;
        self.emit(ResolutionEvent::solved(root, resolved.count_distinct_nodes(), start.elapsed()))?;
        Ok(resolved)
    }

    /// Build the tree for `query` and resolve it
    pub fn resolve(&self, query: &Coordinate) -> Result<Vec<Coordinate>> {
        let tree = self.build_tree(query)?;
        self.resolve_conflicts(&tree)
    }

    fn solver<'t>(&self, tree: &'t DependencyTree, root: &str) -> Result<ConstraintSolver<'t>> {
        let mut solver = ConstraintSolver::with_config(tree, self.config.solver_config())?;
        self.emit(ResolutionEvent::new(
            root,
            EventDetail::SolverCreated {
                variables: solver.num_variables(),
                constraints: solver.num_constraints(),
                buckets: solver.num_buckets(),
            },
        ))?;

        solver.apply_policies(&self.policy)?;
        self.emit(ResolutionEvent::new(
            root,
            EventDetail::PoliciesApplied {
                policies: self.policy.names(),
            },
        ))?;
        Ok(solver)
    }

    fn root_name(&self, tree: &DependencyTree) -> String {
        tree.coordinate(tree.root()).map(Coordinate::gav).unwrap_or_default()
    }

    fn emit(&self, event: ResolutionEvent) -> Result<()> {
        let code = self.events.dispatch(&event)?;
        if code != 0 {
            log::debug!("Listener stopped {} dispatch with code {}", event.event_type().name(), code);
        }
        Ok(())
    }

    /// Report a failed stage before handing the error back
    fn observe<T>(&self, root: &str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            let event = ResolutionEvent::new(root, EventDetail::Failed { error: err.to_string() });
            if let Err(listener_err) = self.events.dispatch(&event) {
                log::warn!("Failed to report resolution failure: {}", listener_err);
            }
        }
        result
    }
}
