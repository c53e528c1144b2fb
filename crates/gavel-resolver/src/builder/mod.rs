//! Dependency tree construction
//!
//! [`TreeBuilder`] expands a root query into a [`DependencyTree`] by asking a
//! [`MetadataReader`] for every declared dependency. Each candidate version
//! becomes a child of the declaring node, so the tree holds every option the
//! solver may later choose from.
//!
//! Filtering happens while expanding:
//!
//! - scope: the root keeps dependencies its requested scope admits; below
//!   the root `test` and `provided` dependencies are not inherited
//! - optional dependencies of non-root nodes are not inherited
//! - exclusions accumulate down the path
//! - inclusions on an edge restrict everything below it
//! - snapshots are skipped unless enabled or pinned by the query
//! - [`ArtifactFilter`] vetoes
//!
//! A candidate whose GA already appears among its ancestors is a cycle.

mod filter;
mod reader;

use std::sync::Arc;

use log::{debug, trace};

use crate::coordinate::{ArtifactPattern, Coordinate, Scope};
use crate::error::{ResolutionError, Result};
use crate::tree::{DependencyTree, NodeId};

pub use filter::{ArtifactFilter, VetoMap};
pub use reader::{InMemoryReader, MetadataError, MetadataReader, MetadataRecord};

/// Patterns in force while expanding one subtree
#[derive(Clone, Default)]
struct PathFilters {
    exclusions: Vec<ArtifactPattern>,
    inclusions: Vec<ArtifactPattern>,
}

impl PathFilters {
    fn below(&self, edge: &Coordinate) -> PathFilters {
        let mut exclusions = self.exclusions.clone();
        exclusions.extend(edge.exclusions.iter().cloned());
        let inclusions = if edge.inclusions.is_empty() {
            self.inclusions.clone()
        } else {
            edge.inclusions.clone()
        };
        PathFilters { exclusions, inclusions }
    }

    fn rejects(&self, candidate: &Coordinate) -> bool {
        if self.exclusions.iter().any(|p| p.matches(candidate)) {
            return true;
        }
        !self.inclusions.is_empty() && !self.inclusions.iter().any(|p| p.matches(candidate))
    }
}

/// Builds dependency trees from a metadata source
#[derive(Clone)]
pub struct TreeBuilder {
    reader: Arc<dyn MetadataReader>,
    filters: Vec<Arc<dyn ArtifactFilter>>,
    include_snapshots: bool,
}

impl TreeBuilder {
    pub fn new(reader: Arc<dyn MetadataReader>) -> Self {
        Self {
            reader,
            filters: Vec::new(),
            include_snapshots: false,
        }
    }

    pub fn with_filter(mut self, filter: Arc<dyn ArtifactFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn include_snapshots(mut self, include: bool) -> Self {
        self.include_snapshots = include;
        self
    }

    /// Expand `query` into a numbered and named dependency tree
    pub fn build_tree(&self, query: &Coordinate, scope: Scope) -> Result<DependencyTree> {
        let filters = PathFilters::default().below(query);

        let records = self.reader.read(query)?;
        let root_record = self
            .candidates(query, records, &PathFilters::default())?
            .pop()
            .ok_or_else(|| ResolutionError::NoCandidates { query: query.to_string() })?;

        let root = Self::node_coordinate(query, &root_record.coordinate);
        debug!("Building dependency tree for {} in {} scope", root, scope);

        let mut tree = DependencyTree::new(root);
        let root_id = tree.root();
        self.expand(&mut tree, root_id, &root_record.dependencies, &filters, scope)?;

        tree.renumber(1);
        tree.create_names();
        debug!(
            "Built tree for {}: {} nodes, {} distinct, depth {}",
            query,
            tree.count_nodes(),
            tree.count_distinct_nodes(),
            tree.max_depth()
        );
        Ok(tree)
    }

    fn expand(
        &self,
        tree: &mut DependencyTree,
        node: NodeId,
        dependencies: &[Coordinate],
        filters: &PathFilters,
        scope: Scope,
    ) -> Result<()> {
        let is_root = node == tree.root();

        for dependency in dependencies {
            if !scope.admits(dependency.scope) || (!is_root && !dependency.scope.is_transitive()) {
                trace!("Skipping {} ({} scope)", dependency, dependency.scope);
                continue;
            }
            if !is_root && dependency.optional {
                trace!("Skipping optional transitive dependency {}", dependency);
                continue;
            }

            let records = self.reader.read(dependency)?;
            if records.is_empty() {
                if dependency.optional {
                    debug!("No versions of optional dependency {}, dropping it", dependency);
                    continue;
                }
                return Err(ResolutionError::NoCandidates { query: dependency.to_string() });
            }

            let candidates = self.candidates(dependency, records, filters)?;
            if candidates.is_empty() {
                debug!("Every version of {} was filtered out, dropping the query", dependency);
                continue;
            }

            for record in &candidates {
                self.check_cycle(tree, node, &record.coordinate)?;
            }

            tree.add_query(node, dependency.clone())?;
            let child_filters = filters.below(dependency);
            for record in candidates {
                let coordinate = Self::node_coordinate(dependency, &record.coordinate);
                debug!("Adding {} below {}", coordinate, tree.get(node)?.coordinate());
                let child = tree.add_child(node, coordinate, Some(dependency.clone()))?;
                self.expand(tree, child, &record.dependencies, &child_filters, scope)?;
            }
        }
        Ok(())
    }

    /// Apply snapshot, veto and path filters to reader output, keeping order
    fn candidates(
        &self,
        query: &Coordinate,
        records: Vec<MetadataRecord>,
        filters: &PathFilters,
    ) -> Result<Vec<MetadataRecord>> {
        let pinned = query.version_range()?.is_pinned();
        Ok(records
            .into_iter()
            .filter(|r| {
                let candidate = Self::node_coordinate(query, &r.coordinate);
                if !self.include_snapshots && !pinned && candidate.is_snapshot() {
                    trace!("Skipping snapshot {}", candidate);
                    return false;
                }
                if filters.rejects(&candidate) {
                    trace!("{} is excluded", candidate);
                    return false;
                }
                if self.filters.iter().any(|f| f.veto(&candidate)) {
                    trace!("{} is vetoed", candidate);
                    return false;
                }
                true
            })
            .collect())
    }

    fn check_cycle(&self, tree: &DependencyTree, node: NodeId, candidate: &Coordinate) -> Result<()> {
        let mut chain = vec![node];
        chain.extend(tree.ancestors(node));
        let cycle = chain
            .iter()
            .filter_map(|&id| tree.coordinate(id))
            .any(|c| c.same_ga(candidate));
        if !cycle {
            return Ok(());
        }

        let mut path: Vec<String> = chain
            .iter()
            .rev()
            .filter_map(|&id| tree.coordinate(id))
            .map(Coordinate::gav)
            .collect();
        path.push(candidate.gav());
        Err(ResolutionError::CircularDependency { path })
    }

    /// The query's edge attributes applied to a resolved record
    fn node_coordinate(query: &Coordinate, resolved: &Coordinate) -> Coordinate {
        let mut coordinate = query.resolved_to(&resolved.version);
        if coordinate.classifier.is_none() {
            coordinate.classifier = resolved.classifier.clone();
        }
        coordinate.tracker = resolved.tracker.clone();
        coordinate
    }
}
