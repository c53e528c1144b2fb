use std::borrow::Cow;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;
use crate::error::{ResolutionError, Result};
use crate::tree::DependencyTree;

use super::backend::{Literal, Objective, PbSolver, PseudoBooleanBackend};
use super::context::{ConstraintContext, Variable};
use super::encoder::{BucketCardinality, Buckets, Encoder};
use super::policy::Policy;

/// Knobs of one solver instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SolverConfig {
    /// Wall-clock budget for the search; `None` waits forever
    pub timeout: Option<Duration>,
    pub bucket_cardinality: BucketCardinality,
}

impl SolverConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_bucket_cardinality(mut self, cardinality: BucketCardinality) -> Self {
        self.bucket_cardinality = cardinality;
        self
    }
}

/// Picks one version per GA out of a fully expanded dependency tree.
///
/// All constraints are emitted on construction; [`apply_policies`] adds
/// the optimization objective, and [`solve`] / [`solve_as_tree`] decode
/// the backend's model. The input tree is never modified: if it is not
/// completely numbered the solver works on a renumbered copy.
///
/// [`apply_policies`]: ConstraintSolver::apply_policies
/// [`solve`]: ConstraintSolver::solve
/// [`solve_as_tree`]: ConstraintSolver::solve_as_tree
pub struct ConstraintSolver<'t, B: PseudoBooleanBackend = PbSolver> {
    tree: Cow<'t, DependencyTree>,
    context: ConstraintContext,
    backend: B,
    buckets: Buckets,
}

impl<'t> ConstraintSolver<'t, PbSolver> {
    pub fn new(tree: &'t DependencyTree) -> Result<Self> {
        Self::with_config(tree, SolverConfig::default())
    }

    pub fn with_config(tree: &'t DependencyTree, config: SolverConfig) -> Result<Self> {
        Self::with_backend(tree, PbSolver::new(), config)
    }
}

impl<'t, B: PseudoBooleanBackend> ConstraintSolver<'t, B> {
    /// Encode `tree` onto a caller supplied backend
    pub fn with_backend(tree: &'t DependencyTree, mut backend: B, config: SolverConfig) -> Result<Self> {
        tree.validate()?;

        let tree = if tree.has_complete_numbering() {
            Cow::Borrowed(tree)
        } else {
            log::debug!("Tree is not completely numbered, solving a renumbered copy");
            let mut copy = tree.deep_copy();
            copy.renumber(1);
            Cow::Owned(copy)
        };

        backend.set_timeout(config.timeout);

        let start = Instant::now();
        let mut context = ConstraintContext::with_capacity(tree.count_distinct_nodes());
        let buckets = Encoder::new(&tree, &mut context, &mut backend).encode(config.bucket_cardinality)?;

        log::debug!(
            "Encoded {} nodes in {} buckets as {} variables and {} constraints in {:?}",
            context.node_count(),
            buckets.len(),
            backend.num_vars(),
            backend.num_constraints(),
            start.elapsed()
        );

        Ok(Self {
            tree,
            context,
            backend,
            buckets,
        })
    }

    /// The tree being solved, renumbered if the input was not
    pub fn tree(&self) -> &DependencyTree {
        &self.tree
    }

    pub fn context(&self) -> &ConstraintContext {
        &self.context
    }

    pub fn num_variables(&self) -> usize {
        self.backend.num_vars()
    }

    pub fn num_constraints(&self) -> usize {
        self.backend.num_constraints()
    }

    /// Number of distinct GAs in the tree
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Turn a preference policy into the maximization objective.
    ///
    /// Every bucket with more than one distinct GAV contributes one term per
    /// GAV, weighted with descending powers of two across all such buckets,
    /// so a better choice in an earlier bucket outweighs any combination of
    /// later choices. An empty policy clears the objective.
    pub fn apply_policies(&mut self, policy: &Policy) -> Result<()> {
        if policy.is_empty() {
            self.backend.set_objective(Objective::new());
            return Ok(());
        }

        let mut ranked_buckets = Vec::new();
        for members in self.buckets.values() {
            let ranked = policy.rank(&self.tree, members)?;
            if ranked.len() > 1 {
                ranked_buckets.push(ranked);
            }
        }

        let total: usize = ranked_buckets.iter().map(Vec::len).sum();
        let mut objective = Objective::new();
        let mut position = 0usize;
        for ranked in &ranked_buckets {
            for &id in ranked {
                let coordinate = self.tree.get(id)?.coordinate();
                let selector = self.context.selector_literal(coordinate).ok_or_else(|| {
                    ResolutionError::InvalidInput(format!("{} was never encoded", coordinate))
                })?;
                let weight = BigUint::one() << (total - 1 - position);
                log::trace!("objective {} * x{} ({})", weight, selector, coordinate.gav());
                objective.push(weight, selector);
                position += 1;
            }
        }

        log::debug!(
            "Applied policy {:?}: {} weighted terms over {} buckets",
            policy.names(),
            objective.len(),
            ranked_buckets.len()
        );
        self.backend.set_objective(objective);
        Ok(())
    }

    /// Winning coordinates in variable order, one per GAV
    pub fn solve(&mut self) -> Result<Vec<Coordinate>> {
        let model = self.find_model()?;
        Ok(self.decode_list(&model))
    }

    /// The tree pruned down to the winning nodes
    pub fn solve_as_tree(&mut self) -> Result<DependencyTree> {
        let model = self.find_model()?;
        Ok(self.decode_tree(&model))
    }

    /// Both views of the same model
    pub fn solve_both(&mut self) -> Result<(Vec<Coordinate>, DependencyTree)> {
        let model = self.find_model()?;
        Ok((self.decode_list(&model), self.decode_tree(&model)))
    }

    fn find_model(&mut self) -> Result<Vec<Literal>> {
        let start = Instant::now();
        if !self.backend.is_satisfiable()? {
            log::debug!("No model after {:?}", start.elapsed());
            return Err(ResolutionError::Unsatisfiable);
        }
        let model = self.backend.model().ok_or(ResolutionError::Unsatisfiable)?.to_vec();
        log::debug!("Found a model in {:?}", start.elapsed());
        Ok(model)
    }

    fn selected_nodes<'m>(&'m self, model: &'m [Literal]) -> impl Iterator<Item = (u32, &'m Coordinate)> + 'm {
        model.iter().filter(|&&l| l > 0).filter_map(|&l| match self.context.variable(l) {
            Some(Variable::Node { numeric_id, coordinate, .. }) => Some((*numeric_id, coordinate)),
            _ => None,
        })
    }

    fn decode_list(&self, model: &[Literal]) -> Vec<Coordinate> {
        let mut result: Vec<Coordinate> = Vec::new();
        for (_, coordinate) in self.selected_nodes(model) {
            if !result.iter().any(|c| c.same_gav(coordinate)) {
                result.push(coordinate.clone());
            }
        }
        result
    }

    fn decode_tree(&self, model: &[Literal]) -> DependencyTree {
        let keep: HashSet<u32> = self.selected_nodes(model).map(|(id, _)| id).collect();
        self.tree.pruned_copy(&keep)
    }
}
