use indexmap::IndexMap;
use log::trace;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::error::{ResolutionError, Result};
use crate::tree::{DependencyTree, NodeId};

use super::backend::{Comparison, Literal, PseudoBooleanBackend};
use super::context::ConstraintContext;

/// How many distinct GAVs of one GA may be selected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BucketCardinality {
    /// Every GA in the tree resolves to exactly one version
    #[default]
    ExactlyOne,
    /// A GA may also be left out entirely
    AtMostOne,
}

impl BucketCardinality {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "exactly-one" => Some(BucketCardinality::ExactlyOne),
            "at-most-one" => Some(BucketCardinality::AtMostOne),
            _ => None,
        }
    }
}

/// Nodes grouped by GA, in order of first appearance
pub(crate) type Buckets = IndexMap<String, Vec<NodeId>>;

/// Translates a numbered tree into constraints on `backend`.
pub(crate) struct Encoder<'a, B: PseudoBooleanBackend> {
    tree: &'a DependencyTree,
    context: &'a mut ConstraintContext,
    backend: &'a mut B,
}

impl<'a, B: PseudoBooleanBackend> Encoder<'a, B> {
    pub(crate) fn new(tree: &'a DependencyTree, context: &'a mut ConstraintContext, backend: &'a mut B) -> Self {
        Self { tree, context, backend }
    }

    /// Emit the structural and bucket constraints, returning the buckets
    pub(crate) fn encode(mut self, cardinality: BucketCardinality) -> Result<Buckets> {
        let order = self.tree.pre_order();

        let mut literals = Vec::with_capacity(order.len());
        for &id in &order {
            literals.push(self.context.literal_for(self.tree, id)?);
        }
        self.sync_vars();

        let root = literals[0];
        trace!("{} >= 1 (root)", self.describe(root));
        self.backend.add_at_least(&[root], 1)?;

        for (&id, &parent) in order.iter().zip(&literals) {
            self.encode_node(id, parent)?;
        }

        let buckets = self.fill_buckets(&order)?;
        self.encode_buckets(&buckets, cardinality)?;
        Ok(buckets)
    }

    fn encode_node(&mut self, id: NodeId, parent: Literal) -> Result<()> {
        let tree = self.tree;
        let node = tree.get(id)?;
        if !node.has_children() {
            return Ok(());
        }

        let queries = node.declared_queries();
        if queries.is_empty() {
            return Err(ResolutionError::InvalidInput(format!(
                "{} has children but declares no dependencies",
                node.coordinate()
            )));
        }

        for &child in node.children() {
            let coordinate = tree.get(child)?.coordinate();
            if !queries.iter().any(|q| q.same_ga(coordinate)) {
                return Err(ResolutionError::InvalidInput(format!(
                    "{} below {} matches none of its parent's dependencies",
                    coordinate,
                    node.coordinate()
                )));
            }
        }

        for query in queries {
            let mut range = Vec::new();
            for &child in node.children() {
                let coordinate = tree.get(child)?.coordinate();
                if query.same_ga(coordinate) {
                    range.push(self.context.literal_for(tree, child)?);
                }
            }

            if range.is_empty() {
                return Err(ResolutionError::InvalidInput(format!(
                    "dependency {} of {} has no candidates",
                    query,
                    node.coordinate()
                )));
            }

            for &candidate in &range {
                trace!("{} -> {}", self.describe(candidate), self.describe(parent));
                self.backend.add_implication(candidate, parent)?;
            }

            // a single candidate is bounded by its bucket alone
            if range.len() > 1 {
                trace!("at most 1 of {}", self.describe_all(&range));
                self.backend.add_at_most(&range, 1)?;
                if !query.optional {
                    trace!("at least 1 of {}", self.describe_all(&range));
                    self.backend.add_at_least(&range, 1)?;
                }
            }
        }
        Ok(())
    }

    fn fill_buckets(&self, order: &[NodeId]) -> Result<Buckets> {
        let mut buckets = Buckets::new();
        for &id in order {
            let coordinate = self.tree.get(id)?.coordinate();
            buckets.entry(coordinate.ga()).or_default().push(id);
        }
        Ok(buckets)
    }

    /// One selector per distinct GAV: `x -> s` for every node of the GAV and
    /// `s -> (x1 | x2 | ...)`, then the cardinality over the selectors.
    fn encode_buckets(&mut self, buckets: &Buckets, cardinality: BucketCardinality) -> Result<()> {
        let tree = self.tree;
        for (ga, members) in buckets {
            let mut selectors: IndexMap<Literal, Vec<Literal>> = IndexMap::new();
            for &id in members {
                let coordinate = tree.get(id)?.coordinate();
                let selector = self.context.selector_for(coordinate);
                let literal = self.context.literal_for(tree, id)?;
                selectors.entry(selector).or_default().push(literal);
            }
            self.sync_vars();

            for (&selector, nodes) in &selectors {
                for &node in nodes {
                    self.backend.add_implication(node, selector)?;
                }
                let mut terms: Vec<(BigInt, Literal)> = nodes.iter().map(|&n| (BigInt::from(1), n)).collect();
                terms.push((BigInt::from(-1), selector));
                self.backend.add_pseudo_boolean(&terms, Comparison::Ge, &BigInt::from(0))?;
            }

            let selectors: Vec<Literal> = selectors.keys().copied().collect();
            trace!("bucket {}: {:?} of {}", ga, cardinality, self.describe_all(&selectors));
            self.backend.add_at_most(&selectors, 1)?;
            if cardinality == BucketCardinality::ExactlyOne {
                self.backend.add_at_least(&selectors, 1)?;
            }
        }
        Ok(())
    }

    fn sync_vars(&mut self) {
        let missing = self.context.len().saturating_sub(self.backend.num_vars());
        if missing > 0 {
            self.backend.new_vars(missing);
        }
    }

    fn describe(&self, literal: Literal) -> String {
        match self.context.coordinate_for(literal) {
            Some(coordinate) => format!("x{}({})", literal, coordinate.gav()),
            None => format!("x{}", literal),
        }
    }

    fn describe_all(&self, literals: &[Literal]) -> String {
        literals.iter().map(|&l| self.describe(l)).collect::<Vec<_>>().join(", ")
    }
}
