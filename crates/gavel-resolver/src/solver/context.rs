use std::collections::HashMap;

use crate::coordinate::Coordinate;
use crate::error::Result;
use crate::tree::{DependencyTree, NodeId};

use super::backend::Literal;

/// What a solver variable stands for
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    /// A tree node; the numeric id is kept for decoding
    Node {
        node: NodeId,
        numeric_id: u32,
        coordinate: Coordinate,
    },
    /// "This GAV is part of the solution", shared by all nodes of one GAV
    Selector { gav: String, coordinate: Coordinate },
}

impl Variable {
    pub fn coordinate(&self) -> &Coordinate {
        match self {
            Variable::Node { coordinate, .. } | Variable::Selector { coordinate, .. } => coordinate,
        }
    }
}

/// Bidirectional mapping between tree nodes and solver variables.
///
/// Variables are handed out densely from 1 in allocation order. Nodes are
/// keyed by arena identity, so nodes sharing a numeric id stay distinct.
#[derive(Debug, Clone, Default)]
pub struct ConstraintContext {
    variables: Vec<Variable>,
    by_node: HashMap<NodeId, Literal>,
    by_gav: HashMap<String, Literal>,
}

impl ConstraintContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            variables: Vec::with_capacity(capacity),
            by_node: HashMap::with_capacity(capacity),
            by_gav: HashMap::new(),
        }
    }

    fn allocate(&mut self, variable: Variable) -> Literal {
        self.variables.push(variable);
        self.variables.len() as Literal
    }

    /// The variable of a node, allocating one on first sight.
    ///
    /// Fails only for a node that is not part of `tree`.
    pub fn literal_for(&mut self, tree: &DependencyTree, node: NodeId) -> Result<Literal> {
        if let Some(&literal) = self.by_node.get(&node) {
            return Ok(literal);
        }

        let tree_node = tree.get(node)?;
        let literal = self.allocate(Variable::Node {
            node,
            numeric_id: tree_node.numeric_id(),
            coordinate: tree_node.coordinate().clone(),
        });
        self.by_node.insert(node, literal);
        Ok(literal)
    }

    /// The selector variable of a coordinate's GAV, allocating one on first sight
    pub fn selector_for(&mut self, coordinate: &Coordinate) -> Literal {
        let gav = coordinate.gav();
        if let Some(&literal) = self.by_gav.get(&gav) {
            return literal;
        }

        let literal = self.allocate(Variable::Selector {
            gav: gav.clone(),
            coordinate: coordinate.clone(),
        });
        self.by_gav.insert(gav, literal);
        literal
    }

    /// Look up an already allocated node variable
    pub fn node_literal(&self, node: NodeId) -> Option<Literal> {
        self.by_node.get(&node).copied()
    }

    pub fn selector_literal(&self, coordinate: &Coordinate) -> Option<Literal> {
        self.by_gav.get(&coordinate.gav()).copied()
    }

    /// What a literal's variable stands for; the sign is ignored
    pub fn variable(&self, literal: Literal) -> Option<&Variable> {
        let index = literal.unsigned_abs() as usize;
        index.checked_sub(1).and_then(|i| self.variables.get(i))
    }

    pub fn coordinate_for(&self, literal: Literal) -> Option<&Coordinate> {
        self.variable(literal).map(Variable::coordinate)
    }

    /// The node behind a literal, `None` for selectors
    pub fn node_for(&self, literal: Literal) -> Option<NodeId> {
        match self.variable(literal)? {
            Variable::Node { node, .. } => Some(*node),
            Variable::Selector { .. } => None,
        }
    }

    pub fn numeric_id_for(&self, literal: Literal) -> Option<u32> {
        match self.variable(literal)? {
            Variable::Node { numeric_id, .. } => Some(*numeric_id),
            Variable::Selector { .. } => None,
        }
    }

    pub fn is_selector(&self, literal: Literal) -> bool {
        matches!(self.variable(literal), Some(Variable::Selector { .. }))
    }

    /// Number of allocated variables
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.by_node.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolutionError;

    fn coord(s: &str) -> Coordinate {
        Coordinate::parse(s).unwrap()
    }

    #[test]
    fn test_literal_for_is_stable() {
        let mut tree = DependencyTree::new(coord("a:a:1"));
        let root = tree.root();
        let b = tree.add_child(root, coord("b:b:1"), None).unwrap();
        tree.renumber(1);

        let mut context = ConstraintContext::new();
        let x_root = context.literal_for(&tree, root).unwrap();
        let x_b = context.literal_for(&tree, b).unwrap();
        assert_eq!(x_root, 1);
        assert_eq!(x_b, 2);
        assert_eq!(context.literal_for(&tree, b).unwrap(), 2);
        assert_eq!(context.len(), 2);

        assert_eq!(context.node_for(x_b), Some(b));
        assert_eq!(context.node_for(-x_b), Some(b));
        assert_eq!(context.numeric_id_for(x_b), Some(2));
        assert_eq!(context.coordinate_for(x_b).unwrap().gav(), "b:b:1");
        assert_eq!(context.node_literal(root), Some(x_root));
    }

    #[test]
    fn test_same_gav_nodes_get_distinct_variables_but_share_selector() {
        let mut tree = DependencyTree::new(coord("a:a:1"));
        let root = tree.root();
        let c = tree.add_child(root, coord("c:c:1"), None).unwrap();
        let first = tree.add_child(root, coord("b:b:1"), None).unwrap();
        let second = tree.add_child(c, coord("b:b:1"), None).unwrap();
        tree.renumber(1);

        let mut context = ConstraintContext::with_capacity(4);
        let x1 = context.literal_for(&tree, first).unwrap();
        let x2 = context.literal_for(&tree, second).unwrap();
        assert_ne!(x1, x2);

        let s1 = context.selector_for(tree.coordinate(first).unwrap());
        let s2 = context.selector_for(tree.coordinate(second).unwrap());
        assert_eq!(s1, s2);
        assert!(context.is_selector(s1));
        assert_eq!(context.node_for(s1), None);
        assert_eq!(context.node_count(), 2);
    }

    #[test]
    fn test_repeated_numeric_ids_stay_distinct() {
        let mut tree = DependencyTree::new(coord("a:a:1"));
        let root = tree.root();
        let b = tree.add_child(root, coord("b:b:1"), None).unwrap();
        tree.renumber(1);
        let mut counter = 1;
        tree.renumber_from(b, &mut counter);
        assert_eq!(tree.node(b).unwrap().numeric_id(), tree.node(root).unwrap().numeric_id());

        let mut context = ConstraintContext::new();
        let x_root = context.literal_for(&tree, root).unwrap();
        let x_b = context.literal_for(&tree, b).unwrap();
        assert_ne!(x_root, x_b);
        assert_eq!(context.node_for(x_b), Some(b));
        assert_eq!(context.coordinate_for(x_b).unwrap().gav(), "b:b:1");
        assert_eq!(context.node_count(), 2);
    }

    #[test]
    fn test_dangling_node_is_rejected() {
        let tree = DependencyTree::new(coord("a:a:1"));
        let mut context = ConstraintContext::new();
        let result = context.literal_for(&tree, NodeId(7));
        assert!(matches!(result, Err(ResolutionError::InvalidInput(_))));
        assert!(context.is_empty());
    }

    #[test]
    fn test_unknown_literal() {
        let context = ConstraintContext::new();
        assert!(context.coordinate_for(1).is_none());
        assert!(context.variable(0).is_none());
    }
}
