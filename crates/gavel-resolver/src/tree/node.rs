use std::fmt;

use crate::coordinate::Coordinate;

/// Index of a node inside its [`DependencyTree`](super::DependencyTree) arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One resolved module in a dependency tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub(crate) coordinate: Coordinate,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// The query of the parent that produced this node
    pub(crate) originating_query: Option<Coordinate>,
    /// Dependencies this node declares, in declaration order
    pub(crate) declared_queries: Vec<Coordinate>,
    pub(crate) real: bool,
    pub(crate) optional: bool,
    pub(crate) numeric_id: u32,
    pub(crate) name: Option<String>,
}

impl TreeNode {
    pub(crate) fn new(coordinate: Coordinate, parent: Option<NodeId>, originating_query: Option<Coordinate>) -> Self {
        let optional = originating_query.as_ref().map_or(coordinate.optional, |q| q.optional);
        Self {
            coordinate,
            parent,
            children: Vec::new(),
            originating_query,
            declared_queries: Vec::new(),
            real: true,
            optional,
            numeric_id: 0,
            name: None,
        }
    }

    pub fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn originating_query(&self) -> Option<&Coordinate> {
        self.originating_query.as_ref()
    }

    pub fn declared_queries(&self) -> &[Coordinate] {
        &self.declared_queries
    }

    /// False for helper nodes that do not stand for a real artifact
    pub fn is_real(&self) -> bool {
        self.real
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Pre-order number, 0 until the tree is numbered
    pub fn numeric_id(&self) -> u32 {
        self.numeric_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} [{}]", name, self.numeric_id),
            None => write!(f, "{} [{}]", self.coordinate.gav(), self.numeric_id),
        }
    }
}
