//! Dependency tree arena
//!
//! Nodes live in a flat `Vec` and refer to each other through [`NodeId`]s.
//! Children are ordered by declaration; that order is the tie-break of
//! last resort during conflict resolution.

mod node;

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::coordinate::Coordinate;
use crate::error::{ResolutionError, Result};

pub use node::{NodeId, TreeNode};

#[derive(Debug, Clone)]
pub struct DependencyTree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl DependencyTree {
    /// Create a tree holding only the root node
    pub fn new(root: Coordinate) -> Self {
        Self {
            nodes: vec![TreeNode::new(root, None, None)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// Like [`node`](Self::node) but a dangling id is an error
    pub fn get(&self, id: NodeId) -> Result<&TreeNode> {
        self.node(id)
            .ok_or_else(|| ResolutionError::InvalidInput(format!("node {} is not part of the tree", id)))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut TreeNode> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| ResolutionError::InvalidInput(format!("node {} is not part of the tree", id)))
    }

    pub fn coordinate(&self, id: NodeId) -> Option<&Coordinate> {
        self.node(id).map(|n| &n.coordinate)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Append a child below `parent`, produced by `query`
    pub fn add_child(&mut self, parent: NodeId, coordinate: Coordinate, query: Option<Coordinate>) -> Result<NodeId> {
        self.get(parent)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode::new(coordinate, Some(parent), query));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Record a dependency declared by `node`
    pub fn add_query(&mut self, node: NodeId, query: Coordinate) -> Result<()> {
        self.get_mut(node)?.declared_queries.push(query);
        Ok(())
    }

    /// Drop every declared query of `node` matching the predicate
    pub fn remove_queries<F>(&mut self, node: NodeId, mut predicate: F) -> Result<()>
    where
        F: FnMut(&Coordinate) -> bool,
    {
        self.get_mut(node)?.declared_queries.retain(|q| !predicate(q));
        Ok(())
    }

    pub fn set_real(&mut self, node: NodeId, real: bool) -> Result<()> {
        self.get_mut(node)?.real = real;
        Ok(())
    }

    /// Strict ancestors of a node, nearest first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent) = current {
            out.push(parent);
            current = self.parent(parent);
        }
        out
    }

    /// Distance from the root; the root has depth 0
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).len()
    }

    /// All nodes reachable from the root in depth-first pre-order
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        order
    }

    pub fn count_nodes(&self) -> usize {
        self.pre_order().len()
    }

    /// Number of distinct `group:artifact:version` values in the tree
    pub fn count_distinct_nodes(&self) -> usize {
        self.pre_order()
            .into_iter()
            .filter_map(|id| self.coordinate(id))
            .map(Coordinate::gav)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn max_depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(self.children(id).iter().map(|&c| (c, depth + 1)));
        }
        max
    }

    /// Number the subtree under `node` in pre-order, taking ids from `counter`.
    ///
    /// The first node receives `*counter`; on return `counter` holds the next free id.
    pub fn renumber_from(&mut self, node: NodeId, counter: &mut u32) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(n) = self.nodes.get_mut(id.0) else {
                continue;
            };
            n.numeric_id = *counter;
            *counter += 1;
            stack.extend(n.children.iter().rev().copied());
        }
    }

    /// Number the whole tree starting at `start`; returns the next free id
    pub fn renumber(&mut self, start: u32) -> u32 {
        let mut counter = start;
        self.renumber_from(self.root, &mut counter);
        counter
    }

    /// Check that every reachable node carries a non-zero, unique id
    pub fn has_complete_numbering(&self) -> bool {
        let mut seen = HashSet::new();
        self.pre_order().into_iter().all(|id| {
            let numeric_id = self.nodes[id.0].numeric_id;
            numeric_id != 0 && seen.insert(numeric_id)
        })
    }

    pub fn find_by_numeric_id(&self, numeric_id: u32) -> Option<NodeId> {
        self.pre_order()
            .into_iter()
            .find(|id| self.nodes[id.0].numeric_id == numeric_id)
    }

    /// Assign debug names `group:artifact:version:level.sequence`
    pub fn create_names(&mut self) {
        let mut stack = vec![(self.root, 0usize, 0usize)];
        while let Some((id, level, seq)) = stack.pop() {
            let node = &mut self.nodes[id.0];
            node.name = Some(format!("{}:{}.{}", node.coordinate.gav(), level, seq));
            stack.extend(
                node.children
                    .iter()
                    .enumerate()
                    .rev()
                    .map(|(i, &child)| (child, level + 1, i)),
            );
        }
    }

    /// Structural copy of everything reachable from the root
    pub fn deep_copy(&self) -> DependencyTree {
        self.copy_where(|_| true)
    }

    /// Copy in which every child whose numeric id is not in `keep` is
    /// removed together with its subtree. The root is always kept.
    pub fn pruned_copy(&self, keep: &HashSet<u32>) -> DependencyTree {
        self.copy_where(|node| keep.contains(&node.numeric_id))
    }

    fn copy_where<F>(&self, keep: F) -> DependencyTree
    where
        F: Fn(&TreeNode) -> bool,
    {
        let mut nodes: Vec<TreeNode> = Vec::with_capacity(self.nodes.len());
        let mut mapping: HashMap<NodeId, NodeId> = HashMap::new();

        let mut root = self.nodes[self.root.0].clone();
        root.parent = None;
        root.children.clear();
        nodes.push(root);
        mapping.insert(self.root, NodeId(0));

        let mut stack: Vec<NodeId> = vec![self.root];
        while let Some(old) = stack.pop() {
            let new_parent = mapping[&old];
            for &child in &self.nodes[old.0].children {
                let source = &self.nodes[child.0];
                if !keep(source) {
                    continue;
                }
                let new_id = NodeId(nodes.len());
                let mut copy = source.clone();
                copy.parent = Some(new_parent);
                copy.children.clear();
                nodes.push(copy);
                nodes[new_parent.0].children.push(new_id);
                mapping.insert(child, new_id);
                stack.push(child);
            }
        }

        DependencyTree { nodes, root: NodeId(0) }
    }

    /// Check the strict-tree shape: one parent per node, parent links
    /// consistent with child lists, no cycles, no unreachable nodes.
    pub fn validate(&self) -> Result<()> {
        let root = self.get(self.root)?;
        if root.parent.is_some() {
            return Err(ResolutionError::InvalidInput("root node has a parent".to_string()));
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if visited[id.0] {
                return Err(ResolutionError::InvalidInput(format!(
                    "node {} ({}) is reachable more than once",
                    id, self.nodes[id.0].coordinate
                )));
            }
            visited[id.0] = true;
            for &child in &self.nodes[id.0].children {
                let node = self.get(child)?;
                if node.parent != Some(id) {
                    return Err(ResolutionError::InvalidInput(format!(
                        "node {} ({}) is listed under {} but its parent link disagrees",
                        child, node.coordinate, id
                    )));
                }
                stack.push(child);
            }
        }

        if let Some(orphan) = visited.iter().position(|v| !v) {
            return Err(ResolutionError::InvalidInput(format!(
                "node #{} ({}) is not reachable from the root",
                orphan, self.nodes[orphan].coordinate
            )));
        }
        Ok(())
    }
}

impl fmt::Display for DependencyTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            writeln!(f, "{}{}", "  ".repeat(depth), self.nodes[id.0])?;
            stack.extend(self.children(id).iter().rev().map(|&c| (c, depth + 1)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(s: &str) -> Coordinate {
        Coordinate::parse(s).unwrap()
    }

    /// a:a:1 -> { b:b:1, b:b:2, c:c:1 -> b:b:1 }
    fn sample() -> DependencyTree {
        let mut tree = DependencyTree::new(coord("a:a:1"));
        let root = tree.root();
        let b_query = coord("b:b:[1,2]");
        let c_query = coord("c:c:1");
        tree.add_query(root, b_query.clone()).unwrap();
        tree.add_query(root, c_query.clone()).unwrap();
        tree.add_child(root, coord("b:b:1"), Some(b_query.clone())).unwrap();
        tree.add_child(root, coord("b:b:2"), Some(b_query)).unwrap();
        let c = tree.add_child(root, coord("c:c:1"), Some(c_query)).unwrap();
        let b1 = coord("b:b:1");
        tree.add_query(c, b1.clone()).unwrap();
        tree.add_child(c, b1.clone(), Some(b1)).unwrap();
        tree
    }

    #[test]
    fn test_counts() {
        let tree = sample();
        assert_eq!(tree.count_nodes(), 5);
        assert_eq!(tree.count_distinct_nodes(), 4);
        assert_eq!(tree.max_depth(), 2);
    }

    #[test]
    fn test_single_node() {
        let tree = DependencyTree::new(coord("a:a:1"));
        assert_eq!(tree.count_nodes(), 1);
        assert_eq!(tree.max_depth(), 0);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_renumber_is_pre_order() {
        let mut tree = sample();
        assert!(!tree.has_complete_numbering());
        assert_eq!(tree.renumber(1), 6);
        assert!(tree.has_complete_numbering());

        let ids: Vec<u32> = tree.pre_order().iter().map(|&id| tree.node(id).unwrap().numeric_id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);

        let c = tree.find_by_numeric_id(4).unwrap();
        assert_eq!(tree.coordinate(c).unwrap().gav(), "c:c:1");
        assert_eq!(tree.depth(tree.find_by_numeric_id(5).unwrap()), 2);
    }

    #[test]
    fn test_renumber_with_shared_counter() {
        let mut tree = sample();
        let mut counter = 10;
        let c = tree.children(tree.root())[2];
        tree.renumber_from(c, &mut counter);
        assert_eq!(counter, 12);
        assert_eq!(tree.node(c).unwrap().numeric_id(), 10);
    }

    #[test]
    fn test_create_names() {
        let mut tree = sample();
        tree.create_names();
        let names: Vec<String> = tree
            .pre_order()
            .iter()
            .map(|&id| tree.node(id).unwrap().name().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["a:a:1:0.0", "b:b:1:1.0", "b:b:2:1.1", "c:c:1:1.2", "b:b:1:2.0"]
        );
    }

    #[test]
    fn test_deep_copy_is_structural() {
        let mut tree = sample();
        tree.renumber(1);
        let copy = tree.deep_copy();
        assert_eq!(copy.count_nodes(), tree.count_nodes());
        assert_eq!(copy.to_string(), tree.to_string());
        assert!(copy.validate().is_ok());
    }

    #[test]
    fn test_pruned_copy() {
        let mut tree = sample();
        tree.renumber(1);
        // keep b:b:1 (2) and c:c:1 (4) but drop the nested b:b:1 (5)
        let keep: HashSet<u32> = [1, 2, 4].into_iter().collect();
        let pruned = tree.pruned_copy(&keep);
        assert_eq!(pruned.count_nodes(), 3);
        let gavs: Vec<String> = pruned
            .pre_order()
            .iter()
            .map(|&id| pruned.coordinate(id).unwrap().gav())
            .collect();
        assert_eq!(gavs, vec!["a:a:1", "b:b:1", "c:c:1"]);
        // the source is untouched
        assert_eq!(tree.count_nodes(), 5);
    }

    #[test]
    fn test_pruning_removes_whole_subtree() {
        let mut tree = sample();
        tree.renumber(1);
        let keep: HashSet<u32> = [1, 2, 5].into_iter().collect();
        let pruned = tree.pruned_copy(&keep);
        assert_eq!(pruned.count_nodes(), 2);
    }

    #[test]
    fn test_validate_detects_broken_parent_link() {
        let mut tree = sample();
        let b2 = tree.children(tree.root())[1];
        tree.nodes[b2.0].parent = Some(b2);
        assert!(matches!(tree.validate(), Err(ResolutionError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_detects_shared_child() {
        let mut tree = sample();
        let root = tree.root();
        let c = tree.children(root)[2];
        let b1 = tree.children(root)[0];
        tree.nodes[c.0].children.push(b1);
        assert!(tree.validate().is_err());
    }

    #[test]
    fn test_dangling_ids() {
        let mut tree = sample();
        assert!(tree.get(NodeId(99)).is_err());
        assert!(tree.add_child(NodeId(99), coord("x:x:1"), None).is_err());
        assert!(tree.children(NodeId(99)).is_empty());
    }

    #[test]
    fn test_remove_queries() {
        let mut tree = sample();
        let root = tree.root();
        tree.remove_queries(root, |q| q.artifact == "c").unwrap();
        assert_eq!(tree.node(root).unwrap().declared_queries().len(), 1);
    }
}
