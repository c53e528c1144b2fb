use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::{DependencyTree, NodeId, TreeNode};

/// Error type for comparators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("{comparator} cannot compare {left} with {right}: {reason}")]
    Incomparable {
        comparator: String,
        left: String,
        right: String,
        reason: String,
    },

    #[error("Unknown policy \"{0}\" (expected nearest, farthest, newest, oldest or releases-first)")]
    Unknown(String),
}

/// Orders two nodes of the same GA.
///
/// `Less` means `a` is the worse choice, so sorting ascending puts the
/// best candidate last.
pub trait NodeComparator: Send + Sync {
    fn name(&self) -> &str;

    fn compare(&self, tree: &DependencyTree, a: NodeId, b: NodeId) -> Result<Ordering, PolicyError>;
}

fn lookup<'t>(
    tree: &'t DependencyTree,
    comparator: &dyn NodeComparator,
    a: NodeId,
    b: NodeId,
) -> Result<(&'t TreeNode, &'t TreeNode), PolicyError> {
    match (tree.node(a), tree.node(b)) {
        (Some(left), Some(right)) => Ok((left, right)),
        _ => Err(PolicyError::Incomparable {
            comparator: comparator.name().to_string(),
            left: a.to_string(),
            right: b.to_string(),
            reason: "node is not part of the tree".to_string(),
        }),
    }
}

/// Built-in preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preference {
    /// Shallower nodes win ("nearest wins")
    Nearest,
    /// Deeper nodes win
    Farthest,
    /// Higher versions win
    Newest,
    /// Lower versions win
    Oldest,
    /// Releases win over snapshots
    ReleasesFirst,
}

impl Preference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preference::Nearest => "nearest",
            Preference::Farthest => "farthest",
            Preference::Newest => "newest",
            Preference::Oldest => "oldest",
            Preference::ReleasesFirst => "releases-first",
        }
    }

    /// Parse a comma separated list such as `nearest,newest`
    pub fn parse_list(input: &str) -> Result<Vec<Preference>, PolicyError> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Preference::from_str)
            .collect()
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preference {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nearest" => Ok(Preference::Nearest),
            "farthest" => Ok(Preference::Farthest),
            "newest" => Ok(Preference::Newest),
            "oldest" => Ok(Preference::Oldest),
            "releases-first" => Ok(Preference::ReleasesFirst),
            other => Err(PolicyError::Unknown(other.to_string())),
        }
    }
}

impl NodeComparator for Preference {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn compare(&self, tree: &DependencyTree, a: NodeId, b: NodeId) -> Result<Ordering, PolicyError> {
        let (left, right) = lookup(tree, self, a, b)?;
        Ok(match self {
            Preference::Nearest => tree.depth(b).cmp(&tree.depth(a)),
            Preference::Farthest => tree.depth(a).cmp(&tree.depth(b)),
            Preference::Newest => left.coordinate().parsed_version().cmp(&right.coordinate().parsed_version()),
            Preference::Oldest => right.coordinate().parsed_version().cmp(&left.coordinate().parsed_version()),
            Preference::ReleasesFirst => left
                .coordinate()
                .parsed_version()
                .is_release()
                .cmp(&right.coordinate().parsed_version().is_release()),
        })
    }
}

/// Final tie-break: the node declared first (lower numeric id) wins
struct DeclarationOrder;

impl NodeComparator for DeclarationOrder {
    fn name(&self) -> &str {
        "declaration-order"
    }

    fn compare(&self, tree: &DependencyTree, a: NodeId, b: NodeId) -> Result<Ordering, PolicyError> {
        let (left, right) = lookup(tree, self, a, b)?;
        Ok(right.numeric_id().cmp(&left.numeric_id()))
    }
}

/// An ordered list of comparators; earlier comparators dominate later ones.
#[derive(Clone, Default)]
pub struct Policy {
    comparators: Vec<Arc<dyn NodeComparator>>,
}

impl Policy {
    /// A policy without preferences
    pub fn new() -> Self {
        Self::default()
    }

    /// Maven's classic mediation: nearest wins, then newest
    pub fn classic() -> Self {
        Self::from_preferences(&[Preference::Nearest, Preference::Newest])
    }

    pub fn from_preferences(preferences: &[Preference]) -> Self {
        preferences.iter().fold(Self::new(), |policy, p| policy.prefer(*p))
    }

    pub fn prefer(self, preference: Preference) -> Self {
        self.with_comparator(Arc::new(preference))
    }

    pub fn with_comparator(mut self, comparator: Arc<dyn NodeComparator>) -> Self {
        self.comparators.push(comparator);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.comparators.is_empty()
    }

    pub fn len(&self) -> usize {
        self.comparators.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.comparators.iter().map(|c| c.name().to_string()).collect()
    }

    /// Rank the members of one GA bucket, best first, keeping only the
    /// first occurrence of each GAV.
    ///
    /// Each comparator only reorders runs that every earlier comparator
    /// considers equal. Declaration order breaks the remaining ties.
    pub fn rank(&self, tree: &DependencyTree, bucket: &[NodeId]) -> Result<Vec<NodeId>, PolicyError> {
        let mut order = bucket.to_vec();
        let n = order.len();

        if n > 1 {
            // run_start[i]: order[i] differs from order[i - 1] under an earlier comparator
            let mut run_start = vec![false; n];
            run_start[0] = true;

            let declaration = DeclarationOrder;
            let mut comparators: Vec<&dyn NodeComparator> =
                self.comparators.iter().map(|c| c.as_ref() as &dyn NodeComparator).collect();
            comparators.push(&declaration);

            for comparator in comparators {
                let mut start = 0;
                while start < n {
                    let mut end = start + 1;
                    while end < n && !run_start[end] {
                        end += 1;
                    }
                    if end - start > 1 {
                        insertion_sort(&mut order[start..end], |a, b| comparator.compare(tree, a, b))?;
                        for i in start + 1..end {
                            if comparator.compare(tree, order[i - 1], order[i])? != Ordering::Equal {
                                run_start[i] = true;
                            }
                        }
                    }
                    start = end;
                }
            }

            order.reverse();
        }

        let mut ranked: Vec<NodeId> = Vec::with_capacity(n);
        for id in order {
            let Some(coordinate) = tree.coordinate(id) else {
                continue;
            };
            let duplicate = ranked
                .iter()
                .filter_map(|&r| tree.coordinate(r))
                .any(|c| c.same_gav(coordinate));
            if !duplicate {
                ranked.push(id);
            }
        }
        Ok(ranked)
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy").field("comparators", &self.names()).finish()
    }
}

/// Stable ascending sort with a fallible comparison
fn insertion_sort<F>(items: &mut [NodeId], mut compare: F) -> Result<(), PolicyError>
where
    F: FnMut(NodeId, NodeId) -> Result<Ordering, PolicyError>,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(items[j - 1], items[j])? == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Coordinate;

    fn coord(s: &str) -> Coordinate {
        Coordinate::parse(s).unwrap()
    }

    /// root -> x:1, y:1 -> x:3, x:2, x:3-SNAPSHOT
    fn tree() -> (DependencyTree, Vec<NodeId>) {
        let mut tree = DependencyTree::new(coord("r:r:1"));
        let root = tree.root();
        let x1 = tree.add_child(root, coord("x:x:1"), None).unwrap();
        let y = tree.add_child(root, coord("y:y:1"), None).unwrap();
        let x3 = tree.add_child(y, coord("x:x:3"), None).unwrap();
        let x2 = tree.add_child(root, coord("x:x:2"), None).unwrap();
        let snapshot = tree.add_child(y, coord("x:x:3-SNAPSHOT"), None).unwrap();
        tree.renumber(1);
        (tree, vec![x1, x3, x2, snapshot])
    }

    fn versions(tree: &DependencyTree, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|&id| tree.coordinate(id).unwrap().version.clone()).collect()
    }

    #[test]
    fn test_newest() {
        let (tree, bucket) = tree();
        let ranked = Policy::new().prefer(Preference::Newest).rank(&tree, &bucket).unwrap();
        assert_eq!(versions(&tree, &ranked), vec!["3", "3-SNAPSHOT", "2", "1"]);
    }

    #[test]
    fn test_nearest_then_newest() {
        let (tree, bucket) = tree();
        let ranked = Policy::classic().rank(&tree, &bucket).unwrap();
        assert_eq!(versions(&tree, &ranked), vec!["2", "1", "3", "3-SNAPSHOT"]);
    }

    #[test]
    fn test_nearest_then_declaration_order() {
        let (tree, bucket) = tree();
        let ranked = Policy::new().prefer(Preference::Nearest).rank(&tree, &bucket).unwrap();
        // x:1 is declared before x:2, x:3 before x:3-SNAPSHOT
        assert_eq!(versions(&tree, &ranked), vec!["1", "2", "3", "3-SNAPSHOT"]);
    }

    #[test]
    fn test_later_comparator_only_refines_ties() {
        let (tree, bucket) = tree();
        let policy = Policy::from_preferences(&[Preference::ReleasesFirst, Preference::Farthest, Preference::Oldest]);
        let ranked = policy.rank(&tree, &bucket).unwrap();
        assert_eq!(versions(&tree, &ranked), vec!["3", "1", "2", "3-SNAPSHOT"]);

        // every adjacent pair the first comparator distinguishes keeps its order
        for pair in ranked.windows(2) {
            let first = Preference::ReleasesFirst.compare(&tree, pair[0], pair[1]).unwrap();
            assert_ne!(first, Ordering::Less);
        }
    }

    #[test]
    fn test_duplicate_gavs_keep_best_occurrence() {
        let mut tree = DependencyTree::new(coord("r:r:1"));
        let root = tree.root();
        let c = tree.add_child(root, coord("c:c:1"), None).unwrap();
        let deep = tree.add_child(c, coord("b:b:1"), None).unwrap();
        let near = tree.add_child(root, coord("b:b:1.0"), None).unwrap();
        let other = tree.add_child(root, coord("b:b:2"), None).unwrap();
        tree.renumber(1);

        let ranked = Policy::new()
            .prefer(Preference::Nearest)
            .prefer(Preference::Oldest)
            .rank(&tree, &[deep, near, other])
            .unwrap();
        assert_eq!(ranked, vec![near, other]);
    }

    #[test]
    fn test_custom_comparator_error_propagates() {
        struct Broken;
        impl NodeComparator for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn compare(&self, _: &DependencyTree, a: NodeId, b: NodeId) -> Result<Ordering, PolicyError> {
                Err(PolicyError::Incomparable {
                    comparator: "broken".into(),
                    left: a.to_string(),
                    right: b.to_string(),
                    reason: "always fails".into(),
                })
            }
        }

        let (tree, bucket) = tree();
        let result = Policy::new().with_comparator(Arc::new(Broken)).rank(&tree, &bucket);
        assert!(matches!(result, Err(PolicyError::Incomparable { .. })));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            Preference::parse_list("nearest, newest").unwrap(),
            vec![Preference::Nearest, Preference::Newest]
        );
        assert_eq!(Preference::parse_list("").unwrap(), vec![]);
        assert!(matches!(Preference::parse_list("nearest,latest"), Err(PolicyError::Unknown(_))));
        assert_eq!(serde_json::to_string(&Preference::ReleasesFirst).unwrap(), "\"releases-first\"");
    }

    #[test]
    fn test_classic_names() {
        assert_eq!(Policy::classic().names(), vec!["nearest", "newest"]);
        assert!(Policy::new().is_empty());
    }
}
