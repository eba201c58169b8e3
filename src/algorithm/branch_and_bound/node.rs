//! # The search tree
//!
//! Branch and bound nodes live in an arena owned by one `SearchTree`; relationships are plain
//! indices into it. Solvers append nodes and advance their statuses; the finished tree is
//! attached to the result for visualization and accounting.
use enum_map::{Enum, EnumMap};

use crate::data::elements::Relation;
use crate::data::solution::Solution;

/// Status of a node in the search tree.
///
/// Exactly one status holds at any moment; a node leaves `Active` at most once.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeStatus {
    /// Not yet evaluated, or evaluated and awaiting branching.
    Active,
    /// The relaxation bound cannot beat the incumbent.
    FathomedByBound,
    /// The relaxation has no feasible point.
    FathomedByInfeasibility,
    /// The relaxation solution is integral; no branching needed.
    FathomedByIntegrality,
    /// Branched; its children carry the search on.
    Completed,
}

/// Why a node was fathomed.
#[derive(Clone, Copy, Debug, Enum, Eq, PartialEq)]
pub enum FathomReason {
    /// Bound no better than the incumbent.
    Bound,
    /// Infeasible relaxation.
    Infeasibility,
    /// Integral relaxation solution.
    Integrality,
}

impl FathomReason {
    fn status(self) -> NodeStatus {
        match self {
            FathomReason::Bound => NodeStatus::FathomedByBound,
            FathomReason::Infeasibility => NodeStatus::FathomedByInfeasibility,
            FathomReason::Integrality => NodeStatus::FathomedByIntegrality,
        }
    }
}

/// Which side of the fractional value a branch explores.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BranchDirection {
    /// The variable is bounded above: `x <= bound`.
    Down,
    /// The variable is bounded below: `x >= bound`.
    Up,
}

impl BranchDirection {
    /// The relation of the branching constraint.
    #[must_use]
    pub fn relation(self) -> Relation {
        match self {
            BranchDirection::Down => Relation::Less,
            BranchDirection::Up => Relation::Greater,
        }
    }
}

/// The constraint a child node adds to its parent's problem.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchDecision {
    /// Variable branched on.
    pub variable: String,
    /// Side of the split.
    pub direction: BranchDirection,
    /// Right-hand side of the branching constraint.
    pub bound: f64,
}

/// One node of the search tree.
#[derive(Clone, Debug)]
pub struct BranchNode {
    /// Position in the arena.
    pub index: usize,
    /// Parent node, `None` for the root.
    pub parent: Option<usize>,
    /// Distance from the root.
    pub depth: usize,
    /// The constraint this node adds, `None` for the root.
    pub decision: Option<BranchDecision>,
    /// Current status.
    pub status: NodeStatus,
    /// Objective value of this node's relaxation, in the model's direction.
    pub bound: Option<f64>,
    /// The relaxation solution, kept for branching variable inspection.
    pub relaxation: Option<Solution>,
    /// Children, in creation order.
    pub children: Vec<usize>,
}

/// Aggregate counts over a finished or ongoing search.
#[derive(Clone, Debug)]
pub struct TreeStatistics {
    /// Total number of nodes created.
    pub nr_nodes: usize,
    /// Nodes still active.
    pub nr_active: usize,
    /// Nodes that were branched on.
    pub nr_completed: usize,
    /// Deepest node created.
    pub max_depth: usize,
    /// Fathomed nodes, by reason.
    pub fathomed: EnumMap<FathomReason, usize>,
}

/// Arena of all nodes a branch and bound run creates.
#[derive(Clone, Debug, Default)]
pub struct SearchTree {
    nodes: Vec<BranchNode>,
    fathom_counts: EnumMap<FathomReason, usize>,
}

impl SearchTree {
    /// An empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the root node. The tree must be empty.
    pub(crate) fn add_root(&mut self) -> usize {
        debug_assert!(self.nodes.is_empty());
        self.push(None, 0, None)
    }

    /// Add a child carrying the given branching decision.
    pub(crate) fn add_child(&mut self, parent: usize, decision: BranchDecision) -> usize {
        let depth = self.nodes[parent].depth + 1;
        let index = self.push(Some(parent), depth, Some(decision));
        self.nodes[parent].children.push(index);
        index
    }

    fn push(
        &mut self,
        parent: Option<usize>,
        depth: usize,
        decision: Option<BranchDecision>,
    ) -> usize {
        let index = self.nodes.len();
        self.nodes.push(BranchNode {
            index,
            parent,
            depth,
            decision,
            status: NodeStatus::Active,
            bound: None,
            relaxation: None,
            children: Vec::new(),
        });
        index
    }

    /// The node at `index`.
    #[must_use]
    pub fn node(&self, index: usize) -> &BranchNode {
        &self.nodes[index]
    }

    /// All nodes, in creation order.
    #[must_use]
    pub fn nodes(&self) -> &[BranchNode] {
        &self.nodes
    }

    /// Number of nodes created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Record the relaxation outcome of a node.
    pub(crate) fn set_relaxation(&mut self, index: usize, bound: f64, solution: Solution) {
        let node = &mut self.nodes[index];
        node.bound = Some(bound);
        node.relaxation = Some(solution);
    }

    /// Fathom a node; it will not be branched on.
    pub(crate) fn fathom(&mut self, index: usize, reason: FathomReason) {
        debug_assert_eq!(self.nodes[index].status, NodeStatus::Active);
        self.nodes[index].status = reason.status();
        self.fathom_counts[reason] += 1;
    }

    /// Mark a node as branched on.
    pub(crate) fn complete(&mut self, index: usize) {
        debug_assert_eq!(self.nodes[index].status, NodeStatus::Active);
        self.nodes[index].status = NodeStatus::Completed;
    }

    /// Counts over the current state of the tree.
    #[must_use]
    pub fn statistics(&self) -> TreeStatistics {
        TreeStatistics {
            nr_nodes: self.nodes.len(),
            nr_active: self
                .nodes
                .iter()
                .filter(|node| node.status == NodeStatus::Active)
                .count(),
            nr_completed: self
                .nodes
                .iter()
                .filter(|node| node.status == NodeStatus::Completed)
                .count(),
            max_depth: self.nodes.iter().map(|node| node.depth).max().unwrap_or(0),
            fathomed: self.fathom_counts.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::algorithm::branch_and_bound::node::{
        BranchDecision, BranchDirection, FathomReason, NodeStatus, SearchTree,
    };

    fn decision(direction: BranchDirection, bound: f64) -> BranchDecision {
        BranchDecision {
            variable: "x".to_string(),
            direction,
            bound,
        }
    }

    #[test]
    fn arena_indices_and_depths() {
        let mut tree = SearchTree::new();
        let root = tree.add_root();
        let down = tree.add_child(root, decision(BranchDirection::Down, 2_f64));
        let up = tree.add_child(root, decision(BranchDirection::Up, 3_f64));
        let grandchild = tree.add_child(up, decision(BranchDirection::Down, 0_f64));

        assert_eq!((root, down, up, grandchild), (0, 1, 2, 3));
        assert_eq!(tree.node(root).children, vec![down, up]);
        assert_eq!(tree.node(grandchild).parent, Some(up));
        assert_eq!(tree.node(grandchild).depth, 2);
        assert!(tree
            .nodes()
            .iter()
            .all(|node| node.status == NodeStatus::Active));
    }

    #[test]
    fn statistics_track_fathoming() {
        let mut tree = SearchTree::new();
        let root = tree.add_root();
        let left = tree.add_child(root, decision(BranchDirection::Down, 1_f64));
        let right = tree.add_child(root, decision(BranchDirection::Up, 2_f64));
        tree.complete(root);
        tree.fathom(left, FathomReason::Infeasibility);
        tree.fathom(right, FathomReason::Integrality);

        let statistics = tree.statistics();
        assert_eq!(statistics.nr_nodes, 3);
        assert_eq!(statistics.nr_active, 0);
        assert_eq!(statistics.nr_completed, 1);
        assert_eq!(statistics.max_depth, 1);
        assert_eq!(statistics.fathomed[FathomReason::Infeasibility], 1);
        assert_eq!(statistics.fathomed[FathomReason::Integrality], 1);
        assert_eq!(statistics.fathomed[FathomReason::Bound], 0);
        assert_eq!(tree.node(right).status, NodeStatus::FathomedByIntegrality);
    }
}
