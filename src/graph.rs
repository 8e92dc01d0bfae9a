//! Live action graph: nodes, edges, and derived degree queries.
//!
//! An [`ActionGraph`] owns a collection of [`ActionNode`]s plus their
//! parent-to-child edges and the designated root. Graphs are built in an
//! authoring phase ([`add_node`](ActionGraph::add_node) /
//! [`connect`](ActionGraph::connect) / [`unlink`](ActionGraph::unlink)) or
//! materialized from storage by [`fold`](crate::codec::fold); during a
//! play-through the controller owns the graph exclusively and performs no
//! structural edits, which is what keeps the join state consistent.
//!
//! In-degrees are always derived by walking the edge lists, never cached on
//! nodes, so there is a single source of truth for the join barrier's
//! expected signal counts.
//!
//! # Examples
//!
//! ```rust
//! use cuegraph::graph::ActionGraph;
//! use cuegraph::node::{ActionKind, InstantEffect};
//!
//! let mut graph = ActionGraph::new();
//! let root = graph.add_node("enter", "hero", ActionKind::Instant(InstantEffect::Visible(true)));
//! let bow = graph.add_node("bow", "hero", ActionKind::Instant(InstantEffect::Pose("bow".into())));
//! graph.connect(root, bow).unwrap();
//!
//! assert_eq!(graph.root(), Some(root));
//! assert_eq!(graph.roots(), vec![root]);
//! assert_eq!(graph.terminals(), vec![bow]);
//! assert_eq!(graph.in_degree(bow), Some(1));
//! ```

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::node::{ActionKind, ActionNode};
use crate::types::{ActorId, NodeKey};

/// Errors from authoring-phase graph edits.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum GraphError {
    /// An operation referenced a key this graph never minted (or that was
    /// minted by a different graph).
    #[error("unknown node key: {key}")]
    #[diagnostic(
        code(cuegraph::graph::unknown_node),
        help("Node keys are only valid for the graph that created them.")
    )]
    UnknownNode { key: NodeKey },

    /// Self-edges are rejected: a node can never be its own predecessor.
    #[error("self-edge on node {key}")]
    #[diagnostic(code(cuegraph::graph::self_edge))]
    SelfEdge { key: NodeKey },

    /// The edge already exists; duplicate edges would inflate the derived
    /// in-degree and stall the join barrier.
    #[error("duplicate edge {parent} -> {child}")]
    #[diagnostic(code(cuegraph::graph::duplicate_edge))]
    DuplicateEdge { parent: NodeKey, child: NodeKey },

    /// [`unlink`](ActionGraph::unlink) was asked to remove an edge that does
    /// not exist.
    #[error("no edge {parent} -> {child} to remove")]
    #[diagnostic(code(cuegraph::graph::missing_edge))]
    MissingEdge { parent: NodeKey, child: NodeKey },
}

/// Owns one line's worth of action nodes and their edges.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionGraph {
    nodes: FxHashMap<NodeKey, ActionNode>,
    /// Insertion order, kept so derived queries are deterministic.
    order: Vec<NodeKey>,
    root: Option<NodeKey>,
    next_key: u32,
}

impl ActionGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node and return its freshly minted key.
    ///
    /// The first node added becomes the designated root; use
    /// [`set_root`](Self::set_root) to override.
    pub fn add_node(
        &mut self,
        label: impl Into<String>,
        target: impl Into<ActorId>,
        kind: ActionKind,
    ) -> NodeKey {
        let key = NodeKey::new(self.next_key);
        self.next_key += 1;
        self.nodes
            .insert(key, ActionNode::new(key, label.into(), target.into(), kind));
        self.order.push(key);
        if self.root.is_none() {
            self.root = Some(key);
        }
        key
    }

    /// Create the edge `parent -> child`.
    ///
    /// Rejects self-edges, duplicate edges, and unknown keys. Cycles are not
    /// detected here; they surface as a structural error when the graph is
    /// unfolded for storage.
    pub fn connect(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), GraphError> {
        if parent == child {
            return Err(GraphError::SelfEdge { key: parent });
        }
        if !self.nodes.contains_key(&child) {
            return Err(GraphError::UnknownNode { key: child });
        }
        let node = self
            .nodes
            .get_mut(&parent)
            .ok_or(GraphError::UnknownNode { key: parent })?;
        if node.children.contains(&child) {
            return Err(GraphError::DuplicateEdge { parent, child });
        }
        node.children.push(child);
        Ok(())
    }

    /// Remove the edge `parent -> child` (authoring-phase only).
    pub fn unlink(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&parent)
            .ok_or(GraphError::UnknownNode { key: parent })?;
        let before = node.children.len();
        node.children.retain(|&k| k != child);
        if node.children.len() == before {
            return Err(GraphError::MissingEdge { parent, child });
        }
        Ok(())
    }

    /// Designate `key` as the root node.
    pub fn set_root(&mut self, key: NodeKey) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&key) {
            return Err(GraphError::UnknownNode { key });
        }
        self.root = Some(key);
        Ok(())
    }

    /// The designated root, if the graph has any nodes.
    #[must_use]
    pub fn root(&self) -> Option<NodeKey> {
        self.root
    }

    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&ActionNode> {
        self.nodes.get(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> &[NodeKey] {
        &self.order
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ActionNode> {
        self.order.iter().filter_map(|k| self.nodes.get(k))
    }

    /// Derived in-degree of every node, computed in one pass over the edges.
    #[must_use]
    pub fn in_degrees(&self) -> FxHashMap<NodeKey, u32> {
        let mut degrees: FxHashMap<NodeKey, u32> =
            self.order.iter().map(|&k| (k, 0)).collect();
        for node in self.nodes.values() {
            for child in &node.children {
                if let Some(d) = degrees.get_mut(child) {
                    *d += 1;
                }
            }
        }
        degrees
    }

    /// Derived in-degree of one node, or `None` for an unknown key.
    #[must_use]
    pub fn in_degree(&self, key: NodeKey) -> Option<u32> {
        if !self.nodes.contains_key(&key) {
            return None;
        }
        let mut degree = 0;
        for node in self.nodes.values() {
            degree += node.children.iter().filter(|&&c| c == key).count() as u32;
        }
        Some(degree)
    }

    /// Nodes with zero incoming edges, in insertion order.
    ///
    /// In a well-formed graph this is exactly the designated root; extra
    /// entries are orphans that [`unfold`](crate::codec::unfold) will reject.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeKey> {
        let degrees = self.in_degrees();
        self.order
            .iter()
            .copied()
            .filter(|k| degrees.get(k).copied() == Some(0))
            .collect()
    }

    /// Nodes with zero outgoing edges, in insertion order.
    #[must_use]
    pub fn terminals(&self) -> Vec<NodeKey> {
        self.order
            .iter()
            .copied()
            .filter(|k| self.nodes.get(k).is_some_and(|n| n.children.is_empty()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::InstantEffect;

    fn pose(label: &str) -> ActionKind {
        ActionKind::Instant(InstantEffect::Pose(label.to_string()))
    }

    #[test]
    fn first_node_becomes_root() {
        let mut g = ActionGraph::new();
        let a = g.add_node("a", "hero", pose("a"));
        let b = g.add_node("b", "hero", pose("b"));
        assert_eq!(g.root(), Some(a));
        g.set_root(b).unwrap();
        assert_eq!(g.root(), Some(b));
    }

    #[test]
    fn connect_rejects_self_and_duplicate_edges() {
        let mut g = ActionGraph::new();
        let a = g.add_node("a", "hero", pose("a"));
        let b = g.add_node("b", "hero", pose("b"));
        assert_eq!(g.connect(a, a), Err(GraphError::SelfEdge { key: a }));
        g.connect(a, b).unwrap();
        assert_eq!(
            g.connect(a, b),
            Err(GraphError::DuplicateEdge { parent: a, child: b })
        );
    }

    #[test]
    fn connect_rejects_unknown_keys() {
        let mut g = ActionGraph::new();
        let a = g.add_node("a", "hero", pose("a"));
        let ghost = NodeKey::new(99);
        assert_eq!(g.connect(a, ghost), Err(GraphError::UnknownNode { key: ghost }));
        assert_eq!(g.connect(ghost, a), Err(GraphError::UnknownNode { key: ghost }));
    }

    #[test]
    fn in_degree_is_derived_from_edges() {
        let mut g = ActionGraph::new();
        let root = g.add_node("root", "hero", pose("r"));
        let a = g.add_node("a", "hero", pose("a"));
        let b = g.add_node("b", "hero", pose("b"));
        let join = g.add_node("join", "hero", pose("j"));
        g.connect(root, a).unwrap();
        g.connect(root, b).unwrap();
        g.connect(a, join).unwrap();
        g.connect(b, join).unwrap();

        assert_eq!(g.in_degree(root), Some(0));
        assert_eq!(g.in_degree(join), Some(2));
        assert_eq!(g.roots(), vec![root]);
        assert_eq!(g.terminals(), vec![join]);
    }

    #[test]
    fn unlink_removes_edges_and_updates_degrees() {
        let mut g = ActionGraph::new();
        let a = g.add_node("a", "hero", pose("a"));
        let b = g.add_node("b", "hero", pose("b"));
        g.connect(a, b).unwrap();
        g.unlink(a, b).unwrap();
        assert_eq!(g.in_degree(b), Some(0));
        assert_eq!(
            g.unlink(a, b),
            Err(GraphError::MissingEdge { parent: a, child: b })
        );
    }
}
