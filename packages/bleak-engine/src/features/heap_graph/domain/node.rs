//! Graph nodes and edges
//!
//! Nodes live in a [`NodeArena`](super::NodeArena) and refer to each other by
//! [`NodeId`] slot, so the back-references (`incoming_edge`) never form
//! ownership cycles.

use super::label::Label;
use crate::shared::models::{ObjectId, ObjectInfo, ObjectKind};
use serde::Serialize;
use std::sync::Arc;

/// Arena slot of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Directed arc `start -> end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub start: NodeId,
    pub end: NodeId,
    pub label: Label,
}

impl Edge {
    pub fn new(start: NodeId, end: NodeId, label: Label) -> Self {
        Self { start, end, label }
    }

    /// Self edge given to roots so every node has an incoming edge
    pub fn loopback(root: NodeId) -> Self {
        Self::new(root, root, Label::RootLoopback)
    }
}

/// Wrapper for exactly one live object of one snapshot
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) object: ObjectId,
    pub(crate) type_name: Arc<str>,
    pub(crate) kind: ObjectKind,
    pub(crate) is_root: bool,
    pub(crate) edges: Vec<Edge>,
    pub(crate) incoming_edge: Option<Edge>,
    /// Traversal scratch value, compared against the current mark epoch
    pub(crate) mark: u32,
    pub(crate) growing: bool,
    /// Children fully enumerated (as opposed to grown edge by edge)
    pub(crate) expanded: bool,
    /// Cached index of the expander that claimed this node
    pub(crate) expander: Option<usize>,
}

impl Node {
    pub(crate) fn new(object: ObjectId, info: &ObjectInfo) -> Self {
        Self {
            object,
            type_name: Arc::clone(&info.type_name),
            kind: info.kind,
            is_root: false,
            edges: Vec::new(),
            incoming_edge: None,
            mark: 0,
            growing: false,
            expanded: false,
            expander: None,
        }
    }

    #[inline]
    pub fn object(&self) -> ObjectId {
        self.object
    }

    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[inline]
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Out-degree; its increase across snapshots is the leak signal
    #[inline]
    pub fn degree(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn incoming_edge(&self) -> Option<&Edge> {
        self.incoming_edge.as_ref()
    }

    #[inline]
    pub fn is_growing(&self) -> bool {
        self.growing
    }

    #[inline]
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Shape as seen by expanders
    pub fn info(&self) -> ObjectInfo {
        ObjectInfo::new(Arc::clone(&self.type_name), self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_edge() {
        let edge = Edge::loopback(NodeId(0));
        assert_eq!(edge.start, edge.end);
        assert_eq!(edge.label, Label::RootLoopback);
    }

    #[test]
    fn test_new_node_defaults() {
        let info = ObjectInfo::new("Entry[]", ObjectKind::ReferenceArray);
        let node = Node::new(ObjectId(9), &info);
        assert_eq!(node.degree(), 0);
        assert!(!node.is_growing());
        assert!(!node.is_expanded());
        assert!(node.incoming_edge().is_none());
        assert_eq!(node.info(), info);
    }
}
