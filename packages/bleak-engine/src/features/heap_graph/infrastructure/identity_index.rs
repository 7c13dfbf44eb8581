//! Label→node index for identity-labelled children
//!
//! Large arrays and class loaders would otherwise need an O(degree) scan per
//! lookup. Nodes with at least `threshold` children get a hash index; smaller
//! ones fall back to scanning their edges. Owned by one expander of one graph.

use crate::features::heap_graph::domain::{Label, NodeArena, NodeId};
use crate::shared::models::ObjectId;
use rustc_hash::{FxHashMap, FxHashSet};

#[derive(Debug, Default)]
pub struct IdentityIndex {
    threshold: usize,
    children: FxHashMap<NodeId, FxHashMap<ObjectId, NodeId>>,
    /// Membership of live objects not (yet) fully expanded
    live_members: FxHashMap<NodeId, FxHashSet<ObjectId>>,
}

impl IdentityIndex {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            ..Self::default()
        }
    }

    pub fn is_indexed(&self, node: NodeId) -> bool {
        self.children.contains_key(&node)
    }

    /// Drop everything known about `node` ahead of a full expansion
    pub fn forget(&mut self, node: NodeId) {
        self.children.remove(&node);
        self.live_members.remove(&node);
    }

    /// Index the identity edges `node` got from a full expansion
    pub fn record_expansion(&mut self, arena: &NodeArena, node: NodeId) {
        let edges = arena.node(node).edges();
        if edges.len() < self.threshold {
            return;
        }
        let map = edges
            .iter()
            .filter_map(|edge| match edge.label {
                Label::ObjectIdentity(obj) => Some((obj, edge.end)),
                _ => None,
            })
            .collect();
        self.children.insert(node, map);
    }

    /// Keep an existing index in step with an edge added one at a time
    pub fn record_child(&mut self, node: NodeId, obj: ObjectId, child: NodeId) {
        if let Some(map) = self.children.get_mut(&node) {
            map.entry(obj).or_insert(child);
        }
    }

    pub fn lookup(&self, arena: &NodeArena, node: NodeId, obj: ObjectId) -> Option<NodeId> {
        match self.children.get(&node) {
            Some(map) => map.get(&obj).copied(),
            None => arena.find_edge(node, &Label::ObjectIdentity(obj)),
        }
    }

    /// Whether the live object behind `node` currently holds `obj`
    pub fn contains_live<F>(&mut self, node: NodeId, obj: ObjectId, load: F) -> bool
    where
        F: FnOnce() -> Vec<ObjectId>,
    {
        if let Some(members) = self.live_members.get(&node) {
            return members.contains(&obj);
        }
        let members = load();
        let found = members.contains(&obj);
        if members.len() >= self.threshold {
            self.live_members.insert(node, members.into_iter().collect());
        }
        found
    }
}
