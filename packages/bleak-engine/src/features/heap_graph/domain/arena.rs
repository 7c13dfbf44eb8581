//! Node Arena - identity-keyed node table of one snapshot
//!
//! Nodes are stored in a vector and addressed by [`NodeId`]. A side map from
//! [`ObjectId`] to slot guarantees that each live object gets exactly one node
//! per graph. The map is keyed by identity handle, never by value, so two
//! equal-but-distinct objects always get two nodes.

use super::exclusion::ExclusionPolicy;
use super::label::Label;
use super::node::{Edge, Node, NodeId};
use super::signature::Signature;
use crate::features::heap_graph::ports::IntrospectionPort;
use crate::shared::models::{FieldDescriptor, FieldId, FieldValue, ObjectId, ObjectInfo, ObjectKind};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::trace;

pub struct NodeArena {
    backend: Arc<dyn IntrospectionPort>,
    policy: ExclusionPolicy,
    nodes: Vec<Node>,
    index: FxHashMap<ObjectId, NodeId>,
    /// Field registry: label identity → descriptor (for signatures and weak checks)
    fields: FxHashMap<FieldId, FieldDescriptor>,
    mark_epoch: u32,
    edge_count: usize,
}

impl NodeArena {
    pub fn new(backend: Arc<dyn IntrospectionPort>, policy: ExclusionPolicy) -> Self {
        Self {
            backend,
            policy,
            nodes: Vec::new(),
            index: FxHashMap::default(),
            fields: FxHashMap::default(),
            mark_epoch: 0,
            edge_count: 0,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn backend(&self) -> &dyn IntrospectionPort {
        self.backend.as_ref()
    }

    pub(crate) fn backend_handle(&self) -> Arc<dyn IntrospectionPort> {
        Arc::clone(&self.backend)
    }

    #[inline]
    pub fn policy(&self) -> &ExclusionPolicy {
        &self.policy
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Node at `id`; ids are only ever handed out by this arena
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Node wrapping `obj`, if one was created
    #[inline]
    pub fn lookup(&self, obj: ObjectId) -> Option<NodeId> {
        self.index.get(&obj).copied()
    }

    #[inline]
    pub fn field(&self, id: FieldId) -> Option<&FieldDescriptor> {
        self.fields.get(&id)
    }

    /// Shape of `obj`, covering the synthetic objects the backend never sees
    pub fn info_of(&self, obj: ObjectId) -> Option<ObjectInfo> {
        obj.synthetic_info().or_else(|| self.backend.object_info(obj))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Construction
    // ═══════════════════════════════════════════════════════════════════════

    /// Create (or reuse) the node for `obj` and flag it as a root
    pub(crate) fn insert_root(&mut self, obj: ObjectId) -> Option<NodeId> {
        let info = self.info_of(obj)?;
        let (id, _) = self.get_or_insert(obj, &info);
        let node = self.node_mut(id);
        node.is_root = true;
        node.incoming_edge = Some(Edge::loopback(id));
        Some(id)
    }

    fn get_or_insert(&mut self, obj: ObjectId, info: &ObjectInfo) -> (NodeId, bool) {
        if let Some(&id) = self.index.get(&obj) {
            return (id, false);
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(obj, info));
        self.index.insert(obj, id);
        (id, true)
    }

    /// Add `start -> child` under `label`, unless the child is excluded or gone
    pub fn add_edge(&mut self, start: NodeId, child: ObjectId, label: Label) -> Option<NodeId> {
        self.attach(start, child, None, label)
    }

    /// Add the edge for one enumerated field value
    pub fn add_field_edge(&mut self, start: NodeId, value: &FieldValue) -> Option<NodeId> {
        let child = value.value?;
        let field = &value.field;
        self.fields
            .entry(field.id)
            .or_insert_with(|| field.clone());
        self.attach(start, child, Some(field), Label::Field(field.id))
    }

    /// Add the identity-labelled edge for one element
    pub fn add_element_edge(&mut self, start: NodeId, element: ObjectId) -> Option<NodeId> {
        self.attach(start, element, None, Label::ObjectIdentity(element))
    }

    fn attach(
        &mut self,
        start: NodeId,
        child: ObjectId,
        field: Option<&FieldDescriptor>,
        label: Label,
    ) -> Option<NodeId> {
        let Some(info) = self.info_of(child) else {
            trace!("skipping vanished child {} of {}", child, self.node(start).object);
            return None;
        };
        if self.policy.excludes(field, &info) {
            return None;
        }

        let (end, _) = self.get_or_insert(child, &info);
        let edge = Edge::new(start, end, label);
        self.node_mut(start).edges.push(edge);
        self.edge_count += 1;

        let child_node = self.node_mut(end);
        if child_node.incoming_edge.is_none() {
            child_node.incoming_edge = Some(edge);
        }
        Some(end)
    }

    /// Linear lookup of the child reached through `label`
    pub fn find_edge(&self, start: NodeId, label: &Label) -> Option<NodeId> {
        self.node(start)
            .edges
            .iter()
            .find(|edge| edge.label == *label)
            .map(|edge| edge.end)
    }

    /// Drop partial edges before a full expansion re-enumerates them
    pub(crate) fn clear_edges(&mut self, id: NodeId) {
        let removed = self.node(id).edges.len();
        self.node_mut(id).edges.clear();
        self.edge_count -= removed;
    }

    /// Fresh mark value; nodes carrying it are "visited" in the current traversal
    pub(crate) fn next_mark(&mut self) -> u32 {
        self.mark_epoch = self.mark_epoch.wrapping_add(1);
        if self.mark_epoch == 0 {
            for node in &mut self.nodes {
                node.mark = 0;
            }
            self.mark_epoch = 1;
        }
        self.mark_epoch
    }

    /// Edge into the payload of a weak/soft reference holder
    pub fn is_weak_edge(&self, edge: &Edge) -> bool {
        match edge.label {
            Label::Field(id) => {
                self.node(edge.start).kind == ObjectKind::WeakReference
                    && self.fields.get(&id).map_or(false, |f| f.is_referent)
            }
            _ => false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Paths and signatures
    // ═══════════════════════════════════════════════════════════════════════

    /// Edges from a root to `id`, following incoming edges back
    pub fn path_to(&self, id: NodeId) -> Vec<Edge> {
        let mut path = Vec::new();
        let mut current = id;
        while !self.node(current).is_root {
            let Some(edge) = self.node(current).incoming_edge else {
                break;
            };
            path.push(edge);
            current = edge.start;
            if path.len() > self.nodes.len() {
                // incoming edges formed a cycle; not reachable from a root
                break;
            }
        }
        path.reverse();
        path
    }

    /// `StartType#what` rendering of one edge
    pub fn describe_edge(&self, edge: &Edge) -> String {
        let start = self.node(edge.start);
        match edge.label {
            Label::RootLoopback => format!("{}#<loopback>", start.type_name),
            Label::Field(id) => {
                let name = self.fields.get(&id).map_or("?", |f| &*f.name);
                format!("{}#{}", start.type_name, name)
            }
            Label::ObjectIdentity(_) => match start.kind {
                ObjectKind::ReferenceArray | ObjectKind::Collection => {
                    format!("{}#[]", start.type_name)
                }
                _ => format!("{}#{}", start.type_name, self.node(edge.end).type_name),
            },
        }
    }

    pub fn signature_of(&self, id: NodeId) -> Signature {
        let elements = self
            .path_to(id)
            .iter()
            .map(|edge| self.describe_edge(edge))
            .collect();
        Signature::new(elements, self.node(id).type_name.to_string())
    }
}
