//! HeapGraph - the node/edge graph of one heap snapshot
//!
//! Owns the arena, the per-graph expander set and the discovered leak roots.
//! Every walk over the graph goes through [`HeapGraph::bfs`]; full expansion,
//! reachability, dominance and incremental replay differ only in the
//! [`Traversal`] parameters and child filter they pass.

use crate::errors::{BleakError, Result};
use crate::features::disposer_info::DisposerInfo;
use crate::features::heap_graph::domain::{Edge, ExclusionPolicy, Label, Node, NodeArena, NodeId};
use crate::features::heap_graph::infrastructure::ExpanderChooser;
use crate::features::heap_graph::ports::{IntrospectionPort, PauseGuard};
use crate::shared::models::ObjectId;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// Parameters of one breadth-first walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Traversal {
    /// Nodes carrying this mark count as visited
    pub mark: u32,
    /// Rewrite each reached node's incoming edge to the BFS tree edge
    pub set_incoming: bool,
    /// Fully expand each node before following its edges
    pub expand: bool,
    /// Follow edges into the payload of weak/soft reference holders
    pub traverse_weak: bool,
}

impl Traversal {
    pub fn new(mark: u32) -> Self {
        Self {
            mark,
            set_incoming: false,
            expand: false,
            traverse_weak: false,
        }
    }

    pub fn expanding(mut self) -> Self {
        self.expand = true;
        self
    }

    pub fn setting_incoming(mut self) -> Self {
        self.set_incoming = true;
        self
    }

    pub fn through_weak(mut self, traverse_weak: bool) -> Self {
        self.traverse_weak = traverse_weak;
        self
    }
}

pub struct HeapGraph {
    pub(crate) arena: NodeArena,
    pub(crate) chooser: ExpanderChooser,
    pub(crate) roots: Vec<NodeId>,
    pub(crate) leak_roots: Vec<NodeId>,
}

impl HeapGraph {
    /// Graph rooted at the synthetic root
    pub fn new(
        backend: Arc<dyn IntrospectionPort>,
        policy: ExclusionPolicy,
        chooser: ExpanderChooser,
    ) -> Self {
        let mut arena = NodeArena::new(backend, policy);
        let roots = arena.insert_root(ObjectId::ROOT).into_iter().collect();
        Self {
            arena,
            chooser,
            roots,
            leak_roots: Vec::new(),
        }
    }

    /// Graph rooted at explicit objects instead of the synthetic root
    pub fn with_roots(
        backend: Arc<dyn IntrospectionPort>,
        policy: ExclusionPolicy,
        chooser: ExpanderChooser,
        roots: &[ObjectId],
    ) -> Result<Self> {
        let mut arena = NodeArena::new(backend, policy);
        let roots = roots
            .iter()
            .map(|&obj| arena.insert_root(obj).ok_or(BleakError::UnknownRoot(obj)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            arena,
            chooser,
            roots,
            leak_roots: Vec::new(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        self.arena.node(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.arena.edge_count()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Nodes flagged growing in this graph, in discovery order
    pub fn leak_roots(&self) -> &[NodeId] {
        &self.leak_roots
    }

    pub fn lookup(&self, obj: ObjectId) -> Option<NodeId> {
        self.arena.lookup(obj)
    }

    pub fn root_for(&self, obj: ObjectId) -> Option<NodeId> {
        self.roots
            .iter()
            .copied()
            .find(|&root| self.arena.node(root).object() == obj)
    }

    /// Fresh traversal mark
    pub fn next_mark(&mut self) -> u32 {
        self.arena.next_mark()
    }

    pub(crate) fn mark_growing(&mut self, id: NodeId) {
        let node = self.arena.node_mut(id);
        if !node.growing {
            node.growing = true;
            self.leak_roots.push(id);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Expansion
    // ═══════════════════════════════════════════════════════════════════════

    fn expander_of(&mut self, id: NodeId) -> Result<usize> {
        let node = self.arena.node(id);
        if let Some(index) = node.expander {
            return Ok(index);
        }
        let index = self.chooser.choose(node.object(), &node.info())?;
        self.arena.node_mut(id).expander = Some(index);
        Ok(index)
    }

    /// Enumerate all children of `id`; a no-op once the node is expanded
    pub fn expand_node(&mut self, id: NodeId) -> Result<()> {
        if self.arena.node(id).expanded {
            return Ok(());
        }
        let index = self.expander_of(id)?;
        // edges grown one at a time during replay are re-enumerated in full
        self.arena.clear_edges(id);
        self.chooser.get_mut(index).expand(&mut self.arena, id);
        self.arena.node_mut(id).expanded = true;
        Ok(())
    }

    /// Child of `node` analogous to `edge` (taken from another graph),
    /// growing it on demand when `node` is not fully expanded
    pub fn corresponding_child(&mut self, node: NodeId, edge: &Edge) -> Result<Option<NodeId>> {
        let index = self.expander_of(node)?;
        if let Some(child) = self
            .chooser
            .get(index)
            .get_child_for_label(&self.arena, node, &edge.label)
        {
            return Ok(Some(child));
        }
        if self.arena.node(node).expanded {
            return Ok(None);
        }
        let child = self
            .chooser
            .get_mut(index)
            .expand_corresponding_edge(&mut self.arena, node, edge);
        if child.is_none() {
            trace!(
                "no counterpart for {} under {}",
                edge.label,
                self.arena.node(node).object()
            );
        }
        Ok(child)
    }

    /// Child of `node` reached through `label`, without touching the graph
    pub fn child_for_label(&self, node: NodeId, label: &Label) -> Option<NodeId> {
        match self.arena.node(node).expander {
            Some(index) => self.chooser.get(index).get_child_for_label(&self.arena, node, label),
            None => self.arena.find_edge(node, label),
        }
    }

    /// Breadth-first walk from `starts`, returning nodes in visit order
    ///
    /// Children already carrying `traversal.mark` or rejected by `filter` are
    /// not entered.
    pub fn bfs<F>(&mut self, starts: &[NodeId], traversal: Traversal, mut filter: F) -> Result<Vec<NodeId>>
    where
        F: FnMut(NodeId, &Node) -> bool,
    {
        let mark = traversal.mark;
        let mut queue = VecDeque::new();
        for &start in starts {
            let node = self.arena.node_mut(start);
            if node.mark != mark {
                node.mark = mark;
                queue.push_back(start);
            }
        }

        let mut visited = Vec::new();
        while let Some(id) = queue.pop_front() {
            visited.push(id);
            if traversal.expand {
                self.expand_node(id)?;
            }
            for i in 0..self.arena.node(id).degree() {
                let edge = self.arena.node(id).edges()[i];
                if !traversal.traverse_weak && self.arena.is_weak_edge(&edge) {
                    continue;
                }
                let child = self.arena.node(edge.end);
                if child.mark == mark || !filter(edge.end, child) {
                    continue;
                }
                let child = self.arena.node_mut(edge.end);
                child.mark = mark;
                if traversal.set_incoming && !child.is_root {
                    child.incoming_edge = Some(edge);
                }
                queue.push_back(edge.end);
            }
        }
        Ok(visited)
    }

    fn expand_all(&mut self) -> Result<usize> {
        let started = Instant::now();
        let mark = self.next_mark();
        let roots = self.roots.clone();
        let traversal = Traversal::new(mark)
            .expanding()
            .setting_incoming()
            .through_weak(self.arena.policy().follows_weak_references());
        let visited = self.bfs(&roots, traversal, |_, _| true)?;
        debug!(
            "expanded heap graph: {} nodes, {} edges in {:?}",
            self.arena.len(),
            self.arena.edge_count(),
            started.elapsed()
        );
        Ok(visited.len())
    }

    /// Expand everything reachable from the roots with the program paused
    pub fn expand_whole_graph(&mut self) -> Result<usize> {
        let backend = self.arena.backend_handle();
        let _pause = PauseGuard::new(backend.as_ref());
        self.expand_all()
    }

    /// Like [`expand_whole_graph`](Self::expand_whole_graph), also capturing
    /// the ownership baseline the first time one is needed
    pub fn expand_whole_graph_tracking(&mut self, disposer: &mut DisposerInfo) -> Result<usize> {
        let backend = self.arena.backend_handle();
        let _pause = PauseGuard::new(backend.as_ref());
        let visited = self.expand_all()?;
        if !disposer.has_baseline() {
            disposer.capture_baseline(backend.as_ref());
        }
        Ok(visited)
    }

    /// Node of this graph at the end of the path leading to `target` in `other`
    pub fn locate(&self, other: &HeapGraph, target: NodeId) -> Option<NodeId> {
        let path = other.arena.path_to(target);
        let start = path.first().map_or(target, |edge| edge.start);
        let mut current = self.root_for(other.node(start).object())?;
        for edge in &path {
            current = self.child_for_label(current, &edge.label)?;
        }
        Some(current)
    }
}

impl std::fmt::Debug for HeapGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapGraph")
            .field("nodes", &self.arena.len())
            .field("edges", &self.arena.edge_count())
            .field("roots", &self.roots.len())
            .field("leak_roots", &self.leak_roots.len())
            .finish()
    }
}
