//! Reachability and dominance queries over an expanded graph
//!
//! Both are two parameterizations of [`HeapGraph::bfs`]. Weak edges are never
//! followed: memory held only weakly is not retained.

use super::heap_graph::{HeapGraph, Traversal};
use crate::errors::Result;
use crate::features::heap_graph::domain::NodeId;
use rustc_hash::FxHashSet;

impl HeapGraph {
    /// Every node reachable from `starts`, the starts included
    pub fn reachable_from(&mut self, starts: &[NodeId]) -> Result<Vec<NodeId>> {
        let mark = self.next_mark();
        self.bfs(starts, Traversal::new(mark), |_, _| true)
    }

    /// Nodes only reachable from the roots through `targets`, the targets included
    ///
    /// One walk from the roots that refuses to enter any target marks
    /// everything reachable without them; a second walk from the targets
    /// with the same mark collects the rest.
    pub fn dominated_by(&mut self, targets: &[NodeId]) -> Result<Vec<NodeId>> {
        let excluded: FxHashSet<NodeId> = targets.iter().copied().collect();
        let mark = self.next_mark();
        let starts: Vec<NodeId> = self
            .roots
            .iter()
            .copied()
            .filter(|root| !excluded.contains(root))
            .collect();
        self.bfs(&starts, Traversal::new(mark), |id, _| !excluded.contains(&id))?;
        self.bfs(targets, Traversal::new(mark), |_, _| true)
    }

    /// Approximate bytes freed if `targets` became unreachable
    pub fn retained_size(&mut self, targets: &[NodeId]) -> Result<u64> {
        let dominated = self.dominated_by(targets)?;
        let backend = self.arena.backend();
        Ok(dominated
            .iter()
            .map(|&id| backend.approximate_shallow_size(self.arena.node(id).object()))
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::heap_graph::domain::ExclusionPolicy;
    use crate::features::heap_graph::infrastructure::{ExpanderChooser, InMemoryHeap};
    use crate::shared::models::ObjectId;
    use std::sync::Arc;

    /// Holder -> {a, b}; a -> private; a -> shared; b -> shared
    fn diamond() -> (Arc<InMemoryHeap>, HeapGraph, [ObjectId; 4]) {
        let heap = Arc::new(InMemoryHeap::new());
        let holder = heap.new_object("Holder");
        let a = heap.new_object("A");
        let b = heap.new_object("B");
        let private = heap.new_object("Private");
        let shared = heap.new_object("Shared");
        heap.set_field(holder, "a", Some(a));
        heap.set_field(holder, "b", Some(b));
        heap.set_field(a, "private", Some(private));
        heap.set_field(a, "shared", Some(shared));
        heap.set_field(b, "shared", Some(shared));

        let mut graph = HeapGraph::with_roots(
            heap.clone(),
            ExclusionPolicy::new(false),
            ExpanderChooser::new(64, &[]),
            &[holder],
        )
        .unwrap();
        graph.expand_whole_graph().unwrap();
        (heap, graph, [a, b, private, shared])
    }

    #[test]
    fn test_reachable_from() {
        let (_, mut graph, [a, ..]) = diamond();
        let start = graph.lookup(a).unwrap();
        assert_eq!(graph.reachable_from(&[start]).unwrap().len(), 3);
    }

    #[test]
    fn test_dominated_excludes_shared_children() {
        let (_, mut graph, [a, _, private, shared]) = diamond();
        let a = graph.lookup(a).unwrap();
        let dominated = graph.dominated_by(&[a]).unwrap();

        assert!(dominated.contains(&a));
        assert!(dominated.contains(&graph.lookup(private).unwrap()));
        assert!(!dominated.contains(&graph.lookup(shared).unwrap()));
    }

    #[test]
    fn test_retained_size_sums_dominated_nodes() {
        let (heap, mut graph, [a, b, private, _]) = diamond();
        heap.set_shallow_size(a, 100);
        heap.set_shallow_size(private, 20);
        heap.set_shallow_size(b, 7);

        let a = graph.lookup(a).unwrap();
        assert_eq!(graph.retained_size(&[a]).unwrap(), 120);
        assert_eq!(graph.retained_size(&[]).unwrap(), 0);
    }
}
