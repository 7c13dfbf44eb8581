//! Growth propagation between consecutive snapshots
//!
//! Growing status flows from a previous graph into this one along matched
//! correspondences only: same field, or same object by identity. A node keeps
//! (or gains) the flag when its counterpart was already suspect and its
//! out-degree strictly increased. The previous graph is only read.

use super::heap_graph::HeapGraph;
use crate::errors::Result;
use crate::features::heap_graph::domain::NodeId;
use crate::features::heap_graph::ports::PauseGuard;
use std::collections::VecDeque;
use tracing::{debug, trace};

impl HeapGraph {
    /// Paired walk over `previous` and this fully expanded graph
    ///
    /// With `seed_arrays`, every reference array of `previous` counts as
    /// suspect, which is how the first propagation seeds the whittling.
    /// Returns the number of leak roots of this graph.
    pub fn propagate_growing(&mut self, previous: &HeapGraph, seed_arrays: bool) -> usize {
        let mark = self.next_mark();
        let mut queue: VecDeque<(NodeId, NodeId)> = VecDeque::new();
        for &new_root in &self.roots {
            let object = self.arena.node(new_root).object();
            if let Some(old_root) = previous.root_for(object) {
                queue.push_back((old_root, new_root));
            }
        }
        for &(_, new_root) in &queue {
            self.arena.node_mut(new_root).mark = mark;
        }

        let mut pairs = 0usize;
        while let Some((old, new)) = queue.pop_front() {
            pairs += 1;
            let old_node = previous.node(old);
            let suspect = old_node.is_growing()
                || (seed_arrays && old_node.kind().is_reference_array());
            if suspect && old_node.degree() < self.arena.node(new).degree() {
                self.mark_growing(new);
            }

            for edge in old_node.edges() {
                let Some(child) = self.child_for_label(new, &edge.label) else {
                    continue;
                };
                let child_node = self.arena.node_mut(child);
                if child_node.mark == mark {
                    continue;
                }
                child_node.mark = mark;
                queue.push_back((edge.end, child));
            }
        }

        debug!(
            "propagated growth over {} matched pairs: {} leak roots (was {})",
            pairs,
            self.leak_roots.len(),
            previous.leak_roots.len()
        );
        self.leak_roots.len()
    }

    /// Replay only the paths to `previous`'s leak roots in this sparse graph
    ///
    /// Each path is grown edge by edge and only its tip is fully expanded, so
    /// nodes that were never flagged in `previous` cannot be discovered here.
    /// Runs with the program paused since replay touches live objects.
    pub fn propagate_growing_incremental(&mut self, previous: &HeapGraph) -> Result<usize> {
        let backend = self.arena.backend_handle();
        let _pause = PauseGuard::new(backend.as_ref());

        for &old_leak in &previous.leak_roots {
            let path = previous.arena.path_to(old_leak);
            let start = path.first().map_or(old_leak, |edge| edge.start);
            let Some(mut current) = self.root_for(previous.node(start).object()) else {
                continue;
            };

            let mut replayed = true;
            for edge in &path {
                match self.corresponding_child(current, edge)? {
                    Some(child) => current = child,
                    None => {
                        replayed = false;
                        break;
                    }
                }
            }
            if !replayed {
                trace!(
                    "leak root {} has no counterpart in the new snapshot",
                    previous.node(old_leak).object()
                );
                continue;
            }

            self.expand_node(current)?;
            if previous.node(old_leak).degree() < self.arena.node(current).degree() {
                self.mark_growing(current);
            }
        }

        debug!(
            "incremental propagation: {} of {} leak roots still growing ({} nodes materialized)",
            self.leak_roots.len(),
            previous.leak_roots.len(),
            self.arena.len()
        );
        Ok(self.leak_roots.len())
    }
}

#[cfg(test)]
mod tests {
    use crate::features::heap_graph::application::HeapGraph;
    use crate::features::heap_graph::domain::ExclusionPolicy;
    use crate::features::heap_graph::infrastructure::{ExpanderChooser, InMemoryHeap};
    use crate::shared::models::ObjectId;
    use std::sync::Arc;

    fn snapshot(heap: &Arc<InMemoryHeap>) -> HeapGraph {
        let mut graph = sparse(heap);
        graph.expand_whole_graph().unwrap();
        graph
    }

    fn sparse(heap: &Arc<InMemoryHeap>) -> HeapGraph {
        HeapGraph::new(heap.clone(), ExclusionPolicy::new(false), ExpanderChooser::new(64, &[]))
    }

    /// Static `Registry.items` holding a list object with a backing array,
    /// next to an unrelated static singleton
    fn registry(heap: &InMemoryHeap) -> ObjectId {
        let class = heap.define_class("Registry", None);
        let list = heap.new_object("List");
        heap.set_static(class, "items", Some(list));
        heap.set_field(list, "data", Some(heap.new_array("Item[]", &[])));
        let unrelated = heap.define_class("Config", None);
        heap.set_static(unrelated, "INSTANCE", Some(heap.new_object("Settings")));
        list
    }

    /// Replace the backing array with a larger copy plus one new item
    fn grow(heap: &InMemoryHeap, list: ObjectId) {
        let old = heap.field(list, "data").unwrap();
        let mut items = heap.elements(old);
        items.push(Some(heap.new_object("Item")));
        heap.set_field(list, "data", Some(heap.new_array("Item[]", &items)));
    }

    fn leak_types(graph: &HeapGraph) -> Vec<String> {
        graph
            .leak_roots()
            .iter()
            .map(|&id| graph.node(id).type_name().to_string())
            .collect()
    }

    #[test]
    fn test_seeded_array_growth_detected_through_reassigned_field() {
        let heap = Arc::new(InMemoryHeap::new());
        let list = registry(&heap);
        let g1 = snapshot(&heap);
        grow(&heap, list);
        let mut g2 = snapshot(&heap);

        assert_eq!(g2.propagate_growing(&g1, true), 1);
        assert_eq!(leak_types(&g2), vec!["Item[]"]);

        grow(&heap, list);
        let mut g3 = snapshot(&heap);
        assert_eq!(g3.propagate_growing(&g2, false), 1);
    }

    #[test]
    fn test_unseeded_growth_is_ignored() {
        let heap = Arc::new(InMemoryHeap::new());
        let list = registry(&heap);
        let g1 = snapshot(&heap);
        grow(&heap, list);
        let mut g2 = snapshot(&heap);
        assert_eq!(g2.propagate_growing(&g1, false), 0);
    }

    #[test]
    fn test_growth_must_repeat() {
        let heap = Arc::new(InMemoryHeap::new());
        let list = registry(&heap);
        let g1 = snapshot(&heap);
        grow(&heap, list);
        let mut g2 = snapshot(&heap);
        g2.propagate_growing(&g1, true);

        // no growth this round: the candidate is whittled away
        let mut g3 = snapshot(&heap);
        assert_eq!(g3.propagate_growing(&g2, false), 0);
    }

    #[test]
    fn test_previous_graph_is_untouched() {
        let heap = Arc::new(InMemoryHeap::new());
        let list = registry(&heap);
        let g1 = snapshot(&heap);
        grow(&heap, list);
        let mut g2 = snapshot(&heap);
        g2.propagate_growing(&g1, true);
        assert!(g1.leak_roots().is_empty());
        assert!(g1.arena().nodes().all(|(_, node)| !node.is_growing()));
    }

    #[test]
    fn test_incremental_matches_full() {
        let heap = Arc::new(InMemoryHeap::new());
        let list = registry(&heap);
        let g1 = snapshot(&heap);
        grow(&heap, list);
        let mut g2 = snapshot(&heap);
        g2.propagate_growing(&g1, true);

        grow(&heap, list);
        let mut full = snapshot(&heap);
        full.propagate_growing(&g2, false);
        let mut incremental = sparse(&heap);
        assert_eq!(incremental.propagate_growing_incremental(&g2).unwrap(), 1);

        assert_eq!(leak_types(&incremental), leak_types(&full));
        assert!(incremental.len() < full.len());
        let leak = incremental.leak_roots()[0];
        assert_eq!(
            incremental.arena().signature_of(leak),
            full.arena().signature_of(full.leak_roots()[0])
        );
    }

    #[test]
    fn test_incremental_drops_vanished_paths() {
        let heap = Arc::new(InMemoryHeap::new());
        let list = registry(&heap);
        let g1 = snapshot(&heap);
        grow(&heap, list);
        let mut g2 = snapshot(&heap);
        g2.propagate_growing(&g1, true);

        heap.set_field(list, "data", None);
        let mut incremental = sparse(&heap);
        assert_eq!(incremental.propagate_growing_incremental(&g2).unwrap(), 0);
        assert!(!heap.is_paused());
    }
}
