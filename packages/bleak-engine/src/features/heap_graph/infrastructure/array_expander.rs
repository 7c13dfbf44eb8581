//! Reference-array expander (identity labels)
//!
//! Elements move when arrays are shuffled or collections rehash, so each
//! element is labelled by its own identity rather than its slot. An edge from
//! another snapshot is re-creatable iff its target is still an element
//! anywhere in this array.

use super::anomaly::or_skip;
use super::identity_index::IdentityIndex;
use crate::features::heap_graph::domain::{Edge, Label, NodeArena, NodeId};
use crate::features::heap_graph::ports::Expander;
use crate::shared::models::{ObjectId, ObjectInfo, ObjectKind};

#[derive(Debug)]
pub struct ReferenceArrayExpander {
    index: IdentityIndex,
}

impl ReferenceArrayExpander {
    pub fn new(index_threshold: usize) -> Self {
        Self {
            index: IdentityIndex::new(index_threshold),
        }
    }

    fn elements_of(arena: &NodeArena, node: NodeId) -> Vec<ObjectId> {
        let object = arena.node(node).object();
        or_skip(
            arena,
            node,
            "reference_array",
            arena.backend().enumerate_elements(object),
        )
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Expander for ReferenceArrayExpander {
    fn name(&self) -> &'static str {
        "reference_array"
    }

    fn can_expand(&self, _object: ObjectId, info: &ObjectInfo) -> bool {
        matches!(info.kind, ObjectKind::ReferenceArray | ObjectKind::Collection)
    }

    fn expand(&mut self, arena: &mut NodeArena, node: NodeId) {
        self.index.forget(node);
        for element in Self::elements_of(arena, node) {
            arena.add_element_edge(node, element);
        }
        self.index.record_expansion(arena, node);
    }

    fn expand_corresponding_edge(
        &mut self,
        arena: &mut NodeArena,
        node: NodeId,
        edge: &Edge,
    ) -> Option<NodeId> {
        let Label::ObjectIdentity(element) = edge.label else {
            return None;
        };
        if !self
            .index
            .contains_live(node, element, || Self::elements_of(arena, node))
        {
            return None;
        }
        let child = arena.add_element_edge(node, element)?;
        self.index.record_child(node, element, child);
        Some(child)
    }

    fn get_child_for_label(&self, arena: &NodeArena, node: NodeId, label: &Label) -> Option<NodeId> {
        match *label {
            Label::ObjectIdentity(element) => self.index.lookup(arena, node, element),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::heap_graph::domain::ExclusionPolicy;
    use crate::features::heap_graph::infrastructure::InMemoryHeap;
    use crate::features::heap_graph::ports::IntrospectionPort;
    use std::sync::Arc;

    #[test]
    fn test_null_and_primitive_elements_skipped() {
        let heap = Arc::new(InMemoryHeap::new());
        let item = heap.new_object("Item");
        let bytes = heap.new_primitive_array("byte[]", 8);
        let array = heap.new_array("Object[]", &[Some(item), None, Some(bytes)]);

        let mut arena = NodeArena::new(heap.clone(), ExclusionPolicy::new(false));
        let node = arena.insert_root(array).unwrap();
        let mut expander = ReferenceArrayExpander::new(64);
        expander.expand(&mut arena, node);

        assert_eq!(arena.node(node).degree(), 1);
    }

    #[test]
    fn test_permuted_element_is_still_found() {
        let heap = Arc::new(InMemoryHeap::new());
        let items: Vec<_> = (0..3).map(|_| Some(heap.new_object("Item"))).collect();
        let array = heap.new_array("Item[]", &items);

        let mut old = NodeArena::new(heap.clone(), ExclusionPolicy::new(false));
        let old_array = old.insert_root(array).unwrap();
        ReferenceArrayExpander::new(64).expand(&mut old, old_array);
        let moved = old.node(old_array).edges()[0];

        let mut shuffled = items.clone();
        shuffled.reverse();
        heap.set_elements(array, shuffled);

        let mut new = NodeArena::new(heap.clone(), ExclusionPolicy::new(false));
        let new_array = new.insert_root(array).unwrap();
        let mut expander = ReferenceArrayExpander::new(64);
        let child = expander
            .expand_corresponding_edge(&mut new, new_array, &moved)
            .unwrap();
        assert_eq!(new.node(child).object(), items[0].unwrap());
        assert_eq!(expander.get_child_for_label(&new, new_array, &moved.label), Some(child));
    }

    #[test]
    fn test_removed_element_has_no_correspondent() {
        let heap = Arc::new(InMemoryHeap::new());
        let gone = heap.new_object("Item");
        let array = heap.new_array("Item[]", &[Some(gone)]);
        let edge = Edge::new(NodeId(0), NodeId(1), Label::ObjectIdentity(gone));
        heap.set_elements(array, vec![]);

        let mut arena = NodeArena::new(heap.clone(), ExclusionPolicy::new(false));
        let node = arena.insert_root(array).unwrap();
        let mut expander = ReferenceArrayExpander::new(1);
        assert!(expander.expand_corresponding_edge(&mut arena, node, &edge).is_none());
        assert!(heap.enumerate_elements(array).unwrap().is_empty());
    }

    #[test]
    fn test_collections_are_claimed() {
        let expander = ReferenceArrayExpander::new(64);
        let info = ObjectInfo::new("HashSet", ObjectKind::Collection);
        assert!(expander.can_expand(ObjectId(1), &info));
        let info = ObjectInfo::new("int[]", ObjectKind::PrimitiveArray);
        assert!(!expander.can_expand(ObjectId(1), &info));
    }
}
