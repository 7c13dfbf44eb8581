//! Simulated applications
//!
//! Every fixture hangs its state off a static field of a class, so it is
//! reachable from the synthetic root the way real application state is.

use bleak_engine::features::heap_graph::domain::ExclusionPolicy;
use bleak_engine::features::heap_graph::infrastructure::ExpanderChooser;
use bleak_engine::{HeapGraph, InMemoryHeap, IntrospectionPort, ObjectId};
use std::sync::Arc;

pub fn backend(heap: &Arc<InMemoryHeap>) -> Arc<dyn IntrospectionPort> {
    heap.clone()
}

/// Fully expanded snapshot of `heap` with default settings
pub fn snapshot(heap: &Arc<InMemoryHeap>) -> HeapGraph {
    let mut graph = HeapGraph::new(
        backend(heap),
        ExclusionPolicy::new(false),
        ExpanderChooser::new(64, &[]),
    );
    graph.expand_whole_graph().expect("snapshot expands");
    graph
}

/// `App.cache` -> `Cache.entries` -> `Entry[]`, appended to in place
pub struct CacheApp {
    pub heap: Arc<InMemoryHeap>,
    pub cache: ObjectId,
    pub entries: ObjectId,
}

impl CacheApp {
    pub fn new() -> Self {
        let heap = Arc::new(InMemoryHeap::new());
        let app = heap.define_class("App", None);
        let cache = heap.new_object("Cache");
        let entries = heap.new_array("Entry[]", &[]);
        heap.set_static(app, "cache", Some(cache));
        heap.set_field(cache, "entries", Some(entries));
        Self {
            heap,
            cache,
            entries,
        }
    }

    pub fn add_entry(&self) {
        let entry = self.heap.new_object("Entry");
        self.heap.push_element(self.entries, Some(entry));
    }
}

/// `Registry.items` -> `List.data` -> `Item[]`, where `data` is swapped for a
/// larger copy on every growth
pub struct GrowingList {
    pub heap: Arc<InMemoryHeap>,
    pub list: ObjectId,
}

impl GrowingList {
    pub fn new(heap: Arc<InMemoryHeap>) -> Self {
        let registry = heap.define_class("Registry", None);
        let list = heap.new_object("List");
        heap.set_static(registry, "items", Some(list));
        heap.set_field(list, "data", Some(heap.new_array("Item[]", &[])));
        Self { heap, list }
    }

    pub fn data(&self) -> ObjectId {
        self.heap.field(self.list, "data").expect("list has a backing array")
    }

    pub fn grow(&self) {
        let mut items = self.heap.elements(self.data());
        items.push(Some(self.heap.new_object("Item")));
        let bigger = self.heap.new_array("Item[]", &items);
        self.heap.set_field(self.list, "data", Some(bigger));
    }
}

/// A static array of `len` distinct items
pub fn static_array(heap: &InMemoryHeap, class: &str, len: usize) -> ObjectId {
    let holder = heap.define_class(class, None);
    let items: Vec<_> = (0..len).map(|_| Some(heap.new_object("Item"))).collect();
    let array = heap.new_array("Item[]", &items);
    heap.set_static(holder, "items", Some(array));
    array
}
