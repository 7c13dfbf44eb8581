//! Root expander
//!
//! Class loaders have no ordinary incoming reference, so the synthetic root
//! gets one child per distinct loader currently known to the backend, plus the
//! bootstrap placeholder standing for "no class loader".

use crate::features::heap_graph::domain::{Edge, Label, NodeArena, NodeId};
use crate::features::heap_graph::ports::{Expander, IntrospectionPort};
use crate::shared::models::{ObjectId, ObjectInfo};
use rustc_hash::FxHashSet;

#[derive(Debug, Default)]
pub struct RootExpander;

impl RootExpander {
    pub fn new() -> Self {
        Self
    }

    /// Distinct loaders of all loaded classes, in discovery order, then bootstrap
    fn current_loaders(backend: &dyn IntrospectionPort) -> Vec<ObjectId> {
        let mut seen = FxHashSet::default();
        let mut loaders: Vec<ObjectId> = backend
            .enumerate_all_loaded_classes()
            .into_iter()
            .filter_map(|class| backend.class_loader_of(class))
            .filter(|loader| seen.insert(*loader))
            .collect();
        loaders.push(ObjectId::BOOTSTRAP_LOADER);
        loaders
    }
}

impl Expander for RootExpander {
    fn name(&self) -> &'static str {
        "root"
    }

    fn can_expand(&self, object: ObjectId, _info: &ObjectInfo) -> bool {
        object == ObjectId::ROOT
    }

    fn expand(&mut self, arena: &mut NodeArena, node: NodeId) {
        for loader in Self::current_loaders(arena.backend()) {
            arena.add_edge(node, loader, Label::ObjectIdentity(loader));
        }
    }

    fn expand_corresponding_edge(
        &mut self,
        arena: &mut NodeArena,
        node: NodeId,
        edge: &Edge,
    ) -> Option<NodeId> {
        let Label::ObjectIdentity(loader) = edge.label else {
            return None;
        };
        if loader != ObjectId::BOOTSTRAP_LOADER
            && !Self::current_loaders(arena.backend()).contains(&loader)
        {
            return None;
        }
        arena.add_edge(node, loader, edge.label)
    }
}
