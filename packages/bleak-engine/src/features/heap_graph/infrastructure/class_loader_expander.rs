//! Class-loader expander: a loader's children are the classes it defines,
//! plus the loader object's own instance fields

use super::anomaly::or_skip;
use super::default_expander::{add_field_counterpart, instance_fields};
use super::identity_index::IdentityIndex;
use crate::features::heap_graph::domain::{Edge, Label, NodeArena, NodeId};
use crate::features::heap_graph::ports::Expander;
use crate::shared::models::{ObjectId, ObjectInfo, ObjectKind};

#[derive(Debug)]
pub struct ClassLoaderExpander {
    index: IdentityIndex,
}

impl ClassLoaderExpander {
    pub fn new(index_threshold: usize) -> Self {
        Self {
            index: IdentityIndex::new(index_threshold),
        }
    }

    fn classes_of(arena: &NodeArena, node: NodeId) -> Vec<ObjectId> {
        let object = arena.node(node).object();
        let loader = (object != ObjectId::BOOTSTRAP_LOADER).then_some(object);
        or_skip(
            arena,
            node,
            "class_loader",
            arena.backend().enumerate_classes_of(loader),
        )
    }
}

impl Expander for ClassLoaderExpander {
    fn name(&self) -> &'static str {
        "class_loader"
    }

    fn can_expand(&self, _object: ObjectId, info: &ObjectInfo) -> bool {
        info.kind == ObjectKind::ClassLoader
    }

    fn expand(&mut self, arena: &mut NodeArena, node: NodeId) {
        self.index.forget(node);
        for class in Self::classes_of(arena, node) {
            arena.add_edge(node, class, Label::ObjectIdentity(class));
        }
        for value in instance_fields(arena, node, self.name()) {
            arena.add_field_edge(node, &value);
        }
        self.index.record_expansion(arena, node);
    }

    fn expand_corresponding_edge(
        &mut self,
        arena: &mut NodeArena,
        node: NodeId,
        edge: &Edge,
    ) -> Option<NodeId> {
        let class = match edge.label {
            Label::ObjectIdentity(class) => class,
            Label::Field(field) => {
                let values = instance_fields(arena, node, self.name());
                return add_field_counterpart(arena, node, field, values);
            }
            Label::RootLoopback => return None,
        };
        if !self
            .index
            .contains_live(node, class, || Self::classes_of(arena, node))
        {
            return None;
        }
        let child = arena.add_edge(node, class, edge.label)?;
        self.index.record_child(node, class, child);
        Some(child)
    }

    fn get_child_for_label(&self, arena: &NodeArena, node: NodeId, label: &Label) -> Option<NodeId> {
        match *label {
            Label::ObjectIdentity(class) => self.index.lookup(arena, node, class),
            Label::Field(_) => arena.find_edge(node, label),
            Label::RootLoopback => None,
        }
    }
}
