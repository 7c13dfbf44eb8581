//! Class-statics expander: a class's children are its initialized static fields
//!
//! The class is also an ordinary object, so its own instance fields become
//! field edges too, enumerated the way the default expander does.

use super::anomaly::or_skip;
use super::default_expander::{add_field_counterpart, instance_fields};
use crate::features::heap_graph::domain::{Edge, Label, NodeArena, NodeId};
use crate::features::heap_graph::ports::Expander;
use crate::shared::models::{FieldValue, ObjectId, ObjectInfo, ObjectKind};

#[derive(Debug, Default)]
pub struct ClassStaticsExpander;

impl ClassStaticsExpander {
    pub fn new() -> Self {
        Self
    }

    fn statics_of(&self, arena: &NodeArena, node: NodeId) -> Vec<FieldValue> {
        let class = arena.node(node).object();
        or_skip(
            arena,
            node,
            self.name(),
            arena.backend().enumerate_static_fields(class),
        )
    }
}

impl Expander for ClassStaticsExpander {
    fn name(&self) -> &'static str {
        "class_statics"
    }

    fn can_expand(&self, _object: ObjectId, info: &ObjectInfo) -> bool {
        info.kind == ObjectKind::Class
    }

    fn expand(&mut self, arena: &mut NodeArena, node: NodeId) {
        let mut values = self.statics_of(arena, node);
        values.extend(instance_fields(arena, node, self.name()));
        for value in values {
            arena.add_field_edge(node, &value);
        }
    }

    fn expand_corresponding_edge(
        &mut self,
        arena: &mut NodeArena,
        node: NodeId,
        edge: &Edge,
    ) -> Option<NodeId> {
        let Label::Field(field) = edge.label else {
            return None;
        };
        let mut values = self.statics_of(arena, node);
        values.extend(instance_fields(arena, node, self.name()));
        add_field_counterpart(arena, node, field, values)
    }
}
