//! Default field expander - the catch-all fallback, always registered last
//!
//! Every non-null, non-excluded instance field value (inherited fields
//! included) becomes one field-labelled edge.

use super::anomaly::or_skip;
use crate::features::heap_graph::domain::{Edge, Label, NodeArena, NodeId};
use crate::features::heap_graph::ports::Expander;
use crate::shared::models::{FieldId, FieldValue, ObjectId, ObjectInfo};

/// Instance fields of the object behind `node`; synthetic placeholders have none
///
/// Shared with the class and class-loader expanders, which also own the
/// instance state of the class or loader object itself.
pub(super) fn instance_fields(
    arena: &NodeArena,
    node: NodeId,
    expander: &'static str,
) -> Vec<FieldValue> {
    let object = arena.node(node).object();
    if object.is_synthetic() {
        return Vec::new();
    }
    or_skip(arena, node, expander, arena.backend().enumerate_fields(object))
}

/// Add the edge for `field` if it is among the freshly enumerated `values`
pub(super) fn add_field_counterpart(
    arena: &mut NodeArena,
    node: NodeId,
    field: FieldId,
    values: Vec<FieldValue>,
) -> Option<NodeId> {
    let value = values.into_iter().find(|value| value.field.id == field)?;
    arena.add_field_edge(node, &value)
}

#[derive(Debug, Default)]
pub struct DefaultExpander;

impl DefaultExpander {
    pub fn new() -> Self {
        Self
    }
}

impl Expander for DefaultExpander {
    fn name(&self) -> &'static str {
        "default"
    }

    fn can_expand(&self, _object: ObjectId, _info: &ObjectInfo) -> bool {
        true
    }

    fn expand(&mut self, arena: &mut NodeArena, node: NodeId) {
        for value in instance_fields(arena, node, self.name()) {
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
        let values = instance_fields(arena, node, self.name());
        add_field_counterpart(arena, node, field, values)
    }
}
