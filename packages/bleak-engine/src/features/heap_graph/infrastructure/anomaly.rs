//! Recoverable expansion anomalies
//!
//! A single object that cannot be enumerated must not abort a snapshot: the
//! failure is logged and the object is treated as having no children.

use crate::features::heap_graph::domain::{NodeArena, NodeId};
use crate::features::heap_graph::ports::BackendResult;
use tracing::warn;

/// Unwrap an enumeration, logging and skipping the object on failure
pub(crate) fn or_skip<T>(
    arena: &NodeArena,
    node: NodeId,
    expander: &'static str,
    enumerated: BackendResult<Vec<T>>,
) -> Vec<T> {
    match enumerated {
        Ok(items) => items,
        Err(err) => {
            let n = arena.node(node);
            warn!(
                "{}: skipping {} ({}) during expansion: {}",
                expander,
                n.object(),
                n.type_name(),
                err
            );
            Vec::new()
        }
    }
}
