//! Heap Graph Ports - Interface Layer (Hexagonal Architecture)
//!
//! Two seams:
//! - [`IntrospectionPort`] (driven): how a live program's objects are enumerated.
//!   The engine never assumes anything about *how* children are discovered,
//!   only that enumeration is deterministic within one paused snapshot.
//! - [`Expander`] (strategy): how one shape of object is decomposed into typed
//!   children and matched across snapshots.

use super::domain::{Edge, Label, NodeArena, NodeId};
use crate::shared::models::{FieldValue, ObjectId, ObjectInfo};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════
// Introspection Backend
// ═══════════════════════════════════════════════════════════════════════════

/// Failure to enumerate one object
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The object changed structurally while being enumerated
    #[error("concurrent modification while enumerating {object}")]
    ConcurrentModification { object: ObjectId },

    /// The object could not be inspected
    #[error("cannot inspect {object}: {reason}")]
    Inaccessible { object: ObjectId, reason: String },

    /// The object is unknown to the backend (e.g. already reclaimed)
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// One parent→child link of the ownership registry tracked by DisposerInfo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnershipLink {
    pub owner: ObjectId,
    pub child: ObjectId,
}

/// Introspection Port - live-object enumeration capability
///
/// Passed explicitly into graph construction (never a global), so tests can
/// supply a simulated heap.
pub trait IntrospectionPort: Send + Sync {
    /// Shape of `obj`, `None` if the object no longer exists
    fn object_info(&self, obj: ObjectId) -> Option<ObjectInfo>;

    /// Non-static reference fields including inherited ones
    fn enumerate_fields(&self, obj: ObjectId) -> BackendResult<Vec<FieldValue>>;

    /// Static reference fields; empty for classes not yet initialized
    fn enumerate_static_fields(&self, class: ObjectId) -> BackendResult<Vec<FieldValue>>;

    /// Elements of an array or collection, preserving element identity
    fn enumerate_elements(&self, obj: ObjectId) -> BackendResult<Vec<Option<ObjectId>>>;

    /// Classes defined by `loader` (`None` = bootstrap)
    fn enumerate_classes_of(&self, loader: Option<ObjectId>) -> BackendResult<Vec<ObjectId>>;

    /// Every currently loaded class
    fn enumerate_all_loaded_classes(&self) -> Vec<ObjectId>;

    /// Defining loader of `class` (`None` = bootstrap)
    fn class_loader_of(&self, class: ObjectId) -> Option<ObjectId>;

    fn pause_all_other_threads(&self);

    fn resume_all_other_threads(&self);

    /// Best-effort shallow size in bytes
    fn approximate_shallow_size(&self, _obj: ObjectId) -> u64 {
        0
    }

    /// Best-effort rendering of an object for reports
    fn describe(&self, obj: ObjectId) -> String {
        match self.object_info(obj) {
            Some(info) => format!("{}{}", info.type_name, obj),
            None => obj.to_string(),
        }
    }

    /// Parent→child links of the framework ownership registry
    fn ownership_tree(&self) -> Vec<OwnershipLink> {
        Vec::new()
    }
}

/// Pauses the inspected program for as long as the guard lives
pub struct PauseGuard<'a> {
    backend: &'a dyn IntrospectionPort,
}

impl<'a> PauseGuard<'a> {
    pub fn new(backend: &'a dyn IntrospectionPort) -> Self {
        backend.pause_all_other_threads();
        Self { backend }
    }
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        self.backend.resume_all_other_threads();
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Expanders
// ═══════════════════════════════════════════════════════════════════════════

/// Expander Port - decomposition strategy for one shape of object
///
/// Expanders hold per-graph state (label→node indices) and must never be
/// shared between graphs; see [`ExpanderFactory`].
pub trait Expander: Send {
    /// Name for debugging and logging
    fn name(&self) -> &'static str;

    /// Pure predicate on the object's runtime shape
    fn can_expand(&self, object: ObjectId, info: &ObjectInfo) -> bool;

    /// Add an edge for every relevant child, inspecting the live object once
    fn expand(&mut self, arena: &mut NodeArena, node: NodeId);

    /// Re-create `edge` (observed in another snapshot) under `node` if the
    /// analogous child still exists. Must agree with `get_child_for_label`.
    fn expand_corresponding_edge(
        &mut self,
        arena: &mut NodeArena,
        node: NodeId,
        edge: &Edge,
    ) -> Option<NodeId>;

    /// Child of `node` reached through `label`, without touching the graph
    fn get_child_for_label(&self, arena: &NodeArena, node: NodeId, label: &Label) -> Option<NodeId> {
        arena.find_edge(node, label)
    }
}

/// Creates a fresh expander for each new graph
pub trait ExpanderFactory: Send + Sync {
    fn create(&self) -> Box<dyn Expander>;
}

impl<F> ExpanderFactory for F
where
    F: Fn() -> Box<dyn Expander> + Send + Sync,
{
    fn create(&self) -> Box<dyn Expander> {
        self()
    }
}
