//! Heap Graph feature
//!
//! Snapshot a live object graph through an [`IntrospectionPort`](ports::IntrospectionPort),
//! decompose objects with pluggable [`Expander`](ports::Expander)s and compare
//! snapshots to find structurally growing nodes.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{HeapGraph, Traversal};
pub use domain::{Edge, ExclusionPolicy, ExclusionPredicate, Label, Node, NodeArena, NodeId, Signature};
pub use infrastructure::{ExpanderChooser, InMemoryHeap};
pub use ports::{
    BackendError, BackendResult, Expander, ExpanderFactory, IntrospectionPort, OwnershipLink,
    PauseGuard,
};
