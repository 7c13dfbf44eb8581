//! Heap Graph Domain - nodes, edges and labels of one heap snapshot
//!
//! ## DDD Concepts Applied
//! - **Entity**: [`Node`] (identity = wrapped object, never value)
//! - **Value Object**: [`Label`], [`Edge`], [`Signature`]
//! - **Aggregate**: [`NodeArena`] owns every node of one snapshot

pub mod arena;
pub mod exclusion;
pub mod label;
pub mod node;
pub mod signature;

pub use arena::NodeArena;
pub use exclusion::{ExclusionPolicy, ExclusionPredicate};
pub use label::Label;
pub use node::{Edge, Node, NodeId};
pub use signature::Signature;
