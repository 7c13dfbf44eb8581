//! Heap Graph Application Layer - snapshot construction and comparison
//!
//! - [`HeapGraph`]: one snapshot, its traversal primitive and expansion
//! - `propagation`: full and incremental growth propagation
//! - `dominance`: reachability, dominance and retained size

mod dominance;
pub mod heap_graph;
mod propagation;

pub use heap_graph::{HeapGraph, Traversal};
