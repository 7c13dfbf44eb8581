//! Engine features
//!
//! - `heap_graph`: snapshots, expanders and growth propagation
//! - `disposer_info`: ownership-registry growth tracker
//! - `leak_report`: whitelist rules and results

pub mod disposer_info;
pub mod heap_graph;
pub mod leak_report;
