/*
 * Bleak Engine - iterative heap-leak detection
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Introspected object model (ObjectId, FieldDescriptor, ...)
 * - features/    : heap_graph (snapshots, expanders, propagation),
 *                  disposer_info (ownership growth), leak_report (whitelists, results)
 * - config/      : Presets, YAML v1 files, programmatic options
 * - pipeline/    : Driver running the scenario and whittling leak roots
 *
 * The inspected program is reached only through the IntrospectionPort trait;
 * InMemoryHeap is a simulated implementation for tests and embedding.
 */

#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::len_without_is_empty)] // Graph sizes are informational

pub mod config;
pub mod errors;
pub mod features;
pub mod pipeline;
pub mod shared;

pub use config::{BleakConfig, BleakOptions, ConfigError, Preset};
pub use errors::{BleakError, Result, ScenarioError};
pub use features::disposer_info::{DisposerGrowth, DisposerInfo, DisposerKey};
pub use features::heap_graph::{
    Edge, Expander, ExpanderFactory, HeapGraph, InMemoryHeap, IntrospectionPort, Label, NodeArena,
    NodeId, Signature,
};
pub use features::leak_report::{BleakResult, LeakInfo, Whitelist, WhitelistRule};
pub use pipeline::{run_with_bleak, LeakDetector};
pub use shared::models::{FieldDescriptor, FieldId, FieldValue, ObjectId, ObjectInfo, ObjectKind};
