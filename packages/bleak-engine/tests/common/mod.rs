//! Common test utilities for bleak-engine
//!
//! Simulated applications built on `InMemoryHeap` plus assertion helpers
//! shared by the integration tests.

#![allow(dead_code)]

mod assertions;
mod fixtures;

pub use assertions::*;
pub use fixtures::*;
