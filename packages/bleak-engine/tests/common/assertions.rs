//! Assertion helpers

use bleak_engine::{BleakError, BleakResult, HeapGraph, LeakInfo};

/// Unwrap the result carried by a leak failure
pub fn expect_leak(outcome: bleak_engine::Result<BleakResult>) -> BleakResult {
    match outcome {
        Err(BleakError::LeakDetected(result)) => *result,
        Err(other) => panic!("expected a leak, got error: {other}"),
        Ok(result) => panic!("expected a leak, run succeeded:\n{result}"),
    }
}

/// Rendered signatures of the real leaks
pub fn leak_signatures(result: &BleakResult) -> Vec<String> {
    result.leaks.iter().map(|leak| leak.signature.to_string()).collect()
}

pub fn assert_single_leak<'a>(result: &'a BleakResult, leak_type: &str) -> &'a LeakInfo {
    assert_eq!(
        result.leaks.len(),
        1,
        "expected exactly one leak, got {:?}",
        leak_signatures(result)
    );
    let leak = &result.leaks[0];
    assert_eq!(leak.type_name, leak_type);
    leak
}

/// Type names of a graph's leak roots
pub fn leak_root_types(graph: &HeapGraph) -> Vec<String> {
    graph
        .leak_roots()
        .iter()
        .map(|&id| graph.node(id).type_name().to_string())
        .collect()
}
