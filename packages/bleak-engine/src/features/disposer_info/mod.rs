//! DisposerInfo - coarse growth check over the ownership registry
//!
//! Counts, for every owner in the registry, its children per child type.
//! Unlike the graph walk this does not depend on edge matching, so an owner
//! that loses one child and gains two of the same type in a single step still
//! shows up. A (owner, child type) pair stays reported only while its count
//! strictly increases on every propagation after the baseline.

use crate::features::heap_graph::ports::IntrospectionPort;
use crate::shared::models::ObjectId;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;

/// One owner/child-type bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DisposerKey {
    pub owner: ObjectId,
    pub owner_type: String,
    pub child_type: String,
}

/// Bucket whose count kept increasing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisposerGrowth {
    pub key: DisposerKey,
    /// Count at the step before the latest propagation
    pub previous_count: usize,
    pub count: usize,
}

impl fmt::Display for DisposerGrowth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} owns {} x {} (was {})",
            self.key.owner_type, self.key.owner, self.count, self.key.child_type, self.previous_count
        )
    }
}

type Counts = FxHashMap<DisposerKey, usize>;

#[derive(Debug, Default)]
pub struct DisposerInfo {
    baseline: Option<Counts>,
    /// `None` until the first propagation
    growing: Option<FxHashMap<DisposerKey, DisposerGrowth>>,
}

impl DisposerInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_baseline(&self) -> bool {
        self.baseline.is_some()
    }

    /// Current per-owner, per-child-type counts; vanished objects are skipped
    pub fn counts(backend: &dyn IntrospectionPort) -> FxHashMap<DisposerKey, usize> {
        let mut counts = Counts::default();
        for link in backend.ownership_tree() {
            let (Some(owner), Some(child)) = (backend.object_info(link.owner), backend.object_info(link.child))
            else {
                continue;
            };
            let key = DisposerKey {
                owner: link.owner,
                owner_type: owner.type_name.to_string(),
                child_type: child.type_name.to_string(),
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    pub fn capture_baseline(&mut self, backend: &dyn IntrospectionPort) {
        self.baseline = Some(Self::counts(backend));
    }

    /// Compare against the previous counts and whittle the growing set
    ///
    /// Without a baseline the call only captures one. Returns the number of
    /// buckets still growing.
    pub fn propagate(&mut self, backend: &dyn IntrospectionPort) -> usize {
        let current = Self::counts(backend);
        let Some(baseline) = self.baseline.take() else {
            self.baseline = Some(current);
            return 0;
        };

        let mut growing: FxHashMap<DisposerKey, DisposerGrowth> = current
            .iter()
            .filter_map(|(key, &count)| {
                let previous_count = baseline.get(key).copied().unwrap_or(0);
                (count > previous_count).then(|| {
                    (
                        key.clone(),
                        DisposerGrowth {
                            key: key.clone(),
                            previous_count,
                            count,
                        },
                    )
                })
            })
            .collect();
        if let Some(previous) = &self.growing {
            growing.retain(|key, _| previous.contains_key(key));
        }

        let still_growing = growing.len();
        self.growing = Some(growing);
        self.baseline = Some(current);
        still_growing
    }

    /// Buckets that grew on every propagation so far, in stable order
    pub fn growth(&self) -> Vec<DisposerGrowth> {
        let mut growth: Vec<DisposerGrowth> = self
            .growing
            .as_ref()
            .map(|growing| growing.values().cloned().collect())
            .unwrap_or_default();
        growth.sort_by(|a, b| a.key.cmp(&b.key));
        growth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::heap_graph::infrastructure::InMemoryHeap;

    fn owner_with(heap: &InMemoryHeap, listeners: usize, handlers: usize) -> ObjectId {
        let owner = heap.new_object("Window");
        for _ in 0..listeners {
            heap.add_owned(owner, heap.new_object("Listener"));
        }
        for _ in 0..handlers {
            heap.add_owned(owner, heap.new_object("Handler"));
        }
        owner
    }

    #[test]
    fn test_counts_per_child_type() {
        let heap = InMemoryHeap::new();
        owner_with(&heap, 2, 1);
        let counts = DisposerInfo::counts(&heap);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts.values().sum::<usize>(), 3);
    }

    #[test]
    fn test_type_shift_with_constant_total_is_reported() {
        let heap = InMemoryHeap::new();
        let owner = owner_with(&heap, 0, 0);
        let mut handlers: Vec<ObjectId> = (0..5).map(|_| heap.new_object("Handler")).collect();
        for &h in &handlers {
            heap.add_owned(owner, h);
        }

        let mut info = DisposerInfo::new();
        info.capture_baseline(&heap);
        for _ in 0..3 {
            let dropped = handlers.pop().unwrap();
            heap.remove_owned(owner, dropped);
            heap.add_owned(owner, heap.new_object("Listener"));
            assert_eq!(info.propagate(&heap), 1);
        }

        let growth = info.growth();
        assert_eq!(growth.len(), 1);
        assert_eq!(growth[0].key.child_type, "Listener");
        assert_eq!((growth[0].previous_count, growth[0].count), (2, 3));
    }

    #[test]
    fn test_one_off_growth_is_whittled() {
        let heap = InMemoryHeap::new();
        let owner = owner_with(&heap, 1, 0);
        let mut info = DisposerInfo::new();
        info.capture_baseline(&heap);

        heap.add_owned(owner, heap.new_object("Listener"));
        assert_eq!(info.propagate(&heap), 1);
        assert_eq!(info.propagate(&heap), 0);

        // later growth cannot re-enter once whittled away
        heap.add_owned(owner, heap.new_object("Listener"));
        assert_eq!(info.propagate(&heap), 0);
        assert!(info.growth().is_empty());
    }

    #[test]
    fn test_first_propagate_without_baseline_only_captures() {
        let heap = InMemoryHeap::new();
        owner_with(&heap, 3, 0);
        let mut info = DisposerInfo::new();
        assert_eq!(info.propagate(&heap), 0);
        assert!(info.has_baseline());
        assert!(info.growth().is_empty());
    }
}
