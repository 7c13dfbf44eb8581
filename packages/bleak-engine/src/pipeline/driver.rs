//! Leak detection driver
//!
//! Runs the scenario `iterations + 2` times: one warm-up, `iterations`
//! measured runs and one final run. After the warm-up a first full graph is
//! built; after each later run a new graph is built and growth is propagated
//! into it from the previous one. Only nodes still growing in the terminal
//! graph are reported.

use crate::config::BleakOptions;
use crate::errors::{BleakError, Result, ScenarioError};
use crate::features::disposer_info::DisposerInfo;
use crate::features::heap_graph::application::HeapGraph;
use crate::features::heap_graph::ports::IntrospectionPort;
use crate::features::leak_report::{BleakResult, LeakInfo};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub struct LeakDetector {
    backend: Arc<dyn IntrospectionPort>,
    options: BleakOptions,
}

impl LeakDetector {
    /// Detector over `backend`; rejects invalid options up front
    pub fn new(backend: Arc<dyn IntrospectionPort>, options: BleakOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { backend, options })
    }

    pub fn options(&self) -> &BleakOptions {
        &self.options
    }

    /// Graph with a fresh expander set
    fn new_graph(&self) -> HeapGraph {
        HeapGraph::new(
            Arc::clone(&self.backend),
            self.options.exclusion_policy(),
            self.options.new_chooser(),
        )
    }

    fn full_graph(&self, disposer: &mut DisposerInfo) -> Result<HeapGraph> {
        let mut graph = self.new_graph();
        if self.options.config().check_disposer_tree {
            graph.expand_whole_graph_tracking(disposer)?;
        } else {
            graph.expand_whole_graph()?;
        }
        Ok(graph)
    }

    fn propagate_disposer(&self, disposer: &mut DisposerInfo) {
        if self.options.config().check_disposer_tree {
            let growing = disposer.propagate(self.backend.as_ref());
            debug!("ownership buckets still growing: {}", growing);
        }
    }

    /// Run the scenario and collect the result without judging it
    pub fn detect<F>(&self, mut scenario: F) -> Result<BleakResult>
    where
        F: FnMut() -> std::result::Result<(), ScenarioError>,
    {
        let config = self.options.config();
        let (whitelist, known_issues) = self.options.compile_whitelists()?;
        let mut run = || scenario().map_err(BleakError::Scenario);
        let started = Instant::now();
        let mut disposer = DisposerInfo::new();

        info!("bleak: warm-up run");
        run()?;
        let mut previous = self.full_graph(&mut disposer)?;
        info!("bleak: initial graph has {} nodes", previous.len());

        for iteration in 1..=config.iterations {
            run()?;
            let current = if iteration == 1 || !config.use_incremental_propagation {
                let mut graph = self.full_graph(&mut disposer)?;
                graph.propagate_growing(&previous, iteration == 1);
                graph
            } else {
                let mut graph = self.new_graph();
                graph.propagate_growing_incremental(&previous)?;
                graph
            };
            self.propagate_disposer(&mut disposer);
            info!(
                "bleak: iteration {}/{}: {} leak roots, {} nodes",
                iteration,
                config.iterations,
                current.leak_roots().len(),
                current.len()
            );
            previous = current;
        }

        info!("bleak: final run");
        run()?;
        let mut terminal = self.full_graph(&mut disposer)?;
        terminal.propagate_growing(&previous, false);
        self.propagate_disposer(&mut disposer);

        let candidates = LeakInfo::collect(&mut terminal, &previous, config.max_description_len)?;
        let disposer_growth = if config.check_disposer_tree {
            disposer.growth()
        } else {
            Vec::new()
        };
        let result = BleakResult::partition(candidates, &whitelist, &known_issues, disposer_growth)
            .with_stats(config.iterations, terminal.len());
        debug!(
            "bleak: finished in {:?}: {} leaks, {} known issues, {} whitelisted",
            started.elapsed(),
            result.leaks.len(),
            result.known_issues.len(),
            result.whitelisted
        );
        Ok(result)
    }

    /// Run the scenario; detected growth becomes [`BleakError::LeakDetected`]
    pub fn run<F>(&self, scenario: F) -> Result<BleakResult>
    where
        F: FnMut() -> std::result::Result<(), ScenarioError>,
    {
        let result = self.detect(scenario)?;
        if !result.success() {
            return Err(BleakError::LeakDetected(Box::new(result)));
        }
        if !result.known_issues.is_empty() {
            info!("bleak: no new leaks, {} known issue(s) matched", result.known_issues.len());
        }
        Ok(result)
    }
}

/// Detect leaks across repeated runs of `scenario`
///
/// The scenario must bring the program back to an equivalent external state
/// each time. Its errors are returned unmodified as [`BleakError::Scenario`].
pub fn run_with_bleak<F>(
    backend: Arc<dyn IntrospectionPort>,
    options: BleakOptions,
    scenario: F,
) -> Result<BleakResult>
where
    F: FnMut() -> std::result::Result<(), ScenarioError>,
{
    LeakDetector::new(backend, options)?.run(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BleakConfig;
    use crate::features::heap_graph::infrastructure::InMemoryHeap;

    #[test]
    fn test_invalid_options_rejected() {
        let heap = Arc::new(InMemoryHeap::new());
        let options = BleakOptions::new(BleakConfig::default().iterations(0));
        let err = LeakDetector::new(heap, options).err().unwrap();
        assert!(matches!(err, BleakError::Config(_)));
    }

    #[test]
    fn test_static_heap_succeeds() {
        let heap = Arc::new(InMemoryHeap::new());
        let class = heap.define_class("Holder", None);
        heap.set_static(class, "items", Some(heap.new_array("Item[]", &[])));

        let mut runs = 0;
        let result = run_with_bleak(heap.clone(), BleakOptions::default(), || {
            runs += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(runs, 5);
        assert!(result.success());
        assert_eq!(result.iterations_run, 3);
        assert!(result.terminal_graph_nodes >= 4);
    }
}
