//! Programmatic run options
//!
//! [`BleakConfig`] carries everything that can live in a file; `BleakOptions`
//! adds what only code can supply: custom expanders, an exclusion predicate
//! and whitelist predicates.

use super::bleak_config::BleakConfig;
use super::error::ConfigResult;
use super::preset::Preset;
use crate::features::heap_graph::domain::{ExclusionPolicy, ExclusionPredicate};
use crate::features::heap_graph::infrastructure::ExpanderChooser;
use crate::features::heap_graph::ports::ExpanderFactory;
use crate::features::leak_report::{LeakInfo, LeakPredicate, Whitelist, WhitelistRule};
use crate::shared::models::ObjectInfo;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct BleakOptions {
    config: BleakConfig,
    expanders: Vec<Arc<dyn ExpanderFactory>>,
    exclusion: Option<ExclusionPredicate>,
    whitelist_predicates: Vec<LeakPredicate>,
    known_issue_predicates: Vec<LeakPredicate>,
}

impl BleakOptions {
    pub fn new(config: BleakConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn from_preset(preset: Preset) -> Self {
        Self::new(BleakConfig::from_preset(preset))
    }

    pub fn config(&self) -> &BleakConfig {
        &self.config
    }

    /// Custom expanders in registration order
    pub fn expanders(&self) -> &[Arc<dyn ExpanderFactory>] {
        &self.expanders
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Builders
    // ═══════════════════════════════════════════════════════════════════════

    /// Register a custom expander, tried after the built-ins and before the default
    pub fn with_expander<F>(mut self, factory: F) -> Self
    where
        F: ExpanderFactory + 'static,
    {
        self.expanders.push(Arc::new(factory));
        self
    }

    /// Skip children for which `predicate` holds, on top of the built-in exclusions
    pub fn with_exclusion<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&ObjectInfo) -> bool + Send + Sync + 'static,
    {
        self.exclusion = Some(Arc::new(predicate));
        self
    }

    pub fn whitelist_rule(mut self, rule: WhitelistRule) -> Self {
        self.config = self.config.whitelist_rule(rule);
        self
    }

    pub fn known_issue_rule(mut self, rule: WhitelistRule) -> Self {
        self.config = self.config.known_issue_rule(rule);
        self
    }

    pub fn whitelist_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&LeakInfo) -> bool + Send + Sync + 'static,
    {
        self.whitelist_predicates.push(Arc::new(predicate));
        self
    }

    pub fn known_issue_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&LeakInfo) -> bool + Send + Sync + 'static,
    {
        self.known_issue_predicates.push(Arc::new(predicate));
        self
    }

    pub fn iterations(mut self, v: usize) -> Self {
        self.config = self.config.iterations(v);
        self
    }

    pub fn incremental(mut self, v: bool) -> Self {
        self.config = self.config.incremental(v);
        self
    }

    pub fn follow_weak_references(mut self, v: bool) -> Self {
        self.config = self.config.follow_weak_references(v);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Per-run products
    // ═══════════════════════════════════════════════════════════════════════

    pub fn exclusion_policy(&self) -> ExclusionPolicy {
        ExclusionPolicy::new(self.config.follow_weak_references).with_predicate(self.exclusion.clone())
    }

    /// Fresh expander set; never share one between graphs
    pub fn new_chooser(&self) -> ExpanderChooser {
        ExpanderChooser::new(self.config.identity_index_threshold, &self.expanders)
    }

    /// Compiled (whitelist, known issues)
    pub fn compile_whitelists(&self) -> ConfigResult<(Whitelist, Whitelist)> {
        Ok((
            Whitelist::compile(&self.config.whitelist, &self.whitelist_predicates)?,
            Whitelist::compile(&self.config.known_issues, &self.known_issue_predicates)?,
        ))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.config.validate()
    }
}

impl From<BleakConfig> for BleakOptions {
    fn from(config: BleakConfig) -> Self {
        Self::new(config)
    }
}

impl fmt::Debug for BleakOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BleakOptions")
            .field("config", &self.config)
            .field("expanders", &self.expanders.len())
            .field("has_exclusion", &self.exclusion.is_some())
            .field("whitelist_predicates", &self.whitelist_predicates.len())
            .field("known_issue_predicates", &self.known_issue_predicates.len())
            .finish()
    }
}
