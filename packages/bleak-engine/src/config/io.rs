//! Configuration I/O (YAML)
//!
//! Defines the YAML schema types. Loading and export live on
//! [`BleakConfig`](super::BleakConfig).

use crate::features::leak_report::WhitelistRule;
use serde::{Deserialize, Serialize};

/// Only schema version understood by this crate
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    #[serde(default)]
    pub version: Option<u32>,

    /// Base preset
    pub preset: String,

    /// Fine-grained overrides applied on top of the preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Configuration overrides; absent keys keep the preset's value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_incremental_propagation: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_weak_references: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_index_threshold: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_disposer_tree: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_description_len: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<Vec<WhitelistRule>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_issues: Option<Vec<WhitelistRule>>,
}
