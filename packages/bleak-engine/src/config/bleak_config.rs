//! Serializable engine configuration

use super::error::{ConfigError, ConfigResult};
use super::io::{ConfigExportV1, ConfigOverrides, SUPPORTED_VERSIONS};
use super::preset::Preset;
use crate::features::leak_report::WhitelistRule;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration value that can check its own invariants
pub trait Validatable {
    fn validate(&self) -> ConfigResult<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BleakConfig {
    #[serde(skip)]
    preset: Preset,

    /// Propagation rounds between the first pair of graphs and the final run (1..=100)
    pub iterations: usize,

    /// Replay only known leak paths after the first full propagation
    pub use_incremental_propagation: bool,

    /// Treat weak/soft reference payloads as ordinary children
    pub follow_weak_references: bool,

    /// Children count from which arrays and class loaders get a label index (1..=1000000)
    pub identity_index_threshold: usize,

    /// Track ownership-registry growth alongside the graph
    pub check_disposer_tree: bool,

    /// Truncation length of object renderings in reports (16..=100000)
    pub max_description_len: usize,

    /// Growth accepted as harmless; discarded from results
    pub whitelist: Vec<WhitelistRule>,

    /// Growth reported without failing the run
    pub known_issues: Vec<WhitelistRule>,
}

impl BleakConfig {
    pub fn from_preset(preset: Preset) -> Self {
        let base = Self {
            preset,
            iterations: 3,
            use_incremental_propagation: false,
            follow_weak_references: false,
            identity_index_threshold: 64,
            check_disposer_tree: true,
            max_description_len: 200,
            whitelist: Vec::new(),
            known_issues: Vec::new(),
        };
        match preset {
            Preset::Fast => Self {
                iterations: 2,
                use_incremental_propagation: true,
                ..base
            },
            Preset::Balanced | Preset::Custom => base,
            Preset::Thorough => Self {
                iterations: 5,
                follow_weak_references: true,
                ..base
            },
        }
    }

    pub fn preset(&self) -> Preset {
        self.preset
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.iterations == 0 || self.iterations > 100 {
            return Err(ConfigError::range_with_hint(
                "iterations",
                self.iterations,
                1,
                100,
                "At least one propagation round is needed to whittle candidates",
            ));
        }

        if self.identity_index_threshold == 0 || self.identity_index_threshold > 1_000_000 {
            return Err(ConfigError::range_with_hint(
                "identity_index_threshold",
                self.identity_index_threshold,
                1,
                1_000_000,
                "Index threshold must be a reasonable child count",
            ));
        }

        if self.max_description_len < 16 || self.max_description_len > 100_000 {
            return Err(ConfigError::range_with_hint(
                "max_description_len",
                self.max_description_len,
                16,
                100_000,
                "Descriptions shorter than 16 chars are unreadable",
            ));
        }

        for rule in self.whitelist.iter().chain(&self.known_issues) {
            rule.validate()?;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Builders
    // ═══════════════════════════════════════════════════════════════════════

    pub fn iterations(mut self, v: usize) -> Self {
        self.iterations = v;
        self
    }

    pub fn incremental(mut self, v: bool) -> Self {
        self.use_incremental_propagation = v;
        self
    }

    pub fn follow_weak_references(mut self, v: bool) -> Self {
        self.follow_weak_references = v;
        self
    }

    pub fn identity_index_threshold(mut self, v: usize) -> Self {
        self.identity_index_threshold = v;
        self
    }

    pub fn check_disposer_tree(mut self, v: bool) -> Self {
        self.check_disposer_tree = v;
        self
    }

    pub fn max_description_len(mut self, v: usize) -> Self {
        self.max_description_len = v;
        self
    }

    pub fn whitelist_rule(mut self, rule: WhitelistRule) -> Self {
        self.whitelist.push(rule);
        self
    }

    pub fn known_issue_rule(mut self, rule: WhitelistRule) -> Self {
        self.known_issues.push(rule);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // YAML
    // ═══════════════════════════════════════════════════════════════════════

    /// Load and validate a YAML v1 configuration file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        // Version check
        let version = export.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset: Preset = export.preset.parse()?;
        let mut config = Self::from_preset(preset);
        if let Some(overrides) = export.overrides {
            config.apply(overrides);
        }

        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, overrides: ConfigOverrides) {
        let ConfigOverrides {
            iterations,
            use_incremental_propagation,
            follow_weak_references,
            identity_index_threshold,
            check_disposer_tree,
            max_description_len,
            whitelist,
            known_issues,
        } = overrides;
        if let Some(v) = iterations {
            self.iterations = v;
        }
        if let Some(v) = use_incremental_propagation {
            self.use_incremental_propagation = v;
        }
        if let Some(v) = follow_weak_references {
            self.follow_weak_references = v;
        }
        if let Some(v) = identity_index_threshold {
            self.identity_index_threshold = v;
        }
        if let Some(v) = check_disposer_tree {
            self.check_disposer_tree = v;
        }
        if let Some(v) = max_description_len {
            self.max_description_len = v;
        }
        if let Some(v) = whitelist {
            self.whitelist = v;
        }
        if let Some(v) = known_issues {
            self.known_issues = v;
        }
    }

    /// Export as YAML v1: the preset plus every value as an override
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: Some(1),
            preset: self.preset.to_string(),
            overrides: Some(ConfigOverrides {
                iterations: Some(self.iterations),
                use_incremental_propagation: Some(self.use_incremental_propagation),
                follow_weak_references: Some(self.follow_weak_references),
                identity_index_threshold: Some(self.identity_index_threshold),
                check_disposer_tree: Some(self.check_disposer_tree),
                max_description_len: Some(self.max_description_len),
                whitelist: Some(self.whitelist.clone()),
                known_issues: Some(self.known_issues.clone()),
            }),
        };

        serde_yaml::to_string(&export).map_err(ConfigError::Yaml)
    }
}

impl Default for BleakConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

impl Validatable for BleakConfig {
    fn validate(&self) -> ConfigResult<()> {
        BleakConfig::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let fast = BleakConfig::from_preset(Preset::Fast);
        assert_eq!(fast.iterations, 2);
        assert!(fast.use_incremental_propagation);

        let balanced = BleakConfig::default();
        assert_eq!(balanced.iterations, 3);
        assert!(!balanced.use_incremental_propagation);
        assert!(balanced.check_disposer_tree);

        let thorough = BleakConfig::from_preset(Preset::Thorough);
        assert_eq!(thorough.iterations, 5);
        assert!(thorough.follow_weak_references);
    }

    #[test]
    fn test_all_presets_validate() {
        for preset in [Preset::Fast, Preset::Balanced, Preset::Thorough, Preset::Custom] {
            assert!(BleakConfig::from_preset(preset).validate().is_ok());
        }
    }

    #[test]
    fn test_range_errors() {
        let err = BleakConfig::default().iterations(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Range { ref field, .. } if field == "iterations"));

        let err = BleakConfig::default().max_description_len(4).validate().unwrap_err();
        assert!(err.to_string().contains("max_description_len"));

        assert!(BleakConfig::default().identity_index_threshold(0).validate().is_err());
    }

    #[test]
    fn test_invalid_whitelist_pattern() {
        let config = BleakConfig::default().whitelist_rule(WhitelistRule::pattern("[oops"));
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_overrides_apply_on_preset() {
        let config = BleakConfig::from_yaml_str(
            r#"
version: 1
preset: thorough
overrides:
  iterations: 7
"#,
        )
        .unwrap();
        assert_eq!(config.preset(), Preset::Thorough);
        assert_eq!(config.iterations, 7);
        assert!(config.follow_weak_references);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = BleakConfig::from_preset(Preset::Fast)
            .iterations(4)
            .known_issue_rule(WhitelistRule::root_type("Listener[]"));
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("preset: fast"));
        assert!(yaml.contains("kind: leak_root_type"));
        assert_eq!(BleakConfig::from_yaml_str(&yaml).unwrap(), config);
    }
}
