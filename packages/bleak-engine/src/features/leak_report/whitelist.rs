//! Whitelist rules
//!
//! Rules are plain data so they can live in YAML configuration; a
//! [`Whitelist`] compiles them once (regexes included) together with any
//! programmatic predicates. The same machinery serves the known-issue list.

use super::leak_info::LeakInfo;
use crate::config::error::{ConfigError, ConfigResult};
use crate::config::Validatable;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Caller-supplied match on a leak candidate
pub type LeakPredicate = Arc<dyn Fn(&LeakInfo) -> bool + Send + Sync>;

/// Declarative match on a leak signature
///
/// Element lists match signature parts (`StartType#what` elements followed by
/// the leak root's type); `*` matches any single part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WhitelistRule {
    /// Parts occur as a contiguous run anywhere in the signature
    SignatureContains { elements: Vec<String> },
    /// Parts are the tail of the signature
    SignatureEndsWith { elements: Vec<String> },
    /// Leak root has exactly this type
    LeakRootType { name: String },
    /// Regex searched in the rendered signature
    Pattern { regex: String },
}

impl WhitelistRule {
    pub fn contains<I, S>(elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::SignatureContains {
            elements: elements.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ends_with<I, S>(elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::SignatureEndsWith {
            elements: elements.into_iter().map(Into::into).collect(),
        }
    }

    pub fn root_type(name: impl Into<String>) -> Self {
        Self::LeakRootType { name: name.into() }
    }

    pub fn pattern(regex: impl Into<String>) -> Self {
        Self::Pattern { regex: regex.into() }
    }

    /// Rules that would match every signature are rejected; they silently
    /// swallow all leaks
    fn compile(&self) -> ConfigResult<CompiledRule> {
        Ok(match self {
            Self::SignatureContains { elements } | Self::SignatureEndsWith { elements }
                if elements.is_empty() =>
            {
                return Err(ConfigError::Validation(format!(
                    "whitelist rule '{}' has no elements and would match every leak",
                    self
                )));
            }
            Self::Pattern { regex } if regex.is_empty() => {
                return Err(ConfigError::Validation(
                    "whitelist pattern is empty and would match every leak".to_string(),
                ));
            }
            Self::SignatureContains { elements } => CompiledRule::Contains(elements.clone()),
            Self::SignatureEndsWith { elements } => CompiledRule::EndsWith(elements.clone()),
            Self::LeakRootType { name } => CompiledRule::RootType(name.clone()),
            Self::Pattern { regex } => {
                CompiledRule::Pattern(Regex::new(regex).map_err(|e| ConfigError::InvalidPattern {
                    pattern: regex.clone(),
                    message: e.to_string(),
                })?)
            }
        })
    }
}

impl Validatable for WhitelistRule {
    fn validate(&self) -> ConfigResult<()> {
        self.compile().map(|_| ())
    }
}

impl fmt::Display for WhitelistRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignatureContains { elements } => write!(f, "contains [{}]", elements.join(" -> ")),
            Self::SignatureEndsWith { elements } => write!(f, "ends with [{}]", elements.join(" -> ")),
            Self::LeakRootType { name } => write!(f, "root type {}", name),
            Self::Pattern { regex } => write!(f, "pattern /{}/", regex),
        }
    }
}

#[derive(Clone)]
enum CompiledRule {
    Contains(Vec<String>),
    EndsWith(Vec<String>),
    RootType(String),
    Pattern(Regex),
    Predicate(LeakPredicate),
}

impl CompiledRule {
    fn matches(&self, leak: &LeakInfo, rendered: &str) -> bool {
        match self {
            Self::Contains(elements) => leak.signature.contains_run(elements),
            Self::EndsWith(elements) => leak.signature.ends_with(elements),
            Self::RootType(name) => leak.type_name == *name,
            Self::Pattern(regex) => regex.is_match(rendered),
            Self::Predicate(predicate) => predicate(leak),
        }
    }
}

/// Compiled rule set; matches when any rule matches
#[derive(Clone, Default)]
pub struct Whitelist {
    rules: Vec<CompiledRule>,
}

impl Whitelist {
    pub fn compile(rules: &[WhitelistRule], predicates: &[LeakPredicate]) -> ConfigResult<Self> {
        let mut compiled = rules
            .iter()
            .map(WhitelistRule::compile)
            .collect::<ConfigResult<Vec<_>>>()?;
        compiled.extend(predicates.iter().cloned().map(CompiledRule::Predicate));
        Ok(Self { rules: compiled })
    }

    pub fn matches(&self, leak: &LeakInfo) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let rendered = leak.signature.to_string();
        self.rules.iter().any(|rule| rule.matches(leak, &rendered))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Debug for Whitelist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Whitelist").field("rules", &self.rules.len()).finish()
    }
}
