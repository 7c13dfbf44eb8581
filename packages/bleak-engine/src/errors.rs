//! Error types for bleak-engine
//!
//! Provides unified error handling across the crate.

use crate::config::error::ConfigError;
use crate::features::leak_report::BleakResult;
use crate::shared::models::ObjectId;
use thiserror::Error;

/// Error raised by the user-supplied scenario, propagated unmodified
pub type ScenarioError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for bleak-engine operations
#[derive(Debug, Error)]
pub enum BleakError {
    /// Non-whitelisted growth survived to the terminal graph
    #[error("memory leak detected\n{0}")]
    LeakDetected(Box<BleakResult>),

    /// Every object must be claimed by some expander
    #[error("no expander can handle {object} of type '{type_name}'")]
    NoMatchingExpander { object: ObjectId, type_name: String },

    /// Root object unknown to the backend
    #[error("root object {0} is not known to the introspection backend")]
    UnknownRoot(ObjectId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The scenario itself failed
    #[error(transparent)]
    Scenario(ScenarioError),

    /// Internal invariant violated
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BleakError {
    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        BleakError::Internal(msg.into())
    }

    /// True when the run failed because of detected growth
    pub fn is_leak(&self) -> bool {
        matches!(self, BleakError::LeakDetected(_))
    }

    /// Result carried by a leak failure
    pub fn leak_result(&self) -> Option<&BleakResult> {
        match self {
            BleakError::LeakDetected(result) => Some(result),
            _ => None,
        }
    }
}

/// Result type alias for bleak operations
pub type Result<T> = std::result::Result<T, BleakError>;
