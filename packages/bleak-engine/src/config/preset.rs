//! Presets: named starting points for a leak check
//!
//! A preset fixes how many measured runs are made and how each snapshot is
//! compared; everything else starts from the same defaults. See
//! [`BleakConfig::from_preset`](super::BleakConfig::from_preset) for values.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Two measured runs, incremental replay after the first comparison
    Fast,
    /// Three measured runs, every snapshot fully expanded
    #[default]
    Balanced,
    /// Five measured runs; also looks behind weak/soft references
    Thorough,
    /// Balanced values, expected to be overridden
    Custom,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Fast, Preset::Balanced, Preset::Thorough, Preset::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Thorough => "thorough",
            Self::Custom => "custom",
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    /// Case-insensitive preset name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
