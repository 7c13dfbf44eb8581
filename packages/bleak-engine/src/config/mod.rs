//! Configuration
//!
//! - Level 1: [`Preset`] - one-liner defaults
//! - Level 2: builder overrides on [`BleakConfig`] / [`BleakOptions`]
//! - Level 3: YAML v1 files (`version`, `preset`, `overrides`)
//!
//! ```rust,ignore
//! use bleak_engine::config::{BleakConfig, BleakOptions, Preset};
//!
//! let options = BleakOptions::from_preset(Preset::Fast).iterations(4);
//! let options = BleakOptions::new(BleakConfig::from_yaml("leak-check.yaml")?);
//! ```

pub mod bleak_config;
pub mod error;
pub mod io;
pub mod options;
pub mod preset;

pub use bleak_config::{BleakConfig, Validatable};
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigExportV1, ConfigOverrides};
pub use options::BleakOptions;
pub use preset::Preset;
