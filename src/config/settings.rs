//! TOML-based configuration for constraint derivation.
//!
//! Example configuration:
//! ```toml
//! [comparator]
//! enable_const_eval = true
//! builtin_int_comparator = false
//!
//! [derive]
//! array_expansion_threshold = 100
//!
//! [render]
//! array_predicates = true
//! ```
//!
//! Every section and key is optional; missing values take the defaults above.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Datum comparator switches.
    pub comparator: ComparatorSettings,

    /// Constraint derivation limits.
    pub derive: DeriveSettings,

    /// Predicate rendering switches.
    pub render: RenderSettings,
}

/// Datum comparator switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ComparatorSettings {
    /// Allow the comparator to hand comparisons to the constant evaluator.
    /// When off, only native integer types are constrainable.
    pub enable_const_eval: bool,

    /// Compare native integers numerically even when evaluation is enabled.
    pub builtin_int_comparator: bool,
}

impl Default for ComparatorSettings {
    fn default() -> Self {
        Self {
            enable_const_eval: true,
            builtin_int_comparator: false,
        }
    }
}

impl ComparatorSettings {
    /// Whether integer pairs skip the evaluator.
    pub fn use_int_fast_path(&self) -> bool {
        self.builtin_int_comparator || !self.enable_const_eval
    }
}

/// Constraint derivation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeriveSettings {
    /// Arrays with more elements than this are not expanded into point ranges.
    pub array_expansion_threshold: usize,
}

impl Default for DeriveSettings {
    fn default() -> Self {
        Self {
            array_expansion_threshold: 100,
        }
    }
}

/// Predicate rendering switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Render point sets as `IN` / `NOT IN` array comparisons.
    pub array_predicates: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            array_predicates: true,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        content.parse()
    }

    /// Check values that deserialize fine but make no sense.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.derive.array_expansion_threshold == 0 {
            return Err(SettingsError::InvalidConfig(
                "derive.array_expansion_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl FromStr for Settings {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let settings: Settings = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }
}
