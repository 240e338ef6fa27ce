//! Configuration module.
//!
//! Switches read once when a comparator, derive context or renderer is built.

mod settings;

pub use settings::{ComparatorSettings, DeriveSettings, RenderSettings, Settings, SettingsError};
