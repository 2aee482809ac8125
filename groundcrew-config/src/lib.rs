//! ABOUTME: Feature flags and layered configuration for the groundcrew turn pipeline

pub mod feature_set;
pub mod loader;

pub use feature_set::{apply, merge, FeatureLayer, FeatureSet};
pub use loader::{load_persisted_layer, ConfigError};
