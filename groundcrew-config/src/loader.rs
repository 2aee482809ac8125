//! Loads a persisted `FeatureLayer` from a TOML file and/or `GROUNDCREW_`
//! prefixed environment variables, using the same builder pattern the
//! `config` crate documents for layered file + env loading.

use crate::feature_set::FeatureLayer;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load a `FeatureLayer` from an optional TOML file path, overlaid with any
/// `GROUNDCREW_*` environment variables (e.g. `GROUNDCREW_TOP_K=12`).
///
/// A missing `path` is not an error: the layer resolves to all-`None` and
/// the caller's defaults apply unchanged.
pub fn load_persisted_layer(path: Option<&std::path::Path>) -> Result<FeatureLayer> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(false));
    }
    builder = builder.add_source(config::Environment::with_prefix("GROUNDCREW").separator("_"));
    let source = builder.build()?;
    Ok(source.try_deserialize().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_overrides_from_a_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "top_k = 12\nenable_critic = false").unwrap();
        let layer = load_persisted_layer(Some(file.path())).unwrap();
        assert_eq!(layer.top_k, Some(12));
        assert_eq!(layer.enable_critic, Some(false));
        assert_eq!(layer.enable_crag, None);
    }

    #[test]
    fn missing_file_resolves_to_an_empty_layer() {
        let layer = load_persisted_layer(Some(std::path::Path::new("/nonexistent/path.toml"))).unwrap();
        assert_eq!(layer.top_k, None);
    }
}
