//! Application configuration file.
//!
//! Every field is optional; command-line flags and their environment
//! variables take precedence over the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Prefix of prediction columns when nothing else is configured.
pub const DEFAULT_PREDICTION_PREFIX: &str = "SN";

/// Contents of the TOML config file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
pub struct AppConfig {
    /// Segment-year CSV.
    pub segments: Option<PathBuf>,
    /// County reference CSV.
    pub geography: Option<PathBuf>,
    /// Credentials TOML. When set, data commands require a login.
    pub credentials: Option<PathBuf>,
    /// Extra variant files loaded after the built-in catalog.
    pub variants: Vec<PathBuf>,
    /// Threshold used when `--threshold` is not given.
    pub default_threshold: Option<f64>,
    /// Prefix of prediction columns.
    pub prediction_prefix: Option<String>,
}

impl AppConfig {
    /// Reads a config file. Relative paths inside it are resolved against
    /// the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        let config = Self::from_toml(&contents)
            .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(match path.parent() {
            Some(base) => config.resolve(base),
            None => config,
        })
    }

    /// Parses a config document.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the document is malformed.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(toml_str)
    }

    fn resolve(self, base: &Path) -> Self {
        let resolve = |path: PathBuf| {
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        };
        Self {
            segments: self.segments.map(resolve),
            geography: self.geography.map(resolve),
            credentials: self.credentials.map(resolve),
            variants: self.variants.into_iter().map(resolve).collect(),
            ..self
        }
    }

    /// Prediction column prefix, falling back to the default.
    #[must_use]
    pub fn prediction_prefix(&self) -> &str {
        self.prediction_prefix
            .as_deref()
            .unwrap_or(DEFAULT_PREDICTION_PREFIX)
    }
}
