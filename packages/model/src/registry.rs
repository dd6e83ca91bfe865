//! Model registry: loads variant definitions from TOML.
//!
//! The built-in fitting approaches in `packages/model/variants/` are baked
//! into the binary at compile time via [`include_str!`]. Further approaches
//! (for example district group-effect fits) are loaded from files at
//! startup with [`ModelRegistry::load_toml`]. The registry is immutable once
//! the application has finished loading.

use std::collections::BTreeMap;

use friction_map_model_models::{VariantFile, VariantKey};

use crate::ConfigurationError;
use crate::variant::ModelVariant;

/// TOML configs embedded at compile time.
const BUILTIN_TOMLS: &[(&str, &str)] = &[
    // ── Full covariate set ───────────────────────────────────────────
    ("stepwise", include_str!("../variants/stepwise.toml")),
    ("step_iter", include_str!("../variants/step_iter.toml")),
    // ── Facility removed ─────────────────────────────────────────────
    (
        "remove_facility",
        include_str!("../variants/remove_facility.toml"),
    ),
];

/// Parses a variant file.
///
/// # Errors
///
/// Returns the parser's message if the TOML is malformed or does not match
/// the [`VariantFile`] schema.
pub fn parse_variant_toml(toml_str: &str) -> Result<VariantFile, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}

/// Catalog of validated variants, addressed by [`VariantKey`].
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    variants: BTreeMap<VariantKey, ModelVariant>,
}

impl ModelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in variant.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if an embedded config is malformed.
    pub fn builtin() -> Result<Self, ConfigurationError> {
        let mut registry = Self::new();
        for (name, toml) in BUILTIN_TOMLS {
            registry.load_toml(name, toml)?;
        }
        Ok(registry)
    }

    /// Parses a variant file and registers each of its forms.
    ///
    /// Every form is validated before any is registered, so a failed load
    /// leaves the registry unchanged. Returns the number of variants added.
    ///
    /// # Errors
    ///
    /// * [`ConfigurationError::InvalidConfig`] if the TOML does not parse.
    /// * Any error from [`ModelVariant::from_spec`] or [`Self::register`].
    pub fn load_toml(&mut self, source_name: &str, toml: &str) -> Result<usize, ConfigurationError> {
        let file = parse_variant_toml(toml).map_err(|message| ConfigurationError::InvalidConfig {
            source_name: source_name.to_string(),
            message,
        })?;

        let mut loaded: BTreeMap<VariantKey, ModelVariant> = BTreeMap::new();
        for spec in file.into_specs() {
            let variant = ModelVariant::from_spec(spec)?;
            let key = variant.key().clone();
            if self.variants.contains_key(&key) || loaded.contains_key(&key) {
                return Err(ConfigurationError::DuplicateVariant { key });
            }
            loaded.insert(key, variant);
        }

        let count = loaded.len();
        self.variants.extend(loaded);

        log::info!("Loaded {count} model variants from {source_name}");
        Ok(count)
    }

    /// Adds a variant.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateVariant`] if the key is taken.
    pub fn register(&mut self, variant: ModelVariant) -> Result<(), ConfigurationError> {
        let key = variant.key().clone();
        if self.variants.contains_key(&key) {
            return Err(ConfigurationError::DuplicateVariant { key });
        }
        self.variants.insert(key, variant);
        Ok(())
    }

    /// Looks up a variant.
    #[must_use]
    pub fn get(&self, key: &VariantKey) -> Option<&ModelVariant> {
        self.variants.get(key)
    }

    /// Looks up a variant that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownVariant`] if it is not
    /// registered.
    pub fn require(&self, key: &VariantKey) -> Result<&ModelVariant, ConfigurationError> {
        self.get(key)
            .ok_or_else(|| ConfigurationError::UnknownVariant { key: key.clone() })
    }

    /// All variants, ordered by key.
    pub fn variants(&self) -> impl Iterator<Item = &ModelVariant> {
        self.variants.values()
    }

    /// Number of registered variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}
