#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pavement friction degradation models.
//!
//! Holds the catalog of fitted model variants and evaluates them over a
//! [`CovariateFrame`](friction_map_frame::CovariateFrame). Every variant is
//! one of two decay forms:
//!
//! * Form I: `a + b * exp(-c * age)`
//! * Form II: `a + b * exp(-c * (age - t0))`
//!
//! where `a`, `b` and `c` are affine in a per-variant subset of the
//! covariates. The positional coefficient order for each (form, covariate
//! set) pair lives in [`layout`] and nowhere else.

pub mod evaluate;
pub mod layout;
pub mod registry;
pub mod selection;
pub mod sensitivity;
pub mod variant;

pub use evaluate::{DecayTerms, append_predictions, append_terms, evaluate, evaluate_terms};
pub use registry::ModelRegistry;
pub use selection::select_for_variant;
pub use variant::ModelVariant;

use friction_map_frame::FrameError;
use friction_map_model_models::VariantKey;
use friction_map_segment_models::Covariate;
use thiserror::Error;

/// Fatal model configuration problems. These abort the request; they are
/// never recovered from inside the model layer.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The coefficient vector does not match the variant's layout.
    #[error("Variant {key} expects {expected} coefficients, got {actual}")]
    ParameterCount {
        /// Variant being built.
        key: VariantKey,
        /// Coefficients implied by form, covariate set and group effect.
        expected: usize,
        /// Coefficients supplied.
        actual: usize,
    },

    /// A coefficient is NaN or infinite.
    #[error("Variant {key} has a non-finite coefficient at position {position}")]
    NonFiniteCoefficient {
        /// Variant being built.
        key: VariantKey,
        /// Position in the coefficient vector.
        position: usize,
    },

    /// The frame lacks a covariate the variant needs.
    #[error("Variant {key} requires covariate column {column}")]
    MissingCovariate {
        /// Variant being evaluated.
        key: VariantKey,
        /// The absent column.
        column: Covariate,
    },

    /// Two variants share a key.
    #[error("Variant {key} is defined more than once")]
    DuplicateVariant {
        /// The repeated key.
        key: VariantKey,
    },

    /// No variant with this key is registered.
    #[error("Unknown variant {key}")]
    UnknownVariant {
        /// The requested key.
        key: VariantKey,
    },

    /// A variant file could not be parsed or is inconsistent.
    #[error("Invalid variant config {source_name}: {message}")]
    InvalidConfig {
        /// File or embedded config name.
        source_name: String,
        /// Description of what went wrong.
        message: String,
    },
}

/// Errors from operations that touch both the model and the frame.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Model configuration problem.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Frame construction or extension problem.
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
}
