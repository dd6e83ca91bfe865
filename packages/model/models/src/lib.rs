#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Degradation model variant configuration types.
//!
//! A variant is one fitted predictive function: a base functional form, the
//! covariate set its coefficients were fit against, an optional district
//! group effect, and the fitted coefficient vector. Variants are grouped by
//! fitting approach into TOML files ([`VariantFile`]), one coefficient
//! vector per base form.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The two canonical nonlinear decay equations.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum BaseForm {
    /// `a + b * exp(-c * age)`
    #[serde(rename = "I")]
    #[strum(serialize = "I")]
    I,
    /// `a + b * exp(-c * (age - t0))`
    #[serde(rename = "II")]
    #[strum(serialize = "II")]
    II,
}

impl BaseForm {
    /// Short model label used in derived column names (`m1`, `m2`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::I => "m1",
            Self::II => "m2",
        }
    }

    /// Returns `true` if the form has a `t0` shift parameter.
    #[must_use]
    pub const fn has_shift(self) -> bool {
        matches!(self, Self::II)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::I, Self::II]
    }
}

/// Which covariates the `a`/`b`/`c` terms were fit against.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CovariateSet {
    /// Facility class indicators in `a`.
    Full,
    /// No facility class indicators.
    FacilityRemoved,
}

/// Where a district group effect is added.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroupEffectMode {
    /// Added to the asymptote `a`.
    Intercept,
    /// Added to the amplitude `b`.
    Amplitude,
}

/// District group effect configuration.
///
/// One coefficient per listed district is appended to the end of the
/// coefficient vector, in list order. Districts not listed contribute
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupEffectConfig {
    /// Which term the effect is added to.
    pub mode: GroupEffectMode,
    /// District abbreviations, in coefficient order.
    pub districts: Vec<String>,
}

/// Unique address of a variant: base form plus approach name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantKey {
    /// Base functional form.
    pub form: BaseForm,
    /// Fitting approach name (e.g. `"stepwise"`).
    pub name: String,
}

impl VariantKey {
    /// Creates a key.
    #[must_use]
    pub fn new(form: BaseForm, name: impl Into<String>) -> Self {
        Self {
            form,
            name: name.into(),
        }
    }

    /// Name of a derived column produced by this variant, e.g.
    /// `SN_stepwise_m1` for `prefix = "SN"`.
    #[must_use]
    pub fn column(&self, prefix: &str) -> String {
        format!("{prefix}_{}_{}", self.name, self.form.label())
    }
}

impl std::fmt::Display for VariantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.form)
    }
}

/// Coefficients fitted for one base form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormCoefficients {
    /// Base functional form.
    pub form: BaseForm,
    /// Positional coefficient vector.
    pub coefficients: Vec<f64>,
}

/// One fitting approach, as stored in a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantFile {
    /// Approach name, shared by every form in the file.
    pub name: String,
    /// Free-form notes about how the coefficients were obtained.
    #[serde(default)]
    pub description: Option<String>,
    /// Covariate set the coefficients were fit against.
    pub covariate_set: CovariateSet,
    /// Optional district group effect.
    #[serde(default)]
    pub group_effect: Option<GroupEffectConfig>,
    /// One entry per fitted base form.
    pub models: Vec<FormCoefficients>,
}

/// A single unvalidated variant, flattened out of a [`VariantFile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSpec {
    /// Unique address.
    pub key: VariantKey,
    /// Notes carried over from the file.
    pub description: Option<String>,
    /// Covariate set.
    pub covariate_set: CovariateSet,
    /// Optional district group effect.
    pub group_effect: Option<GroupEffectConfig>,
    /// Positional coefficient vector.
    pub coefficients: Vec<f64>,
}

impl VariantFile {
    /// Splits the file into one [`VariantSpec`] per base form.
    #[must_use]
    pub fn into_specs(self) -> Vec<VariantSpec> {
        let Self {
            name,
            description,
            covariate_set,
            group_effect,
            models,
        } = self;

        models
            .into_iter()
            .map(|model| VariantSpec {
                key: VariantKey::new(model.form, name.clone()),
                description: description.clone(),
                covariate_set,
                group_effect: group_effect.clone(),
                coefficients: model.coefficients,
            })
            .collect()
    }
}
