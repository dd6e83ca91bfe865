//! Validated model variants.
//!
//! [`ModelVariant::from_spec`] is the only place a positional coefficient
//! vector is sliced. Everything downstream works with named [`Term`]s.

use std::collections::BTreeMap;

use friction_map_model_models::{
    BaseForm, CovariateSet, GroupEffectMode, VariantKey, VariantSpec,
};
use friction_map_segment_models::Covariate;

use crate::ConfigurationError;
use crate::layout::{Layout, Term};

/// `constant + sum(coefficient * regressor)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTerm {
    /// Constant part.
    pub constant: f64,
    /// Regressors and their coefficients, in layout order.
    pub terms: Vec<(Term, f64)>,
}

impl AffineTerm {
    fn take(constant: f64, regressors: &[Term], coefficients: &[f64]) -> Self {
        Self {
            constant,
            terms: regressors
                .iter()
                .copied()
                .zip(coefficients.iter().copied())
                .collect(),
        }
    }

    /// Coefficient of a regressor, if the term uses it.
    #[must_use]
    pub fn coefficient(&self, term: Term) -> Option<f64> {
        self.terms
            .iter()
            .find(|(t, _)| *t == term)
            .map(|&(_, coefficient)| coefficient)
    }
}

/// Per-district additive effect.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEffect {
    /// Which term receives the effect.
    pub mode: GroupEffectMode,
    /// District abbreviation to coefficient.
    pub coefficients: BTreeMap<String, f64>,
}

impl GroupEffect {
    /// Effect for a district; zero for districts without a coefficient.
    #[must_use]
    pub fn effect(&self, district_abbr: &str) -> f64 {
        self.coefficients.get(district_abbr).copied().unwrap_or(0.0)
    }
}

/// A fitted variant with its coefficient vector split into named terms.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVariant {
    key: VariantKey,
    description: Option<String>,
    covariate_set: CovariateSet,
    layout: Layout,
    a: AffineTerm,
    b: AffineTerm,
    c: AffineTerm,
    t0: Option<f64>,
    group: Option<GroupEffect>,
}

impl ModelVariant {
    /// Validates a [`VariantSpec`] and splits its coefficient vector by layout.
    ///
    /// # Errors
    ///
    /// * [`ConfigurationError::ParameterCount`] if the vector length does
    ///   not match the form, covariate set and group effect.
    /// * [`ConfigurationError::NonFiniteCoefficient`] if any coefficient is
    ///   NaN or infinite.
    /// * [`ConfigurationError::InvalidConfig`] if a group-effect district
    ///   is listed twice.
    pub fn from_spec(spec: VariantSpec) -> Result<Self, ConfigurationError> {
        let VariantSpec {
            key,
            description,
            covariate_set,
            group_effect,
            coefficients,
        } = spec;

        let layout = Layout::of(key.form, covariate_set);
        let districts = group_effect
            .as_ref()
            .map_or(&[][..], |group| group.districts.as_slice());
        let expected = layout.base_len() + districts.len();

        if coefficients.len() != expected {
            return Err(ConfigurationError::ParameterCount {
                key,
                expected,
                actual: coefficients.len(),
            });
        }
        if let Some(position) = coefficients.iter().position(|x| !x.is_finite()) {
            return Err(ConfigurationError::NonFiniteCoefficient { key, position });
        }

        let (a_block, rest) = coefficients.split_at(1 + layout.a.len());
        let (b_block, rest) = rest.split_at(1 + layout.b.len());
        let (c_block, rest) = rest.split_at(1 + layout.c.len());
        let (t0, group_block) = if layout.shift {
            (Some(rest[0]), &rest[1..])
        } else {
            (None, rest)
        };

        let group = match group_effect {
            Some(config) => {
                let mut by_district = BTreeMap::new();
                for (district, &coefficient) in config.districts.iter().zip(group_block) {
                    if by_district.insert(district.clone(), coefficient).is_some() {
                        return Err(ConfigurationError::InvalidConfig {
                            source_name: key.to_string(),
                            message: format!("district {district} listed twice in group effect"),
                        });
                    }
                }
                Some(GroupEffect {
                    mode: config.mode,
                    coefficients: by_district,
                })
            }
            None => None,
        };

        Ok(Self {
            a: AffineTerm::take(a_block[0], layout.a, &a_block[1..]),
            b: AffineTerm::take(b_block[0], layout.b, &b_block[1..]),
            c: AffineTerm::take(c_block[0], layout.c, &c_block[1..]),
            t0,
            group,
            key,
            description,
            covariate_set,
            layout,
        })
    }

    /// Unique address of this variant.
    #[must_use]
    pub const fn key(&self) -> &VariantKey {
        &self.key
    }

    /// Base functional form.
    #[must_use]
    pub const fn form(&self) -> BaseForm {
        self.key.form
    }

    /// Notes about the fit.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Covariate set the coefficients were fit against.
    #[must_use]
    pub const fn covariate_set(&self) -> CovariateSet {
        self.covariate_set
    }

    /// Asymptote term `a`.
    #[must_use]
    pub const fn a(&self) -> &AffineTerm {
        &self.a
    }

    /// Amplitude term `b`.
    #[must_use]
    pub const fn b(&self) -> &AffineTerm {
        &self.b
    }

    /// Decay rate term `c`.
    #[must_use]
    pub const fn c(&self) -> &AffineTerm {
        &self.c
    }

    /// Age shift, Form II only.
    #[must_use]
    pub const fn t0(&self) -> Option<f64> {
        self.t0
    }

    /// District group effect, if any.
    #[must_use]
    pub const fn group_effect(&self) -> Option<&GroupEffect> {
        self.group.as_ref()
    }

    /// Continuous covariates a frame must carry to evaluate this variant.
    #[must_use]
    pub fn required_covariates(&self) -> Vec<Covariate> {
        self.layout.covariates()
    }

    /// Total number of coefficients, group effect included.
    #[must_use]
    pub fn coefficient_count(&self) -> usize {
        self.layout.base_len() + self.group.as_ref().map_or(0, |g| g.coefficients.len())
    }
}
