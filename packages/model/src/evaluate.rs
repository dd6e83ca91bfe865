//! Model evaluation over a covariate frame.
//!
//! Evaluation is pure: the same variant and frame always produce the same
//! columns, bit for bit. Non-finite covariates are not an error here; they
//! flow through to non-finite predictions, which aggregation drops.

use friction_map_frame::CovariateFrame;
use friction_map_model_models::{BaseForm, GroupEffectMode};
use friction_map_segment_models::{Category as _, Covariate};

use crate::layout::Term;
use crate::variant::{AffineTerm, ModelVariant};
use crate::{ConfigurationError, ModelError};

/// Per-row decay parameters of a variant.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayTerms {
    /// Form of the variant the terms came from.
    pub form: BaseForm,
    /// Asymptote, one per row.
    pub a: Vec<f64>,
    /// Amplitude, one per row.
    pub b: Vec<f64>,
    /// Decay rate, one per row.
    pub c: Vec<f64>,
    /// Age shift (Form II only).
    pub t0: Option<f64>,
}

impl DecayTerms {
    /// Combines the terms with an age column into predictions.
    ///
    /// `age` must have one value per row.
    #[must_use]
    pub fn predict(&self, age: &[f64]) -> Vec<f64> {
        let rows = self.a.iter().zip(&self.b).zip(&self.c).zip(age);
        match (self.form, self.t0) {
            (BaseForm::II, Some(t0)) => rows
                .map(|(((&a, &b), &c), &age)| a + b * (-c * (age - t0)).exp())
                .collect(),
            _ => rows
                .map(|(((&a, &b), &c), &age)| a + b * (-c * age).exp())
                .collect(),
        }
    }
}

/// Fails with [`ConfigurationError::MissingCovariate`] unless the frame
/// carries every covariate the variant reads.
fn check_covariates(variant: &ModelVariant, frame: &CovariateFrame) -> Result<(), ConfigurationError> {
    for column in variant.required_covariates() {
        if frame.covariate(column).is_none() {
            return Err(ConfigurationError::MissingCovariate {
                key: variant.key().clone(),
                column,
            });
        }
    }
    Ok(())
}

fn affine_column(term: &AffineTerm, frame: &CovariateFrame) -> Vec<f64> {
    let mut out = vec![term.constant; frame.len()];

    for &(regressor, coefficient) in &term.terms {
        match regressor {
            Term::Facility(level) => {
                for (value, facility) in out.iter_mut().zip(frame.facility()) {
                    *value += coefficient * facility.indicator(level);
                }
            }
            Term::Pavement(level) => {
                for (value, pavement) in out.iter_mut().zip(frame.pavement()) {
                    *value += coefficient * pavement.indicator(level);
                }
            }
            Term::Covariate(covariate) => {
                // Presence is checked before any column is built.
                let Some(column) = frame.covariate(covariate) else {
                    continue;
                };
                for (value, x) in out.iter_mut().zip(column) {
                    *value += coefficient * x;
                }
            }
        }
    }

    out
}

/// Computes the per-row `a`, `b`, `c` (and `t0`) of a variant.
///
/// A district group effect is added to `a` or `b` according to its mode;
/// `c` never receives one.
///
/// # Errors
///
/// Returns [`ConfigurationError::MissingCovariate`] if the frame lacks a
/// covariate the variant needs.
pub fn evaluate_terms(
    variant: &ModelVariant,
    frame: &CovariateFrame,
) -> Result<DecayTerms, ConfigurationError> {
    check_covariates(variant, frame)?;

    let mut a = affine_column(variant.a(), frame);
    let mut b = affine_column(variant.b(), frame);
    let c = affine_column(variant.c(), frame);

    if let Some(group) = variant.group_effect() {
        let target = match group.mode {
            GroupEffectMode::Intercept => &mut a,
            GroupEffectMode::Amplitude => &mut b,
        };
        for (value, geography) in target.iter_mut().zip(frame.geography()) {
            *value += group.effect(&geography.district_abbr);
        }
    }

    Ok(DecayTerms {
        form: variant.form(),
        a,
        b,
        c,
        t0: variant.t0(),
    })
}

/// Predicts the friction metric for every row of the frame.
///
/// # Errors
///
/// Returns [`ConfigurationError::MissingCovariate`] if the frame lacks a
/// covariate the variant needs.
pub fn evaluate(
    variant: &ModelVariant,
    frame: &CovariateFrame,
) -> Result<Vec<f64>, ConfigurationError> {
    let terms = evaluate_terms(variant, frame)?;
    let age = frame
        .covariate(Covariate::Age)
        .ok_or_else(|| ConfigurationError::MissingCovariate {
            key: variant.key().clone(),
            column: Covariate::Age,
        })?;

    log::debug!("Evaluated {} over {} rows", variant.key(), frame.len());
    Ok(terms.predict(age))
}

/// Evaluates a variant and appends its prediction as
/// `<prefix>_<name>_<m1|m2>`.
///
/// # Errors
///
/// * [`ModelError::Configuration`] if the frame lacks a needed covariate.
/// * [`ModelError::Frame`] if the column already exists.
pub fn append_predictions(
    variant: &ModelVariant,
    frame: CovariateFrame,
    prefix: &str,
) -> Result<CovariateFrame, ModelError> {
    let predictions = evaluate(variant, &frame)?;
    Ok(frame.with_column(&variant.key().column(prefix), predictions)?)
}

/// Evaluates a variant and appends `a`, `b`, `c` (and `t0` for Form II)
/// as `a_<name>_<m1|m2>` and so on.
///
/// # Errors
///
/// Same as [`append_predictions`].
pub fn append_terms(
    variant: &ModelVariant,
    frame: CovariateFrame,
) -> Result<CovariateFrame, ModelError> {
    let terms = evaluate_terms(variant, &frame)?;
    let key = variant.key();
    let rows = frame.len();

    let mut frame = frame
        .with_column(&key.column("a"), terms.a)?
        .with_column(&key.column("b"), terms.b)?
        .with_column(&key.column("c"), terms.c)?;
    if let Some(t0) = terms.t0 {
        frame = frame.with_column(&key.column("t0"), vec![t0; rows])?;
    }
    Ok(frame)
}
