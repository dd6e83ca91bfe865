//! One-factor-at-a-time sensitivity curves.
//!
//! A synthetic segment is held at a baseline while one factor sweeps its
//! levels. For every level the variant is evaluated over a grid of ages,
//! giving one predicted friction curve per (factor, level).

use friction_map_frame::CovariateFrame;
use friction_map_geography_models::CountyDistrict;
use friction_map_segment_models::{Category as _, FacilityClass, PavementType, SegmentYearRecord};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::ConfigurationError;
use crate::evaluate::evaluate;
use crate::variant::ModelVariant;

/// A factor varied by the sensitivity analysis. Names follow the input
/// column spellings.
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
pub enum Factor {
    /// Pavement type.
    #[serde(rename = "PAV_TYPE")]
    #[strum(serialize = "PAV_TYPE")]
    Pavement,
    /// Facility class.
    #[serde(rename = "HIGHWAY_FUN")]
    #[strum(serialize = "HIGHWAY_FUN")]
    Facility,
    /// Annual average daily traffic.
    #[serde(rename = "AADT")]
    #[strum(serialize = "AADT")]
    Aadt,
    /// Truck share of traffic, percent.
    #[serde(rename = "TRUCK_PCT")]
    #[strum(serialize = "TRUCK_PCT")]
    TruckPct,
    /// Average temperature.
    #[serde(rename = "tavg")]
    #[strum(serialize = "tavg")]
    Tavg,
    /// Annual precipitation.
    #[serde(rename = "prcp")]
    #[strum(serialize = "prcp")]
    Prcp,
}

impl Factor {
    /// Returns all variants of this enum, in sweep order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Pavement,
            Self::Facility,
            Self::Aadt,
            Self::TruckPct,
            Self::Tavg,
            Self::Prcp,
        ]
    }
}

/// The segment every factor is varied around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    /// Facility class.
    pub facility: FacilityClass,
    /// Pavement type.
    pub pavement: PavementType,
    /// Annual average daily traffic.
    pub aadt: f64,
    /// Truck percentage.
    pub truck_pct: f64,
    /// Average temperature.
    pub tavg: f64,
    /// Precipitation.
    pub prcp: f64,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            facility: FacilityClass::FarmRoad,
            pavement: PavementType::ThickAsphalt,
            aadt: 5000.0,
            truck_pct: 15.0,
            tavg: 67.0,
            prcp: 35.0,
        }
    }
}

/// Ages, baseline and numeric levels for a sensitivity run.
///
/// Categorical factors always sweep every modeled level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SensitivityPlan {
    /// Ages every curve is evaluated at.
    pub ages: Vec<f64>,
    /// Values held fixed while another factor varies.
    pub baseline: Baseline,
    /// AADT levels.
    pub aadt: Vec<f64>,
    /// Truck percentage levels.
    pub truck_pct: Vec<f64>,
    /// Temperature levels.
    pub tavg: Vec<f64>,
    /// Precipitation levels.
    pub prcp: Vec<f64>,
}

impl SensitivityPlan {
    /// Age grid from `start` (inclusive) to `end` (exclusive) by `step`.
    #[must_use]
    pub fn age_grid(start: f64, end: f64, step: f64) -> Vec<f64> {
        if step <= 0.0 || !step.is_finite() {
            return Vec::new();
        }
        std::iter::successors(Some(0_u32), |i| i.checked_add(1))
            .map(|i| step.mul_add(f64::from(i), start))
            .take_while(|&age| age < end)
            .collect()
    }
}

impl Default for SensitivityPlan {
    fn default() -> Self {
        Self {
            ages: Self::age_grid(0.0, 10.0, 0.5),
            baseline: Baseline::default(),
            aadt: vec![2000.0, 5000.0, 15000.0],
            truck_pct: vec![10.0, 15.0, 25.0],
            tavg: vec![56.0, 67.0, 72.0],
            prcp: vec![33.0, 35.0, 45.0],
        }
    }
}

/// One predicted point on a curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Segment age in years.
    pub age: f64,
    /// Predicted friction.
    pub predicted: f64,
}

/// Predictions over the age grid for one level of one factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCurve {
    /// Factor being varied.
    pub factor: Factor,
    /// Level label, e.g. `"CRCP"` or `"15000"`.
    pub level: String,
    /// One point per age, in age order.
    pub points: Vec<CurvePoint>,
}

/// A baseline segment tweaked for one level.
#[derive(Debug, Clone, Copy)]
struct Scenario {
    factor: Factor,
    facility: FacilityClass,
    pavement: PavementType,
    aadt: f64,
    truck_pct: f64,
    tavg: f64,
    prcp: f64,
}

impl Scenario {
    const fn from_baseline(factor: Factor, baseline: &Baseline) -> Self {
        Self {
            factor,
            facility: baseline.facility,
            pavement: baseline.pavement,
            aadt: baseline.aadt,
            truck_pct: baseline.truck_pct,
            tavg: baseline.tavg,
            prcp: baseline.prcp,
        }
    }

    fn level(&self) -> String {
        match self.factor {
            Factor::Pavement => self.pavement.to_string(),
            Factor::Facility => self.facility.to_string(),
            Factor::Aadt => self.aadt.to_string(),
            Factor::TruckPct => self.truck_pct.to_string(),
            Factor::Tavg => self.tavg.to_string(),
            Factor::Prcp => self.prcp.to_string(),
        }
    }

    fn record(&self, age: f64) -> SegmentYearRecord {
        SegmentYearRecord {
            geography: CountyDistrict::default(),
            contract: None,
            facility: self.facility,
            pavement: self.pavement,
            age: Some(age),
            aadt: Some(self.aadt),
            truck_pct: Some(self.truck_pct),
            tavg: Some(self.tavg),
            prcp: Some(self.prcp),
        }
    }
}

fn scenarios(plan: &SensitivityPlan) -> Vec<Scenario> {
    let mut scenarios = Vec::new();

    for &factor in Factor::all() {
        let base = Scenario::from_baseline(factor, &plan.baseline);
        match factor {
            Factor::Pavement => scenarios.extend(
                PavementType::MODELED
                    .iter()
                    .map(|&pavement| Scenario { pavement, ..base }),
            ),
            Factor::Facility => scenarios.extend(
                FacilityClass::LEVELS
                    .iter()
                    .map(|&facility| Scenario { facility, ..base }),
            ),
            Factor::Aadt => {
                scenarios.extend(plan.aadt.iter().map(|&aadt| Scenario { aadt, ..base }));
            }
            Factor::TruckPct => scenarios.extend(
                plan.truck_pct
                    .iter()
                    .map(|&truck_pct| Scenario { truck_pct, ..base }),
            ),
            Factor::Tavg => {
                scenarios.extend(plan.tavg.iter().map(|&tavg| Scenario { tavg, ..base }));
            }
            Factor::Prcp => {
                scenarios.extend(plan.prcp.iter().map(|&prcp| Scenario { prcp, ..base }));
            }
        }
    }

    scenarios
}

/// Evaluates `variant` over every scenario of the plan.
///
/// Curves come out in factor order, then level order; points in age order.
/// The synthetic segments carry no district, so group effects contribute
/// nothing.
///
/// # Errors
///
/// Propagates [`ConfigurationError`] from evaluation.
pub fn sensitivity_curves(
    variant: &ModelVariant,
    plan: &SensitivityPlan,
) -> Result<Vec<SensitivityCurve>, ConfigurationError> {
    let scenarios = scenarios(plan);
    let records: Vec<SegmentYearRecord> = scenarios
        .iter()
        .flat_map(|scenario| plan.ages.iter().map(|&age| scenario.record(age)))
        .collect();

    let frame = CovariateFrame::from_records(&records);
    let predicted = evaluate(variant, &frame)?;

    let width = plan.ages.len();
    let curves: Vec<SensitivityCurve> = scenarios
        .iter()
        .enumerate()
        .map(|(i, scenario)| SensitivityCurve {
            factor: scenario.factor,
            level: scenario.level(),
            points: plan
                .ages
                .iter()
                .zip(&predicted[i * width..(i + 1) * width])
                .map(|(&age, &predicted)| CurvePoint { age, predicted })
                .collect(),
        })
        .collect();

    log::debug!(
        "Built {} sensitivity curves for {}",
        curves.len(),
        variant.key()
    );
    Ok(curves)
}

#[cfg(test)]
mod tests {
    use friction_map_model_models::{BaseForm, VariantKey};

    use super::*;
    use crate::ModelRegistry;

    fn stepwise(form: BaseForm) -> ModelVariant {
        ModelRegistry::builtin()
            .unwrap()
            .require(&VariantKey::new(form, "stepwise"))
            .unwrap()
            .clone()
    }

    #[test]
    fn default_age_grid() {
        let ages = SensitivityPlan::default().ages;
        assert_eq!(ages.len(), 20);
        assert_eq!(ages.first(), Some(&0.0));
        assert_eq!(ages.last(), Some(&9.5));
    }

    #[test]
    fn one_curve_per_level() {
        let plan = SensitivityPlan::default();
        let curves = sensitivity_curves(&stepwise(BaseForm::I), &plan).unwrap();
        assert_eq!(curves.len(), 21);
        assert!(curves.iter().all(|c| c.points.len() == plan.ages.len()));

        let levels: Vec<&str> = curves
            .iter()
            .filter(|c| c.factor == Factor::Facility)
            .map(|c| c.level.as_str())
            .collect();
        assert_eq!(levels, ["FM", "SH", "US", "IH"]);

        let aadt: Vec<&str> = curves
            .iter()
            .filter(|c| c.factor == Factor::Aadt)
            .map(|c| c.level.as_str())
            .collect();
        assert_eq!(aadt, ["2000", "5000", "15000"]);
    }

    #[test]
    fn curves_follow_factor_order() {
        let curves = sensitivity_curves(&stepwise(BaseForm::I), &SensitivityPlan::default()).unwrap();
        let mut factors: Vec<Factor> = curves.iter().map(|c| c.factor).collect();
        factors.dedup();
        assert_eq!(factors, Factor::all());
    }

    #[test]
    fn baseline_level_matches_across_factors() {
        let curves = sensitivity_curves(&stepwise(BaseForm::II), &SensitivityPlan::default())
            .unwrap();
        let find = |factor, level: &str| {
            curves
                .iter()
                .find(|c| c.factor == factor && c.level == level)
                .unwrap()
                .points
                .clone()
        };
        let baseline = find(Factor::Pavement, "AC_Thick");
        assert_eq!(find(Factor::Facility, "FM"), baseline);
        assert_eq!(find(Factor::Aadt, "5000"), baseline);
        assert_eq!(find(Factor::Prcp, "35"), baseline);
    }

    #[test]
    fn stepwise_friction_decays_with_age() {
        let curves = sensitivity_curves(&stepwise(BaseForm::I), &SensitivityPlan::default())
            .unwrap();
        for curve in &curves {
            assert!(
                curve
                    .points
                    .windows(2)
                    .all(|w| w[1].predicted < w[0].predicted),
                "{} = {} is not decreasing",
                curve.factor,
                curve.level
            );
        }
    }

    #[test]
    fn empty_age_grid_gives_empty_curves() {
        let plan = SensitivityPlan {
            ages: Vec::new(),
            ..SensitivityPlan::default()
        };
        let curves = sensitivity_curves(&stepwise(BaseForm::I), &plan).unwrap();
        assert_eq!(curves.len(), 21);
        assert!(curves.iter().all(|c| c.points.is_empty()));
    }
}
