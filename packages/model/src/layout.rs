//! Positional coefficient layouts.
//!
//! A fitted coefficient vector is laid out block by block: the `a` block,
//! then `b`, then `c`, then `t0` for Form II, then one coefficient per
//! group-effect district. Each of `a`, `b` and `c` starts with its
//! constant, followed by one coefficient per [`Term`] in the order listed
//! here. The fitting scripts emit vectors in exactly this order, so these
//! tables must not be reordered.

use friction_map_model_models::{BaseForm, CovariateSet};
use friction_map_segment_models::{Covariate, FacilityClass, PavementType};

/// One non-constant regressor in an affine term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    /// Facility class indicator.
    Facility(FacilityClass),
    /// Pavement type indicator.
    Pavement(PavementType),
    /// Continuous covariate.
    Covariate(Covariate),
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Facility(facility) => write!(f, "{facility}"),
            Self::Pavement(pavement) => write!(f, "{pavement}"),
            Self::Covariate(covariate) => write!(f, "{covariate}"),
        }
    }
}

/// Facility indicators, farm road being the baseline.
const FACILITY: [Term; 3] = [
    Term::Facility(FacilityClass::StateHighway),
    Term::Facility(FacilityClass::UsHighway),
    Term::Facility(FacilityClass::Interstate),
];

const FACILITY_TRUCK: [Term; 4] = [
    FACILITY[0],
    FACILITY[1],
    FACILITY[2],
    Term::Covariate(Covariate::TruckPct),
];

const TRUCK: [Term; 1] = [Term::Covariate(Covariate::TruckPct)];

/// Pavement indicators (thin asphalt baseline) and climate.
const PAVEMENT_CLIMATE: [Term; 6] = [
    Term::Pavement(PavementType::ThickAsphalt),
    Term::Pavement(PavementType::Composite),
    Term::Pavement(PavementType::JointedConcrete),
    Term::Pavement(PavementType::ContinuousConcrete),
    Term::Covariate(Covariate::Tavg),
    Term::Covariate(Covariate::Prcp),
];

const PAVEMENT_CLIMATE_TRUCK: [Term; 7] = [
    PAVEMENT_CLIMATE[0],
    PAVEMENT_CLIMATE[1],
    PAVEMENT_CLIMATE[2],
    PAVEMENT_CLIMATE[3],
    PAVEMENT_CLIMATE[4],
    PAVEMENT_CLIMATE[5],
    Term::Covariate(Covariate::TruckPct),
];

const TRAFFIC: [Term; 1] = [Term::Covariate(Covariate::Aadt)];

/// Regressors of each affine block for one (form, covariate set) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Regressors of `a`, after its constant.
    pub a: &'static [Term],
    /// Regressors of `b`, after its constant.
    pub b: &'static [Term],
    /// Regressors of `c`, after its constant.
    pub c: &'static [Term],
    /// Whether a trailing `t0` follows the `c` block.
    pub shift: bool,
}

impl Layout {
    /// The layout for a form and covariate set.
    ///
    /// Truck percentage sits in `b` for Form I and in `a` for Form II.
    #[must_use]
    pub const fn of(form: BaseForm, covariate_set: CovariateSet) -> Self {
        match (form, covariate_set) {
            (BaseForm::I, CovariateSet::Full) => Self {
                a: &FACILITY,
                b: &PAVEMENT_CLIMATE_TRUCK,
                c: &TRAFFIC,
                shift: false,
            },
            (BaseForm::I, CovariateSet::FacilityRemoved) => Self {
                a: &[],
                b: &PAVEMENT_CLIMATE_TRUCK,
                c: &TRAFFIC,
                shift: false,
            },
            (BaseForm::II, CovariateSet::Full) => Self {
                a: &FACILITY_TRUCK,
                b: &PAVEMENT_CLIMATE,
                c: &TRAFFIC,
                shift: true,
            },
            (BaseForm::II, CovariateSet::FacilityRemoved) => Self {
                a: &TRUCK,
                b: &PAVEMENT_CLIMATE,
                c: &TRAFFIC,
                shift: true,
            },
        }
    }

    /// Number of coefficients before any group-effect coefficients.
    #[must_use]
    pub const fn base_len(&self) -> usize {
        3 + self.a.len() + self.b.len() + self.c.len() + if self.shift { 1 } else { 0 }
    }

    /// Continuous covariates read by the layout, always including age.
    #[must_use]
    pub fn covariates(&self) -> Vec<Covariate> {
        let mut covariates = vec![Covariate::Age];
        for term in self.a.iter().chain(self.b).chain(self.c) {
            if let Term::Covariate(covariate) = *term
                && !covariates.contains(&covariate)
            {
                covariates.push(covariate);
            }
        }
        covariates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(terms: &[Term]) -> Vec<String> {
        terms.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn form_one_full_order() {
        let layout = Layout::of(BaseForm::I, CovariateSet::Full);
        assert_eq!(names(layout.a), ["SH", "US", "IH"]);
        assert_eq!(
            names(layout.b),
            ["AC_Thick", "COM", "JCP", "CRCP", "tavg", "prcp", "TRUCK_PCT"]
        );
        assert_eq!(names(layout.c), ["AADT"]);
        assert_eq!(layout.base_len(), 14);
    }

    #[test]
    fn form_two_full_order() {
        let layout = Layout::of(BaseForm::II, CovariateSet::Full);
        assert_eq!(names(layout.a), ["SH", "US", "IH", "TRUCK_PCT"]);
        assert_eq!(
            names(layout.b),
            ["AC_Thick", "COM", "JCP", "CRCP", "tavg", "prcp"]
        );
        assert_eq!(names(layout.c), ["AADT"]);
        assert!(layout.shift);
        assert_eq!(layout.base_len(), 15);
    }

    #[test]
    fn form_one_facility_removed_order() {
        let layout = Layout::of(BaseForm::I, CovariateSet::FacilityRemoved);
        assert!(layout.a.is_empty());
        assert_eq!(
            names(layout.b),
            ["AC_Thick", "COM", "JCP", "CRCP", "tavg", "prcp", "TRUCK_PCT"]
        );
        assert_eq!(layout.base_len(), 11);
    }

    #[test]
    fn form_two_facility_removed_order() {
        let layout = Layout::of(BaseForm::II, CovariateSet::FacilityRemoved);
        assert_eq!(names(layout.a), ["TRUCK_PCT"]);
        assert_eq!(
            names(layout.b),
            ["AC_Thick", "COM", "JCP", "CRCP", "tavg", "prcp"]
        );
        assert_eq!(layout.base_len(), 12);
    }

    #[test]
    fn covariates_start_with_age_and_are_distinct() {
        let layout = Layout::of(BaseForm::II, CovariateSet::Full);
        assert_eq!(
            layout.covariates(),
            vec![
                Covariate::Age,
                Covariate::TruckPct,
                Covariate::Tavg,
                Covariate::Prcp,
                Covariate::Aadt,
            ]
        );
    }
}
