#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pavement segment-year records and their categorical vocabularies.
//!
//! A [`SegmentYearRecord`] is one observed pavement condition sample: the
//! geography it sits in, its categorical descriptors, and the continuous
//! covariates the degradation models consume. Records are read-only once
//! loaded; model outputs are appended elsewhere as derived columns.

pub mod category;

use friction_map_geography_models::CountyDistrict;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use category::{Category, FacilityClass, IndicatorError, PavementType};

/// A continuous model covariate, named by its source column.
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
pub enum Covariate {
    /// Years since construction or last treatment.
    #[serde(rename = "AGE")]
    #[strum(serialize = "AGE")]
    Age,
    /// Annual average daily traffic.
    #[serde(rename = "AADT")]
    #[strum(serialize = "AADT")]
    Aadt,
    /// Truck share of traffic, in percent.
    #[serde(rename = "TRUCK_PCT")]
    #[strum(serialize = "TRUCK_PCT")]
    TruckPct,
    /// Average temperature.
    #[serde(rename = "tavg")]
    #[strum(serialize = "tavg")]
    Tavg,
    /// Average precipitation.
    #[serde(rename = "prcp")]
    #[strum(serialize = "prcp")]
    Prcp,
}

impl Covariate {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Age,
            Self::Aadt,
            Self::TruckPct,
            Self::Tavg,
            Self::Prcp,
        ]
    }
}

/// One pavement segment-year sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentYearRecord {
    /// County and owning district.
    pub geography: CountyDistrict,
    /// Maintenance contract identifier, if known.
    pub contract: Option<String>,
    /// Functional road class.
    pub facility: FacilityClass,
    /// Pavement structure type.
    pub pavement: PavementType,
    /// Years since construction or last treatment.
    pub age: Option<f64>,
    /// Annual average daily traffic.
    pub aadt: Option<f64>,
    /// Truck share of traffic, in percent.
    pub truck_pct: Option<f64>,
    /// Average temperature.
    pub tavg: Option<f64>,
    /// Average precipitation.
    pub prcp: Option<f64>,
}

impl SegmentYearRecord {
    /// Returns the value of a continuous covariate, if recorded.
    #[must_use]
    pub const fn covariate(&self, covariate: Covariate) -> Option<f64> {
        match covariate {
            Covariate::Age => self.age,
            Covariate::Aadt => self.aadt,
            Covariate::TruckPct => self.truck_pct,
            Covariate::Tavg => self.tavg,
            Covariate::Prcp => self.prcp,
        }
    }

    /// Returns `true` if every listed covariate is recorded.
    #[must_use]
    pub fn has_covariates(&self, covariates: &[Covariate]) -> bool {
        covariates.iter().all(|&c| self.covariate(c).is_some())
    }
}
