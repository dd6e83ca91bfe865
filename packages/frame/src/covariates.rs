//! The covariate frame.
//!
//! A continuous covariate column is present only when every row has a
//! value for it; rows with gaps should be dropped by selection first. This
//! keeps the evaluator's "missing column" check a single lookup instead of
//! a per-row null check.

use std::collections::BTreeMap;
use std::str::FromStr as _;

use friction_map_geography_models::CountyDistrict;
use friction_map_segment_models::{
    Category, Covariate, FacilityClass, PavementType, SegmentYearRecord,
};

use crate::FrameError;

/// Columnar view of a set of segment-years.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CovariateFrame {
    geography: Vec<CountyDistrict>,
    contracts: Vec<Option<String>>,
    facility: Vec<FacilityClass>,
    pavement: Vec<PavementType>,
    covariates: BTreeMap<Covariate, Vec<f64>>,
    derived: BTreeMap<String, Vec<f64>>,
}

impl CovariateFrame {
    /// Builds a frame from records.
    ///
    /// A covariate column is included only if no record is missing it.
    #[must_use]
    pub fn from_records(records: &[SegmentYearRecord]) -> Self {
        let mut covariates = BTreeMap::new();
        for &covariate in Covariate::all() {
            let column: Option<Vec<f64>> =
                records.iter().map(|r| r.covariate(covariate)).collect();
            match column {
                Some(values) => {
                    covariates.insert(covariate, values);
                }
                None => log::debug!("Covariate {covariate} incomplete, leaving column out"),
            }
        }

        Self {
            geography: records.iter().map(|r| r.geography.clone()).collect(),
            contracts: records.iter().map(|r| r.contract.clone()).collect(),
            facility: records.iter().map(|r| r.facility).collect(),
            pavement: records.iter().map(|r| r.pavement).collect(),
            covariates,
            derived: BTreeMap::new(),
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.geography.len()
    }

    /// Returns `true` if the frame has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geography.is_empty()
    }

    /// Geography of each row.
    #[must_use]
    pub fn geography(&self) -> &[CountyDistrict] {
        &self.geography
    }

    /// Contract of each row.
    #[must_use]
    pub fn contracts(&self) -> &[Option<String>] {
        &self.contracts
    }

    /// Facility class of each row.
    #[must_use]
    pub fn facility(&self) -> &[FacilityClass] {
        &self.facility
    }

    /// Pavement type of each row.
    #[must_use]
    pub fn pavement(&self) -> &[PavementType] {
        &self.pavement
    }

    /// A continuous covariate column, if present.
    #[must_use]
    pub fn covariate(&self, covariate: Covariate) -> Option<&[f64]> {
        self.covariates.get(&covariate).map(Vec::as_slice)
    }

    /// A continuous covariate column.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::MissingColumn`] if the column is not present.
    pub fn require_covariate(&self, covariate: Covariate) -> Result<&[f64], FrameError> {
        self.covariate(covariate)
            .ok_or_else(|| FrameError::MissingColumn {
                column: covariate.to_string(),
            })
    }

    /// Looks up a numeric column by name: derived columns first, then
    /// covariates by their source column name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        if let Some(values) = self.derived.get(name) {
            return Some(values);
        }
        Covariate::from_str(name)
            .ok()
            .and_then(|covariate| self.covariate(covariate))
    }

    /// Names of the derived columns, sorted.
    pub fn derived_columns(&self) -> impl Iterator<Item = &str> {
        self.derived.keys().map(String::as_str)
    }

    /// Appends a derived column.
    ///
    /// # Errors
    ///
    /// * [`FrameError::ColumnExists`] if `name` is already a derived column
    ///   or the name of a covariate.
    /// * [`FrameError::Length`] if `values` does not have one entry per row.
    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> Result<Self, FrameError> {
        if self.derived.contains_key(name) || Covariate::from_str(name).is_ok() {
            return Err(FrameError::ColumnExists {
                column: name.to_string(),
            });
        }
        if values.len() != self.len() {
            return Err(FrameError::Length {
                column: name.to_string(),
                expected: self.len(),
                actual: values.len(),
            });
        }

        self.derived.insert(name.to_string(), values);
        Ok(self)
    }

    /// One-hot facility indicators, one row per frame row.
    #[must_use]
    pub fn facility_indicators(&self) -> Vec<Vec<f64>> {
        self.facility.iter().map(|f| f.encode()).collect()
    }

    /// One-hot pavement indicators, one row per frame row.
    #[must_use]
    pub fn pavement_indicators(&self) -> Vec<Vec<f64>> {
        self.pavement.iter().map(|p| p.encode()).collect()
    }
}

/// Decodes an indicator matrix back into category labels.
///
/// # Errors
///
/// Returns [`FrameError::Indicator`] for the first row that does not have
/// exactly one indicator set.
pub fn decode_indicators<C: Category>(rows: &[Vec<f64>]) -> Result<Vec<C>, FrameError> {
    rows.iter()
        .enumerate()
        .map(|(row, indicators)| {
            C::decode(indicators).map_err(|source| FrameError::Indicator { row, source })
        })
        .collect()
}
