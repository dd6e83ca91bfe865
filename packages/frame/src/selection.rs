//! Row selection masks.
//!
//! Each interactive filter (district, contract, facility, pavement type) is
//! an independent boolean mask over the same record slice. Callers combine
//! them with [`Mask::and`]. A filter given an empty set selects nothing;
//! that is a valid, empty result rather than an error.

use std::collections::BTreeSet;

use friction_map_segment_models::{Covariate, FacilityClass, PavementType, SegmentYearRecord};
use serde::{Deserialize, Serialize};

use crate::FrameError;

/// One boolean per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask(Vec<bool>);

impl Mask {
    /// A mask selecting every one of `len` rows.
    #[must_use]
    pub fn all(len: usize) -> Self {
        Self(vec![true; len])
    }

    /// Evaluates `predicate` on every record.
    #[must_use]
    pub fn from_fn(
        records: &[SegmentYearRecord],
        predicate: impl Fn(&SegmentYearRecord) -> bool,
    ) -> Self {
        Self(records.iter().map(predicate).collect())
    }

    /// Logical AND of two masks.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Length`] if the masks cover a different number
    /// of rows.
    pub fn and(&self, other: &Self) -> Result<Self, FrameError> {
        if self.0.len() != other.0.len() {
            return Err(FrameError::Length {
                column: "mask".to_string(),
                expected: self.0.len(),
                actual: other.0.len(),
            });
        }
        Ok(Self(
            self.0.iter().zip(&other.0).map(|(&a, &b)| a && b).collect(),
        ))
    }

    /// Number of selected rows.
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&keep| keep).count()
    }

    /// Number of rows the mask covers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the mask covers no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Clones the selected records.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Length`] if `records` is not the slice the mask
    /// was built over.
    pub fn apply(
        &self,
        records: &[SegmentYearRecord],
    ) -> Result<Vec<SegmentYearRecord>, FrameError> {
        if records.len() != self.0.len() {
            return Err(FrameError::Length {
                column: "records".to_string(),
                expected: self.0.len(),
                actual: records.len(),
            });
        }
        Ok(records
            .iter()
            .zip(&self.0)
            .filter(|(_, keep)| **keep)
            .map(|(record, _)| record.clone())
            .collect())
    }
}

/// Rows that have every listed covariate.
#[must_use]
pub fn complete_cases(records: &[SegmentYearRecord], required: &[Covariate]) -> Mask {
    Mask::from_fn(records, |r| r.has_covariates(required))
}

/// Rows whose pavement type is one the models were fit on.
#[must_use]
pub fn modeled_pavement(records: &[SegmentYearRecord]) -> Mask {
    Mask::from_fn(records, |r| r.pavement.is_modeled())
}

/// Interactive category filters. `None` leaves a dimension unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionFilter {
    /// District abbreviations to keep.
    #[serde(default)]
    pub districts: Option<BTreeSet<String>>,
    /// Contract identifiers to keep.
    #[serde(default)]
    pub contracts: Option<BTreeSet<String>>,
    /// Facility classes to keep.
    #[serde(default)]
    pub facilities: Option<BTreeSet<FacilityClass>>,
    /// Pavement types to keep.
    #[serde(default)]
    pub pavements: Option<BTreeSet<PavementType>>,
}

impl SelectionFilter {
    /// District mask, if the filter is set.
    #[must_use]
    pub fn district_mask(&self, records: &[SegmentYearRecord]) -> Option<Mask> {
        self.districts.as_ref().map(|set| {
            Mask::from_fn(records, |r| set.contains(&r.geography.district_abbr))
        })
    }

    /// Contract mask, if the filter is set. Records without a contract
    /// never match.
    #[must_use]
    pub fn contract_mask(&self, records: &[SegmentYearRecord]) -> Option<Mask> {
        self.contracts.as_ref().map(|set| {
            Mask::from_fn(records, |r| {
                r.contract.as_ref().is_some_and(|c| set.contains(c))
            })
        })
    }

    /// Facility mask, if the filter is set.
    #[must_use]
    pub fn facility_mask(&self, records: &[SegmentYearRecord]) -> Option<Mask> {
        self.facilities
            .as_ref()
            .map(|set| Mask::from_fn(records, |r| set.contains(&r.facility)))
    }

    /// Pavement mask, if the filter is set.
    #[must_use]
    pub fn pavement_mask(&self, records: &[SegmentYearRecord]) -> Option<Mask> {
        self.pavements
            .as_ref()
            .map(|set| Mask::from_fn(records, |r| set.contains(&r.pavement)))
    }

    /// All active masks combined with AND.
    #[must_use]
    pub fn mask(&self, records: &[SegmentYearRecord]) -> Mask {
        [
            self.district_mask(records),
            self.contract_mask(records),
            self.facility_mask(records),
            self.pavement_mask(records),
        ]
        .into_iter()
        .flatten()
        .fold(Mask::all(records.len()), |acc, mask| {
            Mask(acc.0.iter().zip(&mask.0).map(|(&a, &b)| a && b).collect())
        })
    }

    /// Clones the records passing every active filter.
    #[must_use]
    pub fn apply(&self, records: &[SegmentYearRecord]) -> Vec<SegmentYearRecord> {
        let mask = self.mask(records);
        log::debug!(
            "Selection kept {} of {} records",
            mask.count(),
            records.len()
        );
        records
            .iter()
            .zip(&mask.0)
            .filter(|(_, keep)| **keep)
            .map(|(record, _)| record.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use friction_map_geography_models::CountyDistrict;

    use super::*;

    fn record(
        district: &str,
        contract: Option<&str>,
        facility: FacilityClass,
        pavement: PavementType,
    ) -> SegmentYearRecord {
        SegmentYearRecord {
            geography: CountyDistrict {
                district_abbr: district.to_string(),
                ..CountyDistrict::default()
            },
            contract: contract.map(ToString::to_string),
            facility,
            pavement,
            age: Some(1.0),
            aadt: Some(1000.0),
            truck_pct: None,
            tavg: Some(60.0),
            prcp: Some(30.0),
        }
    }

    fn records() -> Vec<SegmentYearRecord> {
        vec![
            record("AUS", Some("1402"), FacilityClass::FarmRoad, PavementType::ThinAsphalt),
            record("AUS", None, FacilityClass::Interstate, PavementType::ContinuousConcrete),
            record("HOU", Some("1201"), FacilityClass::UsHighway, PavementType::Other),
        ]
    }

    #[test]
    fn unset_filter_keeps_everything() {
        let records = records();
        assert_eq!(SelectionFilter::default().apply(&records).len(), 3);
    }

    #[test]
    fn filters_combine_with_and() {
        let records = records();
        let filter = SelectionFilter {
            districts: Some(BTreeSet::from(["AUS".to_string()])),
            facilities: Some(BTreeSet::from([FacilityClass::Interstate])),
            ..SelectionFilter::default()
        };
        let kept = filter.apply(&records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].pavement, PavementType::ContinuousConcrete);
    }

    #[test]
    fn empty_set_selects_nothing() {
        let records = records();
        let filter = SelectionFilter {
            pavements: Some(BTreeSet::new()),
            ..SelectionFilter::default()
        };
        assert!(filter.apply(&records).is_empty());
    }

    #[test]
    fn missing_contract_never_matches() {
        let records = records();
        let filter = SelectionFilter {
            contracts: Some(BTreeSet::from(["1402".to_string(), "1201".to_string()])),
            ..SelectionFilter::default()
        };
        assert_eq!(filter.mask(&records).count(), 2);
    }

    #[test]
    fn masks_and_together() {
        let records = records();
        let complete = complete_cases(&records, &[Covariate::Age, Covariate::Tavg]);
        let modeled = modeled_pavement(&records);
        let both = complete.and(&modeled).unwrap();
        assert_eq!(both.count(), 2);
        assert_eq!(both.apply(&records).unwrap().len(), 2);

        let truck = complete_cases(&records, &[Covariate::TruckPct]);
        assert_eq!(truck.count(), 0);
    }

    #[test]
    fn mismatched_masks_are_rejected() {
        assert!(Mask::all(2).and(&Mask::all(3)).is_err());
        assert!(Mask::all(2).apply(&records()).is_err());
    }

    #[test]
    fn filter_deserializes_from_toml() {
        let filter: SelectionFilter = toml::from_str(
            r#"
            districts = ["AUS"]
            facilities = ["FM", "IH"]
            pavements = ["AC_Thin", "CRCP"]
            "#,
        )
        .unwrap();
        assert_eq!(filter.apply(&records()).len(), 2);
        assert!(filter.contracts.is_none());
    }
}
