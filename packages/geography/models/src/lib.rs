#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County and district geography types.
//!
//! Every pavement segment-year belongs to one county, and every county is
//! owned by one highway district. These types carry that identity through
//! the aggregation pipeline and provide the canonical county table that
//! guarantees every county shows up on a map, even with zero segments.

pub mod fips;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// A county together with the highway district that owns it.
///
/// This is the full geography key used when grouping segment-years: two
/// rows are in the same geography only if every field matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyDistrict {
    /// District number (1-25 for Texas).
    pub district_number: u32,
    /// District name (e.g. "Austin").
    pub district_name: String,
    /// Three-letter district abbreviation (e.g. "AUS").
    pub district_abbr: String,
    /// County number within the state's own numbering.
    pub county_number: u32,
    /// Five-digit county FIPS code (e.g. "48453").
    pub county_fips: String,
    /// County name.
    pub county_name: String,
}

/// Error returned when the county reference table lists a county twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCountyError {
    /// The repeated county FIPS code.
    pub county_fips: String,
}

impl std::fmt::Display for DuplicateCountyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "county {} appears more than once in the geography reference",
            self.county_fips
        )
    }
}

impl std::error::Error for DuplicateCountyError {}

/// The canonical list of counties and their owning districts.
///
/// Loaded once and shared read-only by every aggregation call. Counties are
/// kept in load order; lookups by FIPS code go through an index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeographyReference {
    counties: Vec<CountyDistrict>,
    by_fips: BTreeMap<String, usize>,
}

impl GeographyReference {
    /// Builds the reference table.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateCountyError`] if two rows share a county FIPS code.
    pub fn new(counties: Vec<CountyDistrict>) -> Result<Self, DuplicateCountyError> {
        let mut by_fips = BTreeMap::new();
        for (idx, county) in counties.iter().enumerate() {
            if by_fips.insert(county.county_fips.clone(), idx).is_some() {
                return Err(DuplicateCountyError {
                    county_fips: county.county_fips.clone(),
                });
            }
        }

        Ok(Self { counties, by_fips })
    }

    /// All counties, in load order.
    #[must_use]
    pub fn counties(&self) -> &[CountyDistrict] {
        &self.counties
    }

    /// Looks up a county by its five-digit FIPS code.
    #[must_use]
    pub fn county(&self, county_fips: &str) -> Option<&CountyDistrict> {
        self.by_fips.get(county_fips).map(|&idx| &self.counties[idx])
    }

    /// Distinct district abbreviations, sorted.
    #[must_use]
    pub fn district_abbrs(&self) -> BTreeSet<&str> {
        self.counties
            .iter()
            .map(|c| c.district_abbr.as_str())
            .collect()
    }

    /// Number of counties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counties.len()
    }

    /// Returns `true` if the table has no counties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }
}
