//! Left join of the county reference against a pivot.

use std::collections::BTreeMap;

use friction_map_geography_models::{CountyDistrict, GeographyReference};
use serde::{Deserialize, Serialize};

use crate::pivot::PivotTable;

/// A reference county and its count for one threshold outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountyCount {
    /// County from the reference table.
    pub county: CountyDistrict,
    /// Records with the requested flag, 0 if none.
    pub count: u64,
}

/// Joins every reference county to its pivot count for `meets_threshold`.
///
/// Counties are matched on FIPS code. The output has exactly one row per
/// reference county, in reference order, with count 0 where the pivot has
/// no matching row. Pivot rows for counties missing from the reference are
/// ignored.
#[must_use]
pub fn join(
    reference: &GeographyReference,
    pivot: &PivotTable,
    meets_threshold: bool,
) -> Vec<CountyCount> {
    let mut by_fips: BTreeMap<&str, u64> = BTreeMap::new();
    for row in pivot.with_flag(meets_threshold) {
        *by_fips.entry(row.geography.county_fips.as_str()).or_insert(0) += row.count;
    }

    let unmatched = by_fips
        .keys()
        .filter(|fips| reference.county(fips).is_none())
        .count();
    if unmatched > 0 {
        log::warn!("{unmatched} pivot counties are not in the geography reference");
    }

    reference
        .counties()
        .iter()
        .map(|county| CountyCount {
            county: county.clone(),
            count: by_fips
                .get(county.county_fips.as_str())
                .copied()
                .unwrap_or(0),
        })
        .collect()
}

/// Joins both outcomes: `(meets, does_not_meet)`.
#[must_use]
pub fn join_both(
    reference: &GeographyReference,
    pivot: &PivotTable,
) -> (Vec<CountyCount>, Vec<CountyCount>) {
    (join(reference, pivot, true), join(reference, pivot, false))
}
