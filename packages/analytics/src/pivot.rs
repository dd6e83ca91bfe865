//! Threshold pivot.
//!
//! Flags each row as meeting the threshold (`prediction >= threshold`) and
//! counts rows per (geography, flag). Only combinations present in the data
//! are emitted; filling the gaps is the geography join's job.

use std::collections::BTreeMap;

use friction_map_frame::CovariateFrame;
use friction_map_geography_models::CountyDistrict;
use serde::{Deserialize, Serialize};

use crate::{AnalyticsError, column};

/// Count of records for one geography and threshold outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotRow {
    /// Full county/district key.
    pub geography: CountyDistrict,
    /// `true` if the prediction is at or above the threshold.
    pub meets_threshold: bool,
    /// Number of records.
    pub count: u64,
}

/// Result of [`pivot`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotTable {
    /// One row per (geography, flag) present, ordered by geography then
    /// flag (`false` first).
    pub rows: Vec<PivotRow>,
    /// Rows left out because the prediction was NaN or infinite.
    pub dropped_non_finite: usize,
}

impl PivotTable {
    /// Rows with the given flag.
    pub fn with_flag(&self, meets_threshold: bool) -> impl Iterator<Item = &PivotRow> {
        self.rows
            .iter()
            .filter(move |row| row.meets_threshold == meets_threshold)
    }

    /// Total records counted with the given flag.
    #[must_use]
    pub fn total(&self, meets_threshold: bool) -> u64 {
        self.with_flag(meets_threshold).map(|row| row.count).sum()
    }
}

/// Pivots `column_name` of `frame` against `threshold`.
///
/// Non-finite predictions are excluded and reported in
/// [`PivotTable::dropped_non_finite`].
///
/// # Errors
///
/// * [`AnalyticsError::MissingColumn`] if the column does not exist.
/// * [`AnalyticsError::NonFiniteThreshold`] if `threshold` is NaN or
///   infinite.
pub fn pivot(
    frame: &CovariateFrame,
    threshold: f64,
    column_name: &str,
) -> Result<PivotTable, AnalyticsError> {
    if !threshold.is_finite() {
        return Err(AnalyticsError::NonFiniteThreshold { threshold });
    }
    let values = column(frame, column_name)?;

    let mut counts: BTreeMap<(&CountyDistrict, bool), u64> = BTreeMap::new();
    let mut dropped_non_finite = 0;

    for (geography, &value) in frame.geography().iter().zip(values) {
        if !value.is_finite() {
            dropped_non_finite += 1;
            continue;
        }
        *counts.entry((geography, value >= threshold)).or_insert(0) += 1;
    }

    if dropped_non_finite > 0 {
        log::warn!(
            "Excluded {dropped_non_finite} non-finite values of {column_name} from the pivot"
        );
    }

    let rows: Vec<PivotRow> = counts
        .into_iter()
        .map(|((geography, meets_threshold), count)| PivotRow {
            geography: geography.clone(),
            meets_threshold,
            count,
        })
        .collect();

    log::debug!(
        "Pivoted {column_name} at {threshold} into {} groups",
        rows.len()
    );

    Ok(PivotTable {
        rows,
        dropped_non_finite,
    })
}
