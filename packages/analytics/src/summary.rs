//! Distribution summaries for histograms, box plots and threshold bounds.
//!
//! NaN and infinite values are skipped throughout.

use std::collections::BTreeMap;

use friction_map_frame::CovariateFrame;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{AnalyticsError, column};

/// Category used to split a box plot.
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
pub enum Grouping {
    /// District name.
    #[serde(rename = "District_Name")]
    #[strum(serialize = "District_Name")]
    District,
    /// Facility class label.
    #[serde(rename = "HIGHWAY_FUN")]
    #[strum(serialize = "HIGHWAY_FUN")]
    Facility,
    /// Pavement type label.
    #[serde(rename = "PAV_TYPE")]
    #[strum(serialize = "PAV_TYPE")]
    Pavement,
}

impl Grouping {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::District, Self::Facility, Self::Pavement]
    }

    fn labels(self, frame: &CovariateFrame) -> Vec<String> {
        match self {
            Self::District => frame
                .geography()
                .iter()
                .map(|g| g.district_name.clone())
                .collect(),
            Self::Facility => frame.facility().iter().map(ToString::to_string).collect(),
            Self::Pavement => frame.pavement().iter().map(ToString::to_string).collect(),
        }
    }
}

/// Five-number summary plus count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    /// Number of finite values.
    pub count: usize,
    /// Smallest value.
    pub min: f64,
    /// First quartile.
    pub q1: f64,
    /// Median.
    pub median: f64,
    /// Third quartile.
    pub q3: f64,
    /// Largest value.
    pub max: f64,
}

impl BoxStats {
    /// Summarizes the finite values, or `None` if there are none.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            count: sorted.len(),
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Linear-interpolated quantile of non-empty sorted values.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - position.floor();
    (sorted[upper] - sorted[lower]).mul_add(fraction, sorted[lower])
}

/// Box statistics for one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Group label, e.g. a district name or `"IH"`.
    pub group: String,
    /// Statistics of the group's finite values.
    pub stats: BoxStats,
}

/// Box statistics of `column_name` per group, ordered by group label.
/// Groups with no finite values are left out.
///
/// # Errors
///
/// Returns [`AnalyticsError::MissingColumn`] if the column does not exist.
pub fn summarize_by(
    frame: &CovariateFrame,
    column_name: &str,
    grouping: Grouping,
) -> Result<Vec<GroupSummary>, AnalyticsError> {
    let values = column(frame, column_name)?;

    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (label, &value) in grouping.labels(frame).into_iter().zip(values) {
        groups.entry(label).or_default().push(value);
    }

    Ok(groups
        .into_iter()
        .filter_map(|(group, values)| {
            BoxStats::from_values(values).map(|stats| GroupSummary { group, stats })
        })
        .collect())
}

/// One histogram bar covering `[lower, upper)`; the last bar is closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Inclusive lower edge.
    pub lower: f64,
    /// Upper edge.
    pub upper: f64,
    /// Values falling in the bin.
    pub count: u64,
}

/// Equal-width histogram of `column_name` from 0 (or the minimum, if
/// negative) to the maximum.
///
/// Returns no bins if the column has no finite values, and a single bin if
/// every value sits at the lower edge or the range is too wide to split.
///
/// # Errors
///
/// * [`AnalyticsError::NoBins`] if `bins` is zero.
/// * [`AnalyticsError::MissingColumn`] if the column does not exist.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn histogram(
    frame: &CovariateFrame,
    column_name: &str,
    bins: usize,
) -> Result<Vec<HistogramBin>, AnalyticsError> {
    if bins == 0 {
        return Err(AnalyticsError::NoBins);
    }
    let Some((min, max)) = column_range(frame, column_name)? else {
        return Ok(Vec::new());
    };
    let values = column(frame, column_name)?;

    let lower = min.min(0.0);
    let width = max / bins as f64 - lower / bins as f64;
    if width <= 0.0 || !width.is_finite() {
        let count = values.iter().filter(|v| v.is_finite()).count() as u64;
        return Ok(vec![HistogramBin {
            lower,
            upper: max,
            count,
        }]);
    }

    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: width.mul_add(i as f64, lower),
            upper: if i + 1 == bins {
                max
            } else {
                width.mul_add((i + 1) as f64, lower)
            },
            count: 0,
        })
        .collect();

    for value in values.iter().copied().filter(|v| v.is_finite()) {
        let index = (((value - lower) / width).floor() as usize).min(bins - 1);
        histogram[index].count += 1;
    }

    Ok(histogram)
}

/// Finite minimum and maximum of a column, or `None` if it has no finite
/// values. These bound the threshold control; the minimum is its default.
///
/// # Errors
///
/// Returns [`AnalyticsError::MissingColumn`] if the column does not exist.
pub fn column_range(
    frame: &CovariateFrame,
    column_name: &str,
) -> Result<Option<(f64, f64)>, AnalyticsError> {
    Ok(column(frame, column_name)?
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((min, max)) => Some((f64::min(min, v), f64::max(max, v))),
        }))
}

#[cfg(test)]
mod tests {
    use friction_map_segment_models::{FacilityClass, PavementType};

    use super::*;
    use crate::pivot::tests::{county, record};

    fn frame(values: &[(&str, FacilityClass, PavementType, f64)]) -> CovariateFrame {
        let records: Vec<_> = values
            .iter()
            .map(|&(district, facility, pavement, _)| {
                let mut geography = county("48453", "AUS");
                geography.district_name = district.to_string();
                let mut r = record(&geography, 1.0);
                r.facility = facility;
                r.pavement = pavement;
                r
            })
            .collect();
        CovariateFrame::from_records(&records)
            .with_column("SN", values.iter().map(|v| v.3).collect())
            .unwrap()
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let stats = BoxStats::from_values([4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q3, 3.25);
        assert_eq!(stats.max, 4.0);
    }

    #[test]
    fn box_stats_skip_non_finite() {
        let stats = BoxStats::from_values([f64::NAN, 5.0, f64::NEG_INFINITY]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.median, 5.0);
        assert!(BoxStats::from_values([f64::NAN]).is_none());
    }

    #[test]
    fn summarizes_per_group() {
        let f = frame(&[
            ("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, 30.0),
            ("Houston", FacilityClass::Interstate, PavementType::ContinuousConcrete, 20.0),
            ("Austin", FacilityClass::Interstate, PavementType::ThinAsphalt, 40.0),
            ("Houston", FacilityClass::FarmRoad, PavementType::ThinAsphalt, f64::NAN),
        ]);

        let by_district = summarize_by(&f, "SN", Grouping::District).unwrap();
        assert_eq!(by_district.len(), 2);
        assert_eq!(by_district[0].group, "Austin");
        assert_eq!(by_district[0].stats.median, 35.0);
        assert_eq!(by_district[1].group, "Houston");
        assert_eq!(by_district[1].stats.count, 1);

        let by_facility = summarize_by(&f, "SN", Grouping::Facility).unwrap();
        let groups: Vec<&str> = by_facility.iter().map(|s| s.group.as_str()).collect();
        assert_eq!(groups, ["FM", "IH"]);

        let by_pavement = summarize_by(&f, "SN", Grouping::Pavement).unwrap();
        let groups: Vec<&str> = by_pavement.iter().map(|s| s.group.as_str()).collect();
        assert_eq!(groups, ["AC_Thin", "CRCP"]);

        for &grouping in Grouping::all() {
            let total: usize = summarize_by(&f, "SN", grouping)
                .unwrap()
                .iter()
                .map(|s| s.stats.count)
                .sum();
            assert_eq!(total, 3, "{grouping}");
        }
    }

    #[test]
    fn histogram_starts_at_zero() {
        let f = frame(&[
            ("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, 10.0),
            ("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, 25.0),
            ("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, 40.0),
            ("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, f64::NAN),
        ]);
        let bins = histogram(&f, "SN", 4).unwrap();
        assert_eq!(bins.len(), 4);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[3].upper, 40.0);
        assert_eq!(
            bins.iter().map(|b| b.count).collect::<Vec<_>>(),
            vec![0, 1, 1, 1]
        );
    }

    #[test]
    fn histogram_extends_below_zero() {
        let f = frame(&[
            ("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, -2.0),
            ("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, 2.0),
        ]);
        let bins = histogram(&f, "SN", 2).unwrap();
        assert_eq!(bins[0].lower, -2.0);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[1].count, 1);
    }

    #[test]
    fn histogram_of_zeros_is_one_bin() {
        let f = frame(&[("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, 0.0)]);
        let bins = histogram(&f, "SN", 10).unwrap();
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 1);
    }

    #[test]
    fn histogram_of_extreme_range_has_finite_edges() {
        let f = frame(&[
            ("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, -f64::MAX),
            ("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, f64::MAX),
        ]);

        let bins = histogram(&f, "SN", 4).unwrap();
        assert_eq!(bins.len(), 4);
        assert!(bins.iter().all(|b| b.lower.is_finite() && b.upper.is_finite()));
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[3].count, 1);

        let single = histogram(&f, "SN", 1).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].lower, -f64::MAX);
        assert_eq!(single[0].upper, f64::MAX);
        assert_eq!(single[0].count, 2);
    }

    #[test]
    fn histogram_needs_bins() {
        let f = frame(&[("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, 1.0)]);
        assert!(matches!(histogram(&f, "SN", 0), Err(AnalyticsError::NoBins)));
    }

    #[test]
    fn range_ignores_non_finite() {
        let f = frame(&[
            ("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, f64::INFINITY),
            ("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, 12.5),
            ("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, 3.0),
        ]);
        assert_eq!(column_range(&f, "SN").unwrap(), Some((3.0, 12.5)));

        let empty = frame(&[("Austin", FacilityClass::FarmRoad, PavementType::ThinAsphalt, f64::NAN)]);
        assert_eq!(column_range(&empty, "SN").unwrap(), None);
    }
}
