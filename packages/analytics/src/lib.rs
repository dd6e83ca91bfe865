#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation over model output.
//!
//! Turns a prediction column into the tables the presentation layer draws:
//! per-county threshold counts joined onto the full county list for
//! choropleths, and distribution summaries for histograms and box plots.
//! Every function is a pure read of an immutable
//! [`CovariateFrame`](friction_map_frame::CovariateFrame).

pub mod join;
pub mod pivot;
pub mod summary;

pub use join::{CountyCount, join, join_both};
pub use pivot::{PivotRow, PivotTable, pivot};
pub use summary::{BoxStats, GroupSummary, Grouping, HistogramBin, column_range, histogram, summarize_by};

use friction_map_frame::CovariateFrame;
use thiserror::Error;

/// Errors that can occur during aggregation.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The frame has no column with this name.
    #[error("Column {column} not found")]
    MissingColumn {
        /// Requested column.
        column: String,
    },

    /// Threshold comparisons against NaN or infinity are meaningless.
    #[error("Threshold must be finite, got {threshold}")]
    NonFiniteThreshold {
        /// Offending threshold.
        threshold: f64,
    },

    /// A histogram needs at least one bin.
    #[error("Histogram bin count must be positive")]
    NoBins,
}

/// Looks up a column by name.
fn column<'a>(frame: &'a CovariateFrame, name: &str) -> Result<&'a [f64], AnalyticsError> {
    frame
        .column(name)
        .ok_or_else(|| AnalyticsError::MissingColumn {
            column: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use friction_map_frame::CovariateFrame;
    use friction_map_geography_models::{CountyDistrict, GeographyReference};
    use friction_map_model::{ModelVariant, append_predictions};
    use friction_map_model_models::{BaseForm, CovariateSet, VariantKey, VariantSpec};
    use friction_map_segment_models::{FacilityClass, PavementType, SegmentYearRecord};

    use crate::{join_both, pivot};

    fn anderson() -> CountyDistrict {
        CountyDistrict {
            district_number: 10,
            district_name: "Tyler".to_string(),
            district_abbr: "TYL".to_string(),
            county_number: 1,
            county_fips: "48001".to_string(),
            county_name: "Anderson".to_string(),
        }
    }

    fn andrews() -> CountyDistrict {
        CountyDistrict {
            district_number: 6,
            district_name: "Odessa".to_string(),
            district_abbr: "ODA".to_string(),
            county_number: 2,
            county_fips: "48003".to_string(),
            county_name: "Andrews".to_string(),
        }
    }

    #[test]
    fn predictions_pivot_and_join_end_to_end() {
        let mut coefficients = vec![0.0; 14];
        coefficients[0] = 2.0;
        coefficients[4] = 10.0;
        coefficients[12] = 0.1;
        let variant = ModelVariant::from_spec(VariantSpec {
            key: VariantKey::new(BaseForm::I, "synthetic"),
            description: None,
            covariate_set: CovariateSet::Full,
            group_effect: None,
            coefficients,
        })
        .unwrap();

        let records: Vec<SegmentYearRecord> = [1.0, 5.0, 10.0]
            .into_iter()
            .map(|age| SegmentYearRecord {
                geography: anderson(),
                contract: Some("0001".to_string()),
                facility: FacilityClass::StateHighway,
                pavement: PavementType::ThickAsphalt,
                age: Some(age),
                aadt: Some(12_000.0),
                truck_pct: Some(18.0),
                tavg: Some(65.0),
                prcp: Some(40.0),
            })
            .collect();

        let frame = append_predictions(&variant, CovariateFrame::from_records(&records), "SN")
            .unwrap();
        let predicted = frame.column("SN_synthetic_m1").unwrap();
        for (&age, &value) in [1.0_f64, 5.0, 10.0].iter().zip(predicted) {
            assert!((value - 10.0_f64.mul_add((-0.1 * age).exp(), 2.0)).abs() < 1e-12);
        }
        assert!((predicted[0] - 11.048_374_180_359_595).abs() < 1e-12);

        let table = pivot(&frame, 10.0, "SN_synthetic_m1").unwrap();
        assert_eq!(table.total(true), 1);
        assert_eq!(table.total(false), 2);

        let reference = GeographyReference::new(vec![anderson(), andrews()]).unwrap();
        let (meets, misses) = join_both(&reference, &table);
        assert_eq!(meets.iter().map(|c| c.count).collect::<Vec<_>>(), vec![1, 0]);
        assert_eq!(misses.iter().map(|c| c.count).collect::<Vec<_>>(), vec![2, 0]);
    }
}
