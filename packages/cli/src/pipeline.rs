//! Loading, filtering and evaluation shared by the data commands.

use std::path::{Path, PathBuf};

use friction_map_analytics::{AnalyticsError, PivotTable, column_range, pivot};
use friction_map_frame::{CovariateFrame, SelectionFilter};
use friction_map_geography_models::CountyDistrict;
use friction_map_model::{
    ModelError, ModelRegistry, ModelVariant, append_predictions, append_terms, select_for_variant,
};
use friction_map_model_models::{BaseForm, VariantKey};
use friction_map_segment_models::{Covariate, FacilityClass, PavementType, SegmentYearRecord};
use serde::Serialize;

/// Builds the registry: built-in variants plus any extra files.
///
/// # Errors
///
/// Returns an error if a file cannot be read or defines an invalid or
/// duplicate variant.
pub fn load_registry(extra: &[PathBuf]) -> Result<ModelRegistry, Box<dyn std::error::Error>> {
    let mut registry = ModelRegistry::builtin()?;
    for path in extra {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read variants {}: {e}", path.display()))?;
        registry.load_toml(&path.display().to_string(), &contents)?;
    }
    Ok(registry)
}

/// Looks up the requested variant.
///
/// # Errors
///
/// Returns an error if no such variant is registered.
pub fn variant<'a>(
    registry: &'a ModelRegistry,
    approach: &str,
    form: BaseForm,
) -> Result<&'a ModelVariant, ModelError> {
    Ok(registry.require(&VariantKey::new(form, approach))?)
}

/// Which per-row value a command works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Parameter {
    /// Predicted friction.
    Sn,
    /// Asymptote.
    A,
    /// Amplitude.
    B,
    /// Decay rate.
    C,
    /// Age shift (Form II only).
    T0,
}

impl Parameter {
    /// Name of the frame column holding this parameter.
    ///
    /// # Errors
    ///
    /// Returns an error for `t0` on a Form I variant.
    pub fn column(self, key: &VariantKey, prefix: &str) -> Result<String, String> {
        Ok(match self {
            Self::Sn => key.column(prefix),
            Self::A => key.column("a"),
            Self::B => key.column("b"),
            Self::C => key.column("c"),
            Self::T0 if key.form.has_shift() => key.column("t0"),
            Self::T0 => return Err(format!("{key} has no t0 parameter")),
        })
    }
}

/// Applies the interactive filters, then the variant's own row selection,
/// and evaluates the variant. The resulting frame carries the prediction
/// column and one column per decay parameter.
///
/// # Errors
///
/// Returns [`ModelError`] if evaluation fails.
pub fn evaluate_selection(
    variant: &ModelVariant,
    records: &[SegmentYearRecord],
    filter: &SelectionFilter,
    prefix: &str,
) -> Result<CovariateFrame, ModelError> {
    let filtered = filter.apply(records);
    let selected = select_for_variant(variant, &filtered)?;
    log::info!(
        "Evaluating {} on {} of {} records",
        variant.key(),
        selected.len(),
        records.len()
    );

    let frame = CovariateFrame::from_records(&selected);
    let frame = append_terms(variant, frame)?;
    append_predictions(variant, frame, prefix)
}

/// One evaluated segment-year, as printed by `evaluate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRow {
    /// County and district.
    #[serde(flatten)]
    pub geography: CountyDistrict,
    /// Contract identifier, if recorded.
    pub contract: Option<String>,
    /// Facility class.
    pub facility: FacilityClass,
    /// Pavement type.
    pub pavement: PavementType,
    /// Segment age in years.
    pub age: f64,
    /// Asymptote term.
    pub a: f64,
    /// Amplitude term.
    pub b: f64,
    /// Decay rate term.
    pub c: f64,
    /// Age shift, Form II only.
    pub t0: Option<f64>,
    /// Predicted friction.
    pub predicted: f64,
}

/// Flattens an evaluated frame into printable rows.
///
/// # Errors
///
/// Returns an error if the frame lacks a column [`evaluate_selection`]
/// adds.
pub fn prediction_rows(
    frame: &CovariateFrame,
    key: &VariantKey,
    prefix: &str,
) -> Result<Vec<PredictionRow>, String> {
    let column = |name: String| {
        frame
            .column(&name)
            .ok_or_else(|| format!("Column {name} missing from evaluated frame"))
    };
    let age = frame
        .covariate(Covariate::Age)
        .ok_or_else(|| format!("Column {} missing from evaluated frame", Covariate::Age))?;
    let a = column(key.column("a"))?;
    let b = column(key.column("b"))?;
    let c = column(key.column("c"))?;
    let t0 = key.form.has_shift().then(|| frame.column(&key.column("t0"))).flatten();
    let predicted = column(key.column(prefix))?;

    Ok((0..frame.len())
        .map(|i| PredictionRow {
            geography: frame.geography()[i].clone(),
            contract: frame.contracts()[i].clone(),
            facility: frame.facility()[i],
            pavement: frame.pavement()[i],
            age: age[i],
            a: a[i],
            b: b[i],
            c: c[i],
            t0: t0.map(|t0| t0[i]),
            predicted: predicted[i],
        })
        .collect())
}

/// Pivots `column` against `threshold`, defaulting to the column's finite
/// minimum. A selection with no finite values has no default; it yields no
/// threshold and an empty table, which joins to zero counts everywhere.
///
/// # Errors
///
/// Returns [`AnalyticsError`] if the column is missing or an explicit
/// threshold is not finite.
pub fn threshold_pivot(
    frame: &CovariateFrame,
    column: &str,
    threshold: Option<f64>,
) -> Result<(Option<f64>, PivotTable), AnalyticsError> {
    let threshold = match threshold {
        Some(threshold) => Some(threshold),
        None => column_range(frame, column)?.map(|(min, _)| min),
    };
    let Some(threshold) = threshold else {
        log::info!("{column} has no finite values; nothing to pivot");
        return Ok((None, PivotTable::default()));
    };
    Ok((Some(threshold), pivot(frame, threshold, column)?))
}

/// Resolves a path from its flag, then the config file.
///
/// # Errors
///
/// Returns an error naming the flag if neither is set.
pub fn required_path<'a>(
    flag: Option<&'a Path>,
    config: Option<&'a Path>,
    name: &str,
) -> Result<&'a Path, String> {
    flag.or(config).ok_or_else(|| {
        format!(
            "No {name} file configured; pass --{name} or set FRICTION_MAP_{}",
            name.to_uppercase()
        )
    })
}

#[cfg(test)]
mod tests {
    use friction_map_analytics::join_both;
    use friction_map_geography_models::GeographyReference;

    use super::*;

    fn record(age: f64, pavement: PavementType) -> SegmentYearRecord {
        SegmentYearRecord {
            geography: CountyDistrict {
                district_number: 14,
                district_name: "Austin".to_string(),
                district_abbr: "AUS".to_string(),
                county_number: 227,
                county_fips: "48453".to_string(),
                county_name: "Travis".to_string(),
            },
            contract: Some("0015-13".to_string()),
            facility: FacilityClass::UsHighway,
            pavement,
            age: Some(age),
            aadt: Some(9000.0),
            truck_pct: Some(14.0),
            tavg: Some(68.0),
            prcp: Some(34.0),
        }
    }

    #[test]
    fn evaluates_builtin_variant_over_filtered_rows() {
        let registry = load_registry(&[]).unwrap();
        let variant = variant(&registry, "step_iter", BaseForm::II).unwrap();
        let records = vec![
            record(2.0, PavementType::ThickAsphalt),
            record(3.0, PavementType::Other),
            record(4.0, PavementType::JointedConcrete),
        ];
        let filter = SelectionFilter {
            pavements: Some([PavementType::ThickAsphalt, PavementType::Other].into()),
            ..SelectionFilter::default()
        };

        let frame = evaluate_selection(variant, &records, &filter, "SN").unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(
            frame.derived_columns().collect::<Vec<_>>(),
            [
                "SN_step_iter_m2",
                "a_step_iter_m2",
                "b_step_iter_m2",
                "c_step_iter_m2",
                "t0_step_iter_m2",
            ]
        );

        let rows = prediction_rows(&frame, variant.key(), "SN").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].age, 2.0);
        assert!(rows[0].t0.is_some());
        assert!(rows[0].predicted.is_finite());
    }

    #[test]
    fn empty_selection_pivots_to_zero_counts() {
        let registry = load_registry(&[]).unwrap();
        let variant = variant(&registry, "stepwise", BaseForm::I).unwrap();
        let records = vec![record(2.0, PavementType::ThickAsphalt)];
        let filter = SelectionFilter {
            districts: Some(["HOU".to_string()].into()),
            ..SelectionFilter::default()
        };

        let frame = evaluate_selection(variant, &records, &filter, "SN").unwrap();
        assert_eq!(frame.len(), 0);

        let column = Parameter::Sn.column(variant.key(), "SN").unwrap();
        let (threshold, table) = threshold_pivot(&frame, &column, None).unwrap();
        assert_eq!(threshold, None);
        assert!(table.rows.is_empty());

        let reference = GeographyReference::new(vec![records[0].geography.clone()]).unwrap();
        let (meets, below) = join_both(&reference, &table);
        assert_eq!(meets.len(), 1);
        assert_eq!(meets[0].count, 0);
        assert_eq!(below[0].count, 0);
    }

    #[test]
    fn threshold_defaults_to_column_minimum() {
        let registry = load_registry(&[]).unwrap();
        let variant = variant(&registry, "stepwise", BaseForm::I).unwrap();
        let records = vec![
            record(1.0, PavementType::ThickAsphalt),
            record(6.0, PavementType::ThickAsphalt),
        ];
        let frame =
            evaluate_selection(variant, &records, &SelectionFilter::default(), "SN").unwrap();
        let column = Parameter::Sn.column(variant.key(), "SN").unwrap();

        let (threshold, table) = threshold_pivot(&frame, &column, None).unwrap();
        let (min, _) = column_range(&frame, &column).unwrap().unwrap();
        assert_eq!(threshold, Some(min));
        assert_eq!(table.total(true), 2);
        assert_eq!(table.total(false), 0);

        let (threshold, _) = threshold_pivot(&frame, &column, Some(1000.0)).unwrap();
        assert_eq!(threshold, Some(1000.0));
    }

    #[test]
    fn parameter_columns() {
        let key = VariantKey::new(BaseForm::I, "stepwise");
        assert_eq!(Parameter::Sn.column(&key, "SN").unwrap(), "SN_stepwise_m1");
        assert_eq!(Parameter::B.column(&key, "SN").unwrap(), "b_stepwise_m1");
        assert!(Parameter::T0.column(&key, "SN").is_err());

        let key = VariantKey::new(BaseForm::II, "stepwise");
        assert_eq!(Parameter::T0.column(&key, "SN").unwrap(), "t0_stepwise_m2");
    }

    #[test]
    fn unknown_approach_is_an_error() {
        let registry = load_registry(&[]).unwrap();
        assert!(variant(&registry, "lasso", BaseForm::I).is_err());
    }

    #[test]
    fn flag_path_wins_over_config() {
        let flag = PathBuf::from("flag.csv");
        let config = PathBuf::from("config.csv");
        assert_eq!(
            required_path(Some(flag.as_path()), Some(config.as_path()), "segments").unwrap(),
            flag.as_path()
        );
        assert_eq!(
            required_path(None, Some(config.as_path()), "segments").unwrap(),
            config.as_path()
        );
        assert!(required_path(None, None, "segments")
            .unwrap_err()
            .contains("FRICTION_MAP_SEGMENTS"));
    }
}
