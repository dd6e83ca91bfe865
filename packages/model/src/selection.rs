//! Row preparation for a specific variant.

use friction_map_frame::selection::{complete_cases, modeled_pavement};
use friction_map_segment_models::SegmentYearRecord;

use crate::ModelError;
use crate::variant::ModelVariant;

/// Keeps the rows a variant can be evaluated on: every covariate it reads
/// is recorded and the pavement type is one the models were fit on.
///
/// # Errors
///
/// Returns [`ModelError::Frame`] if the masks disagree in length, which
/// only happens if `records` changes between mask construction and use.
pub fn select_for_variant(
    variant: &ModelVariant,
    records: &[SegmentYearRecord],
) -> Result<Vec<SegmentYearRecord>, ModelError> {
    let required = variant.required_covariates();
    let mask = complete_cases(records, &required).and(&modeled_pavement(records))?;
    let kept = mask.apply(records)?;

    let dropped = records.len() - kept.len();
    if dropped > 0 {
        log::warn!(
            "Dropped {dropped} of {} rows for {}: incomplete covariates or unmodeled pavement",
            records.len(),
            variant.key()
        );
    }

    Ok(kept)
}

#[cfg(test)]
mod tests {
    use friction_map_geography_models::CountyDistrict;
    use friction_map_model_models::{BaseForm, CovariateSet};
    use friction_map_segment_models::{FacilityClass, PavementType};

    use super::*;
    use crate::variant::tests::{sequential, spec};

    fn record(pavement: PavementType, truck_pct: Option<f64>) -> SegmentYearRecord {
        SegmentYearRecord {
            geography: CountyDistrict::default(),
            contract: None,
            facility: FacilityClass::StateHighway,
            pavement,
            age: Some(4.0),
            aadt: Some(8000.0),
            truck_pct,
            tavg: Some(66.0),
            prcp: Some(30.0),
        }
    }

    #[test]
    fn drops_incomplete_and_unmodeled_rows() {
        let variant =
            ModelVariant::from_spec(spec(BaseForm::I, CovariateSet::Full, None, sequential(14)))
                .unwrap();
        let records = vec![
            record(PavementType::ThinAsphalt, Some(12.0)),
            record(PavementType::Other, Some(12.0)),
            record(PavementType::Composite, None),
            record(PavementType::ContinuousConcrete, Some(30.0)),
        ];

        let kept = select_for_variant(&variant, &records).unwrap();
        assert_eq!(kept, vec![records[0].clone(), records[3].clone()]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let variant = ModelVariant::from_spec(spec(
            BaseForm::II,
            CovariateSet::FacilityRemoved,
            None,
            sequential(12),
        ))
        .unwrap();
        assert!(select_for_variant(&variant, &[]).unwrap().is_empty());
    }
}
