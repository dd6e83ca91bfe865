//! Closed categorical vocabularies and their one-hot encoding.
//!
//! Facility class and pavement type are fixed, small vocabularies. The
//! fitted models consume them as 0/1 indicator columns, one per level,
//! with exactly one indicator set per row. [`Category`] is the total
//! mapping between a label and its indicator row, in both directions.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Functional road classification of a segment.
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
pub enum FacilityClass {
    /// Farm-to-market road (model baseline).
    #[serde(rename = "FM")]
    #[strum(serialize = "FM")]
    FarmRoad,
    /// State highway.
    #[serde(rename = "SH")]
    #[strum(serialize = "SH")]
    StateHighway,
    /// US highway.
    #[serde(rename = "US")]
    #[strum(serialize = "US")]
    UsHighway,
    /// Interstate highway.
    #[serde(rename = "IH")]
    #[strum(serialize = "IH")]
    Interstate,
}

impl Category for FacilityClass {
    const LEVELS: &'static [Self] = &[
        Self::FarmRoad,
        Self::StateHighway,
        Self::UsHighway,
        Self::Interstate,
    ];
}

/// Pavement structure type of a segment.
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
pub enum PavementType {
    /// Thin asphalt concrete (model baseline).
    #[serde(rename = "AC_Thin")]
    #[strum(serialize = "AC_Thin")]
    ThinAsphalt,
    /// Thick asphalt concrete.
    #[serde(rename = "AC_Thick")]
    #[strum(serialize = "AC_Thick")]
    ThickAsphalt,
    /// Composite (asphalt over concrete).
    #[serde(rename = "COM")]
    #[strum(serialize = "COM")]
    Composite,
    /// Jointed concrete pavement.
    #[serde(rename = "JCP")]
    #[strum(serialize = "JCP")]
    JointedConcrete,
    /// Continuously reinforced concrete pavement.
    #[serde(rename = "CRCP")]
    #[strum(serialize = "CRCP")]
    ContinuousConcrete,
    /// Catch-all for pavements outside the modeled types. Never modeled.
    #[serde(rename = "other")]
    #[strum(serialize = "other")]
    Other,
}

impl PavementType {
    /// Pavement types the degradation models were fit on.
    pub const MODELED: &'static [Self] = &[
        Self::ThinAsphalt,
        Self::ThickAsphalt,
        Self::Composite,
        Self::JointedConcrete,
        Self::ContinuousConcrete,
    ];

    /// Returns `true` for every type except [`PavementType::Other`].
    #[must_use]
    pub const fn is_modeled(self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl Category for PavementType {
    const LEVELS: &'static [Self] = &[
        Self::ThinAsphalt,
        Self::ThickAsphalt,
        Self::Composite,
        Self::JointedConcrete,
        Self::ContinuousConcrete,
        Self::Other,
    ];
}

/// Error returned when an indicator row does not decode to exactly one
/// level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorError {
    /// The row has a different number of columns than the vocabulary has
    /// levels.
    Width {
        /// Number of levels in the vocabulary.
        expected: usize,
        /// Number of columns supplied.
        actual: usize,
    },
    /// A column held something other than 0 or 1.
    NotBinary {
        /// Column position.
        column: usize,
        /// The offending value.
        value: f64,
    },
    /// Zero or several indicators were set.
    NotOneHot {
        /// How many indicators were set.
        set: usize,
    },
}

impl std::fmt::Display for IndicatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Width { expected, actual } => {
                write!(f, "expected {expected} indicator columns, got {actual}")
            }
            Self::NotBinary { column, value } => {
                write!(f, "indicator column {column} holds {value}, expected 0 or 1")
            }
            Self::NotOneHot { set } => {
                write!(f, "{set} indicators set, expected exactly one")
            }
        }
    }
}

impl std::error::Error for IndicatorError {}

/// A fixed vocabulary with a one-hot indicator encoding.
pub trait Category: Copy + Eq + Sized + 'static {
    /// Every level, in indicator column order.
    const LEVELS: &'static [Self];

    /// The indicator value of `level` for a row labelled `self`.
    fn indicator(self, level: Self) -> f64 {
        if self == level { 1.0 } else { 0.0 }
    }

    /// The full indicator row for this label.
    fn encode(self) -> Vec<f64> {
        Self::LEVELS.iter().map(|&level| self.indicator(level)).collect()
    }

    /// Recovers the label from an indicator row.
    ///
    /// # Errors
    ///
    /// Returns [`IndicatorError`] if the row has the wrong width, holds a
    /// non-binary value, or does not have exactly one indicator set.
    #[allow(clippy::float_cmp)]
    fn decode(indicators: &[f64]) -> Result<Self, IndicatorError> {
        if indicators.len() != Self::LEVELS.len() {
            return Err(IndicatorError::Width {
                expected: Self::LEVELS.len(),
                actual: indicators.len(),
            });
        }

        let mut found = None;
        let mut set = 0;
        for (column, (&value, &level)) in indicators.iter().zip(Self::LEVELS).enumerate() {
            if value == 1.0 {
                found = Some(level);
                set += 1;
            } else if value != 0.0 {
                return Err(IndicatorError::NotBinary { column, value });
            }
        }

        match found {
            Some(level) if set == 1 => Ok(level),
            _ => Err(IndicatorError::NotOneHot { set }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::*;

    #[test]
    fn facility_round_trips_through_indicators() {
        for &facility in FacilityClass::LEVELS {
            let row = facility.encode();
            assert_eq!(row.iter().sum::<f64>(), 1.0);
            assert_eq!(FacilityClass::decode(&row).unwrap(), facility);
        }
    }

    #[test]
    fn pavement_round_trips_through_indicators() {
        for &pavement in PavementType::LEVELS {
            let row = pavement.encode();
            assert_eq!(row.iter().sum::<f64>(), 1.0);
            assert_eq!(PavementType::decode(&row).unwrap(), pavement);
        }
    }

    #[test]
    fn decode_rejects_malformed_rows() {
        assert_eq!(
            FacilityClass::decode(&[1.0, 0.0]),
            Err(IndicatorError::Width {
                expected: 4,
                actual: 2
            })
        );
        assert_eq!(
            FacilityClass::decode(&[0.0, 0.0, 0.0, 0.0]),
            Err(IndicatorError::NotOneHot { set: 0 })
        );
        assert_eq!(
            FacilityClass::decode(&[1.0, 1.0, 0.0, 0.0]),
            Err(IndicatorError::NotOneHot { set: 2 })
        );
        assert!(matches!(
            FacilityClass::decode(&[0.5, 0.5, 0.0, 0.0]),
            Err(IndicatorError::NotBinary { column: 0, .. })
        ));
    }

    #[test]
    fn labels_use_source_spellings() {
        assert_eq!(FacilityClass::Interstate.as_ref(), "IH");
        assert_eq!(
            PavementType::from_str("AC_Thick").unwrap(),
            PavementType::ThickAsphalt
        );
        assert_eq!(PavementType::from_str("other").unwrap(), PavementType::Other);
        assert!(PavementType::from_str("gravel").is_err());
    }

    #[test]
    fn other_is_not_modeled() {
        assert!(!PavementType::Other.is_modeled());
        assert!(PavementType::MODELED.iter().all(|p| p.is_modeled()));
    }
}
