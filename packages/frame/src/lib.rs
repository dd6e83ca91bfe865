#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Columnar covariate frame and row selection.
//!
//! Segment-year records are filtered with [`selection`] masks, then turned
//! into a [`CovariateFrame`]: one column per categorical or continuous
//! covariate, validated once at construction. Model outputs are appended
//! as named derived columns; input columns are never overwritten.

pub mod covariates;
pub mod selection;

pub use covariates::CovariateFrame;
pub use selection::{Mask, SelectionFilter};

use friction_map_segment_models::IndicatorError;
use thiserror::Error;

/// Errors that can occur while building or extending a frame.
#[derive(Debug, Error)]
pub enum FrameError {
    /// A column the caller needs is not in the frame.
    #[error("Missing column: {column}")]
    MissingColumn {
        /// Column name.
        column: String,
    },

    /// A derived column would shadow an existing column.
    #[error("Column already exists: {column}")]
    ColumnExists {
        /// Column name.
        column: String,
    },

    /// A column or mask does not have one value per row.
    #[error("Length mismatch for {column}: expected {expected} rows, got {actual}")]
    Length {
        /// Column or mask description.
        column: String,
        /// Number of rows in the frame.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// An indicator row did not decode to exactly one category.
    #[error("Invalid indicator row {row}: {source}")]
    Indicator {
        /// Row position.
        row: usize,
        /// What was wrong with the row.
        source: IndicatorError,
    },
}
