#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Segment and geography data sources.
//!
//! A [`SegmentSource`] hands the aggregation core fully materialized
//! segment-year records and the county reference table. The core never
//! reads data itself.

pub mod csv_source;

pub use csv_source::CsvSource;

use friction_map_geography_models::{DuplicateCountyError, GeographyReference};
use friction_map_segment_models::SegmentYearRecord;

/// Errors that can occur while reading a data source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// CSV reading failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required column is absent from the header row.
    #[error("{source_name}: missing column {column}")]
    MissingColumn {
        /// File or stream label.
        source_name: String,
        /// Expected header.
        column: &'static str,
    },

    /// A cell could not be interpreted.
    #[error("{source_name} row {row}, column {column}: {message}")]
    Parse {
        /// File or stream label.
        source_name: String,
        /// 1-based data row number.
        row: usize,
        /// Column header.
        column: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// The geography table lists a county twice.
    #[error(transparent)]
    Geography(#[from] DuplicateCountyError),
}

/// Supplier of the data the aggregation core works on.
pub trait SegmentSource {
    /// Returns every segment-year record.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the data cannot be read or parsed.
    fn segments(&self) -> Result<Vec<SegmentYearRecord>, SourceError>;

    /// Returns the county reference table.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the data cannot be read or parsed.
    fn geography(&self) -> Result<GeographyReference, SourceError>;
}
