//! County FIPS code utilities.
//!
//! Segment tables and the county reference table do not always agree on
//! how a county FIPS code is written: some exports keep the five-digit
//! string (`"48453"`), others drop the leading zeros of the state part or
//! store the number as a float (`48453.0`). Everything is normalized to the
//! five-digit form before joining, since that is also the key the county
//! boundary shapes use.

/// Number of digits in a full county FIPS code (state + county).
pub const COUNTY_FIPS_LEN: usize = 5;

/// Error returned when a county FIPS code cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFipsError {
    /// The raw value that was rejected.
    pub raw: String,
}

impl std::fmt::Display for InvalidFipsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid county FIPS code '{}': expected up to {COUNTY_FIPS_LEN} digits",
            self.raw
        )
    }
}

impl std::error::Error for InvalidFipsError {}

/// Normalizes a county FIPS code to its zero-padded five-digit form.
///
/// Accepts surrounding whitespace and a trailing `.0` (a numeric column
/// that went through a float).
///
/// # Errors
///
/// Returns [`InvalidFipsError`] if the value is empty, contains anything
/// other than digits, or is longer than five digits.
pub fn normalize_county_fips(raw: &str) -> Result<String, InvalidFipsError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);

    if digits.is_empty()
        || digits.len() > COUNTY_FIPS_LEN
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(InvalidFipsError {
            raw: raw.to_string(),
        });
    }

    Ok(format!("{digits:0>COUNTY_FIPS_LEN$}"))
}
