//! CSV-backed data source.
//!
//! Column headers follow the upstream export spelling. Cells holding the
//! spreadsheet error sentinel `#NAME?`, `NaN` or nothing at all are read as
//! missing values.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use friction_map_geography_models::fips::normalize_county_fips;
use friction_map_geography_models::{CountyDistrict, GeographyReference};
use friction_map_segment_models::{FacilityClass, PavementType, SegmentYearRecord};

use crate::{SegmentSource, SourceError};

const DISTRICT_NUMBER: &str = "District_Number";
const DISTRICT_NAME: &str = "District_Name";
const DISTRICT_ABBR: &str = "District_Abbr";
const COUNTY_NUMBER: &str = "County_Number";
const COUNTY_FIPS: &str = "County_FIPS_Code";
const COUNTY_NAME: &str = "County_Name";
const CONTRACT: &str = "CONT";
const FACILITY: &str = "HIGHWAY_FUN";
const PAVEMENT: &str = "PAV_TYPE";
const AGE: &str = "AGE";
const AADT: &str = "AADT";
const TRUCK_PCT: &str = "TRUCK_PCT";
const TAVG: &str = "tavg";
const PRCP: &str = "prcp";

const GEOGRAPHY_COLUMNS: [&str; 6] = [
    DISTRICT_NUMBER,
    DISTRICT_NAME,
    DISTRICT_ABBR,
    COUNTY_NUMBER,
    COUNTY_FIPS,
    COUNTY_NAME,
];

/// Cell values that mean "no value".
const MISSING_SENTINELS: &[&str] = &["", "#NAME?", "NaN", "nan"];

/// Reads segments and geography from two CSV files.
#[derive(Debug, Clone)]
pub struct CsvSource {
    segments_path: PathBuf,
    geography_path: PathBuf,
}

impl CsvSource {
    /// Creates a source over the given files. Nothing is read until
    /// [`SegmentSource::segments`] or [`SegmentSource::geography`] is
    /// called.
    #[must_use]
    pub fn new(segments_path: impl Into<PathBuf>, geography_path: impl Into<PathBuf>) -> Self {
        Self {
            segments_path: segments_path.into(),
            geography_path: geography_path.into(),
        }
    }
}

fn open(path: &Path) -> Result<std::fs::File, SourceError> {
    log::debug!("Opening {}", path.display());
    Ok(std::fs::File::open(path)?)
}

impl SegmentSource for CsvSource {
    fn segments(&self) -> Result<Vec<SegmentYearRecord>, SourceError> {
        read_segments(
            open(&self.segments_path)?,
            &self.segments_path.display().to_string(),
        )
    }

    fn geography(&self) -> Result<GeographyReference, SourceError> {
        read_geography(
            open(&self.geography_path)?,
            &self.geography_path.display().to_string(),
        )
    }
}

/// Header positions of one CSV stream.
struct Columns {
    source_name: String,
    positions: BTreeMap<String, usize>,
}

impl Columns {
    fn new<R: Read>(
        reader: &mut csv::Reader<R>,
        source_name: &str,
        required: &[&'static str],
    ) -> Result<Self, SourceError> {
        let positions: BTreeMap<String, usize> = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_owned(), i))
            .collect();

        if let Some(&column) = required.iter().find(|c| !positions.contains_key(**c)) {
            return Err(SourceError::MissingColumn {
                source_name: source_name.to_string(),
                column,
            });
        }

        Ok(Self {
            source_name: source_name.to_string(),
            positions,
        })
    }

    fn has(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    fn parse_error(&self, row: usize, column: &'static str, message: String) -> SourceError {
        SourceError::Parse {
            source_name: self.source_name.clone(),
            row,
            column,
            message,
        }
    }
}

/// One data row with its 1-based row number.
struct Row<'a> {
    columns: &'a Columns,
    record: &'a csv::StringRecord,
    number: usize,
}

impl Row<'_> {
    /// Trimmed cell, or `None` for a missing value or absent column.
    fn cell(&self, column: &str) -> Option<&str> {
        let value = self
            .columns
            .positions
            .get(column)
            .and_then(|&i| self.record.get(i))?
            .trim();
        (!MISSING_SENTINELS.contains(&value)).then_some(value)
    }

    fn text(&self, column: &'static str) -> Result<String, SourceError> {
        self.cell(column).map(str::to_owned).ok_or_else(|| {
            self.columns
                .parse_error(self.number, column, "value is missing".to_string())
        })
    }

    fn real(&self, column: &'static str) -> Result<Option<f64>, SourceError> {
        self.cell(column)
            .map(|value| {
                value.parse::<f64>().map_err(|e| {
                    self.columns
                        .parse_error(self.number, column, format!("'{value}': {e}"))
                })
            })
            .transpose()
            .map(|value| value.filter(|v| v.is_finite()))
    }

    /// Whole number, accepting a trailing `.0` from float-typed exports.
    fn whole(&self, column: &'static str) -> Result<u32, SourceError> {
        let value = self.text(column)?;
        value
            .strip_suffix(".0")
            .unwrap_or(&value)
            .parse::<u32>()
            .map_err(|e| {
                self.columns
                    .parse_error(self.number, column, format!("'{value}': {e}"))
            })
    }

    fn label<T: FromStr>(&self, column: &'static str) -> Result<T, SourceError>
    where
        T::Err: std::fmt::Display,
    {
        let value = self.text(column)?;
        value.parse::<T>().map_err(|e| {
            self.columns
                .parse_error(self.number, column, format!("'{value}': {e}"))
        })
    }

    fn geography(&self) -> Result<CountyDistrict, SourceError> {
        let raw_fips = self.text(COUNTY_FIPS)?;
        let county_fips = normalize_county_fips(&raw_fips).map_err(|e| {
            self.columns
                .parse_error(self.number, COUNTY_FIPS, e.to_string())
        })?;

        Ok(CountyDistrict {
            district_number: self.whole(DISTRICT_NUMBER)?,
            district_name: self.text(DISTRICT_NAME)?,
            district_abbr: self.text(DISTRICT_ABBR)?,
            county_number: self.whole(COUNTY_NUMBER)?,
            county_fips,
            county_name: self.text(COUNTY_NAME)?,
        })
    }

    /// Unrecognized pavement labels fall into the catch-all category.
    fn pavement(&self) -> Result<PavementType, SourceError> {
        let value = self.text(PAVEMENT)?;
        Ok(value.parse().unwrap_or_else(|_| {
            log::debug!(
                "{} row {}: unrecognized {PAVEMENT} '{value}', treating as other",
                self.columns.source_name,
                self.number
            );
            PavementType::Other
        }))
    }

    fn segment(&self) -> Result<SegmentYearRecord, SourceError> {
        Ok(SegmentYearRecord {
            geography: self.geography()?,
            contract: self.cell(CONTRACT).map(str::to_owned),
            facility: self.label::<FacilityClass>(FACILITY)?,
            pavement: self.pavement()?,
            age: self.real(AGE)?,
            aadt: self.real(AADT)?,
            truck_pct: self.real(TRUCK_PCT)?,
            tavg: self.real(TAVG)?,
            prcp: self.real(PRCP)?,
        })
    }
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().flexible(true).from_reader(input)
}

/// Reads segment-year records from CSV.
///
/// Geography, facility and pavement columns are required. Covariate
/// columns may be absent, in which case every record lacks that covariate.
///
/// # Errors
///
/// * [`SourceError::MissingColumn`] if a required header is absent.
/// * [`SourceError::Parse`] if a cell cannot be interpreted.
/// * [`SourceError::Csv`] if the stream is not valid CSV.
pub fn read_segments<R: Read>(
    input: R,
    source_name: &str,
) -> Result<Vec<SegmentYearRecord>, SourceError> {
    let mut reader = reader(input);
    let mut required = GEOGRAPHY_COLUMNS.to_vec();
    required.extend([FACILITY, PAVEMENT]);
    let columns = Columns::new(&mut reader, source_name, &required)?;

    for covariate in [AGE, AADT, TRUCK_PCT, TAVG, PRCP] {
        if !columns.has(covariate) {
            log::warn!("{source_name}: no {covariate} column");
        }
    }

    let mut segments = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let row = Row {
            columns: &columns,
            record: &record,
            number: i + 1,
        };
        segments.push(row.segment()?);
    }

    log::info!("Read {} segment-year records from {source_name}", segments.len());
    Ok(segments)
}

/// Reads the county reference table from CSV.
///
/// # Errors
///
/// * [`SourceError::MissingColumn`] if a geography header is absent.
/// * [`SourceError::Parse`] if a cell cannot be interpreted.
/// * [`SourceError::Geography`] if a county appears twice.
/// * [`SourceError::Csv`] if the stream is not valid CSV.
pub fn read_geography<R: Read>(
    input: R,
    source_name: &str,
) -> Result<GeographyReference, SourceError> {
    let mut reader = reader(input);
    let columns = Columns::new(&mut reader, source_name, &GEOGRAPHY_COLUMNS)?;

    let mut counties = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let row = Row {
            columns: &columns,
            record: &record,
            number: i + 1,
        };
        counties.push(row.geography()?);
    }

    log::info!("Read {} counties from {source_name}", counties.len());
    Ok(GeographyReference::new(counties)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEGMENTS: &str = "\
District_Number,District_Name,District_Abbr,County_Number,County_FIPS_Code,County_Name,CONT,HIGHWAY_FUN,PAV_TYPE,AGE,AADT,TRUCK_PCT,tavg,prcp
14,Austin,AUS,227,48453,Travis,0015-13,IH,CRCP,6,98000,12.5,68.1,34.2
14.0,Austin,AUS,105,48209.0,Hays,,FM,AC_Thin,#NAME?,2100,9,67.4,33.9
11,Lufkin,LFK,1,48001,Anderson,0142-03,SH,other,12,5400,NaN,,41.0
";

    const GEOGRAPHY: &str = "\
District_Number,District_Name,District_Abbr,County_Number,County_FIPS_Code,County_Name
14,Austin,AUS,227,48453,Travis
14,Austin,AUS,105,48209,Hays
11,Lufkin,LFK,1,1,Anderson
";

    #[test]
    fn reads_segments_with_missing_values() {
        let segments = read_segments(SEGMENTS.as_bytes(), "segments.csv").unwrap();
        assert_eq!(segments.len(), 3);

        let travis = &segments[0];
        assert_eq!(travis.geography.county_fips, "48453");
        assert_eq!(travis.contract.as_deref(), Some("0015-13"));
        assert_eq!(travis.facility, FacilityClass::Interstate);
        assert_eq!(travis.pavement, PavementType::ContinuousConcrete);
        assert_eq!(travis.truck_pct, Some(12.5));

        let hays = &segments[1];
        assert_eq!(hays.geography.district_number, 14);
        assert_eq!(hays.geography.county_fips, "48209");
        assert_eq!(hays.contract, None);
        assert_eq!(hays.age, None);
        assert_eq!(hays.aadt, Some(2100.0));

        let anderson = &segments[2];
        assert_eq!(anderson.pavement, PavementType::Other);
        assert_eq!(anderson.truck_pct, None);
        assert_eq!(anderson.tavg, None);
        assert_eq!(anderson.prcp, Some(41.0));
    }

    #[test]
    fn reads_geography_and_pads_fips() {
        let reference = read_geography(GEOGRAPHY.as_bytes(), "counties.csv").unwrap();
        assert_eq!(reference.len(), 3);
        assert_eq!(reference.county("00001").unwrap().county_name, "Anderson");
        assert_eq!(reference.county("48209").unwrap().district_abbr, "AUS");
    }

    #[test]
    fn duplicate_county_is_an_error() {
        let csv = "\
District_Number,District_Name,District_Abbr,County_Number,County_FIPS_Code,County_Name
14,Austin,AUS,227,48453,Travis
14,Austin,AUS,227,48453,Travis
";
        let err = read_geography(csv.as_bytes(), "counties.csv").unwrap_err();
        assert!(matches!(err, SourceError::Geography(_)));
    }

    #[test]
    fn missing_header_is_reported() {
        let csv = "District_Number,District_Name\n14,Austin\n";
        let err = read_geography(csv.as_bytes(), "counties.csv").unwrap_err();
        assert!(matches!(
            err,
            SourceError::MissingColumn { column: "District_Abbr", .. }
        ));
    }

    #[test]
    fn bad_cell_reports_row_and_column() {
        let csv = "\
District_Number,District_Name,District_Abbr,County_Number,County_FIPS_Code,County_Name,HIGHWAY_FUN,PAV_TYPE,AGE
14,Austin,AUS,227,48453,Travis,IH,JCP,4
14,Austin,AUS,227,48453,Travis,IH,JCP,old
";
        let err = read_segments(csv.as_bytes(), "segments.csv").unwrap_err();
        assert!(matches!(
            err,
            SourceError::Parse { row: 2, column: "AGE", .. }
        ));
    }

    #[test]
    fn unknown_facility_is_an_error() {
        let csv = "\
District_Number,District_Name,District_Abbr,County_Number,County_FIPS_Code,County_Name,HIGHWAY_FUN,PAV_TYPE
14,Austin,AUS,227,48453,Travis,RM,JCP
";
        let err = read_segments(csv.as_bytes(), "segments.csv").unwrap_err();
        assert!(matches!(
            err,
            SourceError::Parse { column: "HIGHWAY_FUN", .. }
        ));
    }

    #[test]
    fn absent_covariate_columns_read_as_missing() {
        let csv = "\
District_Number,District_Name,District_Abbr,County_Number,County_FIPS_Code,County_Name,HIGHWAY_FUN,PAV_TYPE,AGE
14,Austin,AUS,227,48453,Travis,US,COM,3.5
";
        let segments = read_segments(csv.as_bytes(), "segments.csv").unwrap();
        assert_eq!(segments[0].age, Some(3.5));
        assert_eq!(segments[0].aadt, None);
    }

    #[test]
    fn csv_source_reads_files() {
        let dir = std::env::temp_dir().join(format!("friction_map_source_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let segments_path = dir.join("segments.csv");
        let geography_path = dir.join("counties.csv");
        std::fs::write(&segments_path, SEGMENTS).unwrap();
        std::fs::write(&geography_path, GEOGRAPHY).unwrap();

        let source = CsvSource::new(&segments_path, &geography_path);
        assert_eq!(source.segments().unwrap().len(), 3);
        assert_eq!(source.geography().unwrap().len(), 3);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_file_is_io_error() {
        let source = CsvSource::new("/nonexistent/segments.csv", "/nonexistent/counties.csv");
        assert!(matches!(source.segments(), Err(SourceError::Io(_))));
    }
}
