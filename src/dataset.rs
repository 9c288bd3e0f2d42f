/// SmokeStats Dataset
///
/// A Dataset is the immutable, row-ordered result of reading a smoking
/// statistics CSV file. Loading validates the header against a
/// [`CsvLayout`] and parses the required cells of every row, so that every
/// later stage can rely on `country`, `year` and `percentage_total` being
/// present.
///
/// # Examples
///
/// ```
/// use smokestats::Dataset;
///
/// let csv = "Country,Year,Data.Percentage.Total\nUS,2010,20.0\nFR,2010,30.0\n";
/// let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
///
/// assert_eq!(dataset.len(), 2);
/// assert_eq!(dataset.countries(), vec!["FR", "US"]);
/// ```

use crate::error::{DashboardError, Result};
use crate::schema::{ColumnMap, CsvLayout, Schema};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub country: String,
    pub year: i32,
    pub percentage_total: f64,
    /// `None` when the column is absent or the cell holds a missing-value
    /// marker (empty, `NA`, `NaN`, `null`, ...).
    pub percentage_male: Option<f64>,
    pub percentage_female: Option<f64>,
}

/// Rows sharing one schema, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: Schema,
    rows: Vec<Row>,
    /// Distinct years, ascending; computed once at load
    years: Vec<i32>,
    /// Distinct countries, sorted; computed once at load
    countries: Vec<String>,
}

/// Cell values read as missing in the optional gender columns. These are
/// the markers dataframe CSV readers treat as NA by default.
const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl Dataset {
    /// Read a CSV file using the default column names.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_path_with_layout(path, CsvLayout::default())
    }

    pub fn from_path_with_layout(path: impl AsRef<Path>, layout: CsvLayout) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DashboardError::io(path, e))?;
        let dataset = Self::from_reader_with_layout(file, layout)?;
        info!(
            "loaded {} rows ({} countries, {} years) from {}",
            dataset.len(),
            dataset.countries().len(),
            dataset.years().len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Read CSV data from any reader using the default column names.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_layout(reader, CsvLayout::default())
    }

    /// Read CSV data from any reader.
    ///
    /// The header row is required. Fails with a schema error naming the
    /// first missing required column before any data row is read.
    pub fn from_reader_with_layout<R: Read>(reader: R, layout: CsvLayout) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let header: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let schema = Schema::from_header(&header, layout)?;
        let map = schema.column_map();

        let mut rows = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            // Data rows are numbered from 1, the header being row 0.
            rows.push(parse_row(&record, i + 1, &schema, map)?);
        }
        debug!("parsed {} data rows, {} columns", rows.len(), schema.len());

        let years: Vec<i32> = rows
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let countries: Vec<String> = rows
            .iter()
            .map(|r| r.country.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        Ok(Dataset {
            schema,
            rows,
            years,
            countries,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn get_row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter_rows(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Distinct countries, sorted by name.
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    pub fn has_year(&self, year: i32) -> bool {
        self.years.binary_search(&year).is_ok()
    }

    pub fn has_country(&self, country: &str) -> bool {
        self.countries
            .binary_search_by(|c| c.as_str().cmp(country))
            .is_ok()
    }
}

fn parse_row(record: &StringRecord, row: usize, schema: &Schema, map: ColumnMap) -> Result<Row> {
    let layout = schema.layout();

    let country = required_cell(record, row, map.country, &layout.country)?;
    let year_raw = required_cell(record, row, map.year, &layout.year)?;
    let year = year_raw
        .parse::<i32>()
        .map_err(|e| invalid(row, &layout.year, year_raw, e.to_string()))?;
    let total_raw = required_cell(record, row, map.total, &layout.total)?;
    let percentage_total = parse_rate(total_raw)
        .map_err(|reason| invalid(row, &layout.total, total_raw, reason))?;

    let (percentage_male, percentage_female) = match map.gender {
        Some((m, f)) => (
            optional_rate(record, row, m, &layout.male)?,
            optional_rate(record, row, f, &layout.female)?,
        ),
        None => (None, None),
    };

    Ok(Row {
        country: country.to_string(),
        year,
        percentage_total,
        percentage_male,
        percentage_female,
    })
}

fn required_cell<'r>(
    record: &'r StringRecord,
    row: usize,
    index: usize,
    column: &str,
) -> Result<&'r str> {
    match record.get(index) {
        Some(value) if !value.is_empty() => Ok(value),
        Some(value) => Err(invalid(row, column, value, "required value is empty".to_string())),
        None => Err(invalid(row, column, "", "row is shorter than the header".to_string())),
    }
}

fn optional_rate(
    record: &StringRecord,
    row: usize,
    index: usize,
    column: &str,
) -> Result<Option<f64>> {
    match record.get(index) {
        None => Ok(None),
        Some(value) if NA_MARKERS.contains(&value) => Ok(None),
        Some(value) => parse_rate(value)
            .map(Some)
            .map_err(|reason| invalid(row, column, value, reason)),
    }
}

fn parse_rate(value: &str) -> std::result::Result<f64, String> {
    let rate = value.parse::<f64>().map_err(|e| e.to_string())?;
    if rate.is_finite() {
        Ok(rate)
    } else {
        Err("expected a finite number".to_string())
    }
}

fn invalid(row: usize, column: &str, value: &str, reason: String) -> DashboardError {
    DashboardError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const WITH_GENDER: &str = "\
Continent,Country,Year,Data.Percentage.Male,Data.Percentage.Female,Data.Percentage.Total
Europe,France,2010,32.5,25.1,28.7
North America,United States,2010,19.0,15.2,17.0
Europe,France,2011,,24.0,27.9
";

    #[test]
    fn test_load_rows_in_file_order() {
        let dataset = Dataset::from_reader(WITH_GENDER.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 3);
        assert!(dataset.schema().has_gender_columns());

        let first = dataset.get_row(0).unwrap();
        assert_eq!(first.country, "France");
        assert_eq!(first.year, 2010);
        assert_eq!(first.percentage_total, 28.7);
        assert_eq!(first.percentage_male, Some(32.5));
        assert_eq!(first.percentage_female, Some(25.1));

        assert_eq!(dataset.get_row(1).unwrap().country, "United States");
    }

    #[test]
    fn test_empty_gender_cell_is_none() {
        let dataset = Dataset::from_reader(WITH_GENDER.as_bytes()).unwrap();
        let row = dataset.get_row(2).unwrap();
        assert_eq!(row.percentage_male, None);
        assert_eq!(row.percentage_female, Some(24.0));
    }

    #[test]
    fn test_na_markers_in_gender_cells_are_none() {
        let csv = "\
Country,Year,Data.Percentage.Male,Data.Percentage.Female,Data.Percentage.Total
France,2010,NaN,25.1,28.7
France,2011,NA,N/A,27.9
France,2012,null,nan,27.0
";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);

        let gender: Vec<(Option<f64>, Option<f64>)> = dataset
            .iter_rows()
            .map(|r| (r.percentage_male, r.percentage_female))
            .collect();
        assert_eq!(
            gender,
            vec![(None, Some(25.1)), (None, None), (None, None)]
        );
    }

    #[test]
    fn test_na_marker_in_total_is_still_rejected() {
        let csv = "Country,Year,Data.Percentage.Total\nFrance,2010,NA\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidValue { .. }));
    }

    #[test]
    fn test_distinct_options_sorted() {
        let dataset = Dataset::from_reader(WITH_GENDER.as_bytes()).unwrap();
        assert_eq!(dataset.years(), vec![2010, 2011]);
        assert_eq!(dataset.countries(), vec!["France", "United States"]);
        assert!(dataset.has_year(2011));
        assert!(!dataset.has_year(1999));
        assert!(dataset.has_country("France"));
        assert!(!dataset.has_country("Atlantis"));
    }

    #[test]
    fn test_missing_total_column_fails_at_load() {
        let csv = "Country,Year\nFrance,2010\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.is_schema_error());
        assert!(err.to_string().contains("Data.Percentage.Total"));
    }

    #[test]
    fn test_missing_column_reported_even_without_rows() {
        let err = Dataset::from_reader("Year,Data.Percentage.Total\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("'Country'"));
    }

    #[test]
    fn test_header_only_is_empty_dataset() {
        let dataset =
            Dataset::from_reader("Country,Year,Data.Percentage.Total\n".as_bytes()).unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.years().is_empty());
    }

    #[test]
    fn test_invalid_year_reports_row_and_column() {
        let csv = "Country,Year,Data.Percentage.Total\nFrance,2010,28.7\nSpain,20x1,30.0\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        match err {
            DashboardError::InvalidValue { row, column, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "Year");
                assert_eq!(value, "20x1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_total_is_rejected() {
        let csv = "Country,Year,Data.Percentage.Total\nFrance,2010,\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidValue { .. }));
    }

    #[test]
    fn test_non_finite_total_is_rejected() {
        let csv = "Country,Year,Data.Percentage.Total\nFrance,2010,NaN\n";
        assert!(Dataset::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_quoted_country_with_comma() {
        let csv = "Country,Year,Data.Percentage.Total\n\"Korea, Republic of\",2012,23.9\n";
        let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.get_row(0).unwrap().country, "Korea, Republic of");
    }

    #[test]
    fn test_ragged_row_is_csv_error() {
        let csv = "Country,Year,Data.Percentage.Total\nFrance,2010\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::Csv(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(WITH_GENDER.as_bytes()).unwrap();

        let dataset = Dataset::from_path(file.path()).unwrap();
        assert_eq!(dataset.len(), 3);
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = Dataset::from_path("/definitely/not/here/smoking.csv").unwrap_err();
        assert!(matches!(err, DashboardError::Io { .. }));
    }
}
