/// SmokeStats Schema
///
/// The schema is captured from the CSV header row. It records every column
/// name in file order together with its type and nullability, and resolves
/// the columns the pipeline needs through a [`CsvLayout`].
///
/// # Examples
///
/// ```
/// use smokestats::{CsvLayout, Schema};
///
/// let header = ["Country", "Year", "Data.Percentage.Total"];
/// let schema = Schema::from_header(&header, CsvLayout::default()).unwrap();
///
/// assert_eq!(schema.len(), 3);
/// assert_eq!(schema.get_column_index("Year"), Some(1));
/// assert!(!schema.has_gender_columns());
/// ```

use crate::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};

pub const COUNTRY_COLUMN: &str = "Country";
pub const YEAR_COLUMN: &str = "Year";
pub const TOTAL_COLUMN: &str = "Data.Percentage.Total";
pub const MALE_COLUMN: &str = "Data.Percentage.Male";
pub const FEMALE_COLUMN: &str = "Data.Percentage.Female";

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    String,
    Int,
    Float,
}

/// Names of the columns the pipeline reads.
///
/// Header matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CsvLayout {
    pub country: String,
    pub year: String,
    pub total: String,
    pub male: String,
    pub female: String,
}

impl Default for CsvLayout {
    fn default() -> Self {
        CsvLayout {
            country: COUNTRY_COLUMN.to_string(),
            year: YEAR_COLUMN.to_string(),
            total: TOTAL_COLUMN.to_string(),
            male: MALE_COLUMN.to_string(),
            female: FEMALE_COLUMN.to_string(),
        }
    }
}

/// Header positions of the columns the loader extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnMap {
    pub country: usize,
    pub year: usize,
    pub total: usize,
    /// (male, female); present only when both columns exist
    pub gender: Option<(usize, usize)>,
}

/// Schema definition with column names and types.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    columns: Vec<(String, ColumnType, bool)>, // (name, type, nullable)
    layout: CsvLayout,
    map: ColumnMap,
}

impl Schema {
    /// Builds a schema from a header row, validating that the required
    /// columns (`country`, `year`, `total` of the layout) are present.
    ///
    /// Columns not named by the layout are kept as nullable strings; they
    /// are carried in the schema but never read. A repeated column the
    /// layout names is ambiguous and rejected; other repeats are renamed
    /// `name.1`, `name.2`, ...
    pub fn from_header<S: AsRef<str>>(header: &[S], layout: CsvLayout) -> Result<Self> {
        let names = dedup_header(header, &layout)?;
        let names: Vec<&str> = names.iter().map(String::as_str).collect();

        let find = |column: &str| names.iter().position(|n| *n == column);
        let require = |column: &str| {
            find(column).ok_or_else(|| DashboardError::missing_column(column, &names))
        };

        let country = require(&layout.country)?;
        let year = require(&layout.year)?;
        let total = require(&layout.total)?;
        let gender = match (find(&layout.male), find(&layout.female)) {
            (Some(m), Some(f)) => Some((m, f)),
            _ => None,
        };

        let columns = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let (ty, nullable) = if i == country {
                    (ColumnType::String, false)
                } else if i == year {
                    (ColumnType::Int, false)
                } else if i == total {
                    (ColumnType::Float, false)
                } else if *name == layout.male || *name == layout.female {
                    (ColumnType::Float, true)
                } else {
                    (ColumnType::String, true)
                };
                (name.to_string(), ty, nullable)
            })
            .collect();

        Ok(Schema {
            columns,
            layout,
            map: ColumnMap {
                country,
                year,
                total,
                gender,
            },
        })
    }

    /// Returns the number of columns in the schema.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns a list of all column names in header order.
    pub fn get_column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _, _)| name.as_str()).collect()
    }

    /// Returns the index of a column by name, or None if not found.
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _, _)| n == name)
    }

    /// Returns the type of a column by name, or None if not found.
    pub fn get_column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, ty, _)| *ty)
    }

    /// Returns whether a column is nullable by name, or None if not found.
    pub fn is_column_nullable(&self, name: &str) -> Option<bool> {
        self.columns
            .iter()
            .find(|(n, _, _)| n == name)
            .map(|(_, _, nullable)| *nullable)
    }

    pub fn layout(&self) -> &CsvLayout {
        &self.layout
    }

    /// True when both the male and female percentage columns exist.
    ///
    /// This is a property of the header, not of the values: a file whose
    /// gender cells are all empty still has the columns.
    pub fn has_gender_columns(&self) -> bool {
        self.map.gender.is_some()
    }

    /// Gender labels in output order, e.g. `["Male", "Female"]`.
    pub fn gender_labels(&self) -> Option<[String; 2]> {
        self.map.gender.map(|_| {
            [
                gender_label(&self.layout.male).to_string(),
                gender_label(&self.layout.female).to_string(),
            ]
        })
    }

    pub(crate) fn column_map(&self) -> ColumnMap {
        self.map
    }
}

fn dedup_header<S: AsRef<str>>(header: &[S], layout: &CsvLayout) -> Result<Vec<String>> {
    let layout_names = [
        &layout.country,
        &layout.year,
        &layout.total,
        &layout.male,
        &layout.female,
    ];

    let mut names: Vec<String> = Vec::with_capacity(header.len());
    for name in header.iter().map(|h| h.as_ref()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
            continue;
        }
        if layout_names.iter().any(|n| n.as_str() == name) {
            return Err(DashboardError::DuplicateColumn {
                column: name.to_string(),
            });
        }
        let mut suffix = 1;
        while names.iter().any(|n| *n == format!("{}.{}", name, suffix)) {
            suffix += 1;
        }
        names.push(format!("{}.{}", name, suffix));
    }
    Ok(names)
}

/// Extracts the trailing word of a column name: `Data.Percentage.Male` → `Male`.
pub fn gender_label(column: &str) -> &str {
    column
        .rsplit(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_header() -> Vec<&'static str> {
        vec![
            COUNTRY_COLUMN,
            YEAR_COLUMN,
            TOTAL_COLUMN,
            MALE_COLUMN,
            FEMALE_COLUMN,
        ]
    }

    #[test]
    fn test_schema_from_full_header() {
        let schema = Schema::from_header(&full_header(), CsvLayout::default()).unwrap();

        assert_eq!(schema.len(), 5);
        assert!(schema.has_gender_columns());
        assert_eq!(schema.get_column_type(YEAR_COLUMN), Some(ColumnType::Int));
        assert_eq!(schema.get_column_type(TOTAL_COLUMN), Some(ColumnType::Float));
        assert_eq!(schema.is_column_nullable(COUNTRY_COLUMN), Some(false));
        assert_eq!(schema.is_column_nullable(MALE_COLUMN), Some(true));
        assert_eq!(
            schema.gender_labels(),
            Some(["Male".to_string(), "Female".to_string()])
        );
    }

    #[test]
    fn test_missing_required_column() {
        let err = Schema::from_header(&["Country", "Year"], CsvLayout::default()).unwrap_err();
        match err {
            DashboardError::MissingColumn { column, .. } => assert_eq!(column, TOTAL_COLUMN),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let err = Schema::from_header(
            &["country", "Year", "Data.Percentage.Total"],
            CsvLayout::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("'Country'"));
    }

    #[test]
    fn test_single_gender_column_is_not_enough() {
        let schema = Schema::from_header(
            &["Country", "Year", "Data.Percentage.Total", "Data.Percentage.Male"],
            CsvLayout::default(),
        )
        .unwrap();
        assert!(!schema.has_gender_columns());
        assert_eq!(schema.gender_labels(), None);
    }

    #[test]
    fn test_extra_columns_are_kept() {
        let schema = Schema::from_header(
            &["Continent", "Country", "Year", "Data.Percentage.Total"],
            CsvLayout::default(),
        )
        .unwrap();
        assert_eq!(schema.get_column_type("Continent"), Some(ColumnType::String));
        assert_eq!(schema.column_map().country, 1);
    }

    #[test]
    fn test_repeated_extra_column_is_renamed() {
        let schema = Schema::from_header(
            &["Country", "Year", "Data.Percentage.Total", "Note", "Note", "Note"],
            CsvLayout::default(),
        )
        .unwrap();
        assert_eq!(
            schema.get_column_names(),
            vec!["Country", "Year", "Data.Percentage.Total", "Note", "Note.1", "Note.2"]
        );
        assert_eq!(schema.get_column_index("Note.1"), Some(4));
    }

    #[test]
    fn test_duplicate_gender_column_rejected() {
        let err = Schema::from_header(
            &[
                "Country",
                "Year",
                "Data.Percentage.Total",
                "Data.Percentage.Male",
                "Data.Percentage.Male",
            ],
            CsvLayout::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::DuplicateColumn { ref column } if column == MALE_COLUMN));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let err = Schema::from_header(
            &["Country", "Year", "Year", "Data.Percentage.Total"],
            CsvLayout::default(),
        )
        .unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_custom_layout() {
        let layout = CsvLayout {
            country: "Nation".to_string(),
            total: "Rate".to_string(),
            ..CsvLayout::default()
        };
        let schema = Schema::from_header(&["Nation", "Year", "Rate"], layout).unwrap();
        assert_eq!(schema.layout().country, "Nation");
    }

    #[test]
    fn test_gender_label() {
        assert_eq!(gender_label("Data.Percentage.Male"), "Male");
        assert_eq!(gender_label("Data.Percentage.Female"), "Female");
        assert_eq!(gender_label("Female"), "Female");
        assert_eq!(gender_label("rate_female"), "rate_female");
    }
}
