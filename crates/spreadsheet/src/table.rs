//! Header and row model shared by every spreadsheet format

use crate::{Result, SheetError};
use std::collections::{BTreeMap, HashMap};

/// One record of the sheet, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataRow {
    index: usize,
    values: BTreeMap<String, String>,
}

impl DataRow {
    /// Create an empty row
    pub fn new(index: usize) -> Self {
        Self {
            index,
            values: BTreeMap::new(),
        }
    }

    /// Build a row from `(column, value)` pairs
    pub fn from_pairs<I, K, V>(index: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            index,
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Zero-based position of the row among the records below the header
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell text for a column, `None` if the row has no such column
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    /// Set a cell, replacing any previous value
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.values.insert(column.into(), value.into());
    }

    /// Iterate `(column, value)` pairs in column-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A parsed sheet: normalised headers plus the non-empty data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spreadsheet {
    headers: Vec<String>,
    rows: Vec<DataRow>,
}

impl Spreadsheet {
    /// Build from a grid of cell text whose first row is the header.
    ///
    /// Columns with a blank header are dropped. Rows whose cells are all
    /// blank are skipped but still count towards row indices.
    pub(crate) fn from_grid<I>(grid: I) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut grid = grid.into_iter();
        let header = grid.next().ok_or(SheetError::MissingHeader)?;

        let columns: Vec<Option<String>> = header
            .iter()
            .map(|name| {
                let name = normalize_header(name);
                (!name.is_empty()).then_some(name)
            })
            .collect();

        if columns.iter().all(Option::is_none) {
            return Err(SheetError::MissingHeader);
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (position, name) in columns.iter().enumerate() {
            let Some(name) = name else { continue };
            if let Some(first) = seen.insert(name, position) {
                return Err(SheetError::DuplicateColumn {
                    name: name.clone(),
                    first: first + 1,
                    second: position + 1,
                });
            }
        }

        let mut rows = Vec::new();
        for (index, cells) in grid.enumerate() {
            if cells.iter().all(|cell| cell.trim().is_empty()) {
                tracing::trace!(row = index, "Skipping empty row");
                continue;
            }

            let mut row = DataRow::new(index);
            for (position, cell) in cells.iter().enumerate() {
                match columns.get(position) {
                    Some(Some(name)) => row.insert(name.clone(), cell.clone()),
                    _ if cell.trim().is_empty() => {}
                    _ => tracing::warn!(
                        row = index,
                        column = position + 1,
                        "Ignoring value in a column without a header"
                    ),
                }
            }
            // Short records still expose every column
            for name in columns.iter().flatten() {
                if !row.contains_column(name) {
                    row.insert(name.clone(), "");
                }
            }
            rows.push(row);
        }

        Ok(Self {
            headers: columns.into_iter().flatten().collect(),
            rows,
        })
    }

    /// Column names in sheet order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DataRow> {
        self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Trim a header and fold embedded line breaks into single spaces
fn normalize_header(raw: &str) -> String {
    raw.trim()
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Full Name "), "Full Name");
        assert_eq!(normalize_header("Date of\nBirth"), "Date of Birth");
        assert_eq!(normalize_header("Date of\r\n Birth"), "Date of Birth");
        assert_eq!(normalize_header("   "), "");
    }

    #[test]
    fn test_from_grid() {
        let sheet = Spreadsheet::from_grid(grid(&[
            &["Name", "Amount"],
            &["Jane Doe", "42.5"],
            &["John Roe", "7"],
        ]))
        .unwrap();

        assert_eq!(sheet.headers(), &["Name".to_string(), "Amount".to_string()]);
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.rows()[0].get("Name"), Some("Jane Doe"));
        assert_eq!(sheet.rows()[1].get("Amount"), Some("7"));
        assert_eq!(sheet.rows()[1].index(), 1);
    }

    #[test]
    fn test_empty_rows_skipped_but_indexed() {
        let sheet = Spreadsheet::from_grid(grid(&[
            &["Name"],
            &["Jane"],
            &["  "],
            &["John"],
        ]))
        .unwrap();

        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.rows()[1].get("Name"), Some("John"));
        assert_eq!(sheet.rows()[1].index(), 2);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let sheet = Spreadsheet::from_grid(grid(&[&["A", "B", "C"], &["1"]])).unwrap();
        let row = &sheet.rows()[0];
        assert_eq!(row.get("A"), Some("1"));
        assert_eq!(row.get("C"), Some(""));
        assert_eq!(row.get("D"), None);
    }

    #[test]
    fn test_blank_header_columns_dropped() {
        let sheet = Spreadsheet::from_grid(grid(&[&["A", "", "B"], &["1", "x", "2"]])).unwrap();
        assert_eq!(sheet.headers(), &["A".to_string(), "B".to_string()]);
        assert_eq!(sheet.rows()[0].get("B"), Some("2"));
        assert_eq!(sheet.rows()[0].iter().count(), 2);
    }

    #[test]
    fn test_duplicate_header() {
        let result = Spreadsheet::from_grid(grid(&[&["Name", "Amount", " Name "]]));
        match result {
            Err(SheetError::DuplicateColumn {
                name,
                first,
                second,
            }) => {
                assert_eq!(name, "Name");
                assert_eq!((first, second), (1, 3));
            }
            other => panic!("expected duplicate column error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            Spreadsheet::from_grid(Vec::new()),
            Err(SheetError::MissingHeader)
        ));
        assert!(matches!(
            Spreadsheet::from_grid(grid(&[&["", " "]])),
            Err(SheetError::MissingHeader)
        ));
    }

    #[test]
    fn test_data_row_from_pairs() {
        let row = DataRow::from_pairs(3, [("Full Name", "Jane Doe")]);
        assert_eq!(row.index(), 3);
        assert_eq!(row.get("Full Name"), Some("Jane Doe"));
        assert!(!row.contains_column("Amount"));
    }
}
