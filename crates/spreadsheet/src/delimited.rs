//! Delimited text (CSV) reading

use crate::table::Spreadsheet;
use crate::{Result, SheetError};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Delimiters tried in order of preference
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Pick the candidate that splits the header record into the most fields.
///
/// The header is parsed as CSV, so quoted delimiters and line breaks inside
/// a header cell do not count. Ties go to the earlier candidate, so a
/// single-column file reads as comma separated.
pub(crate) fn detect_delimiter(text: &str) -> u8 {
    CANDIDATE_DELIMITERS
        .iter()
        .rev()
        .max_by_key(|&&d| header_width(text, d))
        .copied()
        .unwrap_or(b',')
}

/// Number of fields in the first record when split on `delimiter`
fn header_width(text: &str, delimiter: u8) -> usize {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.len(),
        _ => 0,
    }
}

pub(crate) fn read_delimited(bytes: &[u8]) -> Result<Spreadsheet> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|e| SheetError::Encoding(e.to_string()))?;

    let delimiter = detect_delimiter(text);
    tracing::debug!(delimiter = %(delimiter as char).escape_default(), "Detected CSV delimiter");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    Spreadsheet::from_grid(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Name,Amount\nJane,1\n", b',')]
    #[case("Name;Amount;Date\nJane;1,5;2024-01-01\n", b';')]
    #[case("Name\tAmount\n", b'\t')]
    #[case("Name|Amount|Date\n", b'|')]
    #[case("\"Name, Last\";Amount\nJane;5\n", b';')]
    #[case("\"Date of\nBirth\"\tName\n2001-02-03\tJane\n", b'\t')]
    #[case("Name\n", b',')]
    #[case("", b',')]
    fn test_detect_delimiter(#[case] text: &str, #[case] expected: u8) {
        assert_eq!(detect_delimiter(text), expected);
    }

    #[test]
    fn test_read_semicolon_with_decimal_commas() {
        let sheet = read_delimited(b"Name;Amount\nJane Doe;1,5\n").unwrap();
        assert_eq!(sheet.rows()[0].get("Amount"), Some("1,5"));
    }

    #[test]
    fn test_read_quoted_header_with_delimiter_inside() {
        let sheet = read_delimited(b"\"Name, Last\";Amount\nJane;5\n").unwrap();
        assert_eq!(sheet.headers(), &["Name, Last".to_string(), "Amount".to_string()]);
        assert_eq!(sheet.rows()[0].get("Amount"), Some("5"));
    }

    #[test]
    fn test_read_strips_bom() {
        let sheet = read_delimited(b"\xEF\xBB\xBFFull Name,Amount\nJane Doe,42.5\n").unwrap();
        assert_eq!(sheet.headers()[0], "Full Name");
        assert_eq!(sheet.rows()[0].get("Full Name"), Some("Jane Doe"));
    }

    #[test]
    fn test_read_quoted_fields() {
        let sheet = read_delimited(b"Name,Address\n\"Doe, Jane\",\"1 Main St\nApt 2\"\n").unwrap();
        let row = &sheet.rows()[0];
        assert_eq!(row.get("Name"), Some("Doe, Jane"));
        assert_eq!(row.get("Address"), Some("1 Main St\nApt 2"));
    }

    #[test]
    fn test_read_ragged_rows() {
        let sheet = read_delimited(b"A,B\n1\n2,3,4\n").unwrap();
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.rows()[0].get("B"), Some(""));
        assert_eq!(sheet.rows()[1].get("B"), Some("3"));
    }

    #[test]
    fn test_read_invalid_utf8() {
        assert!(matches!(
            read_delimited(b"Name\n\xFF\xFE\n"),
            Err(SheetError::Encoding(_))
        ));
    }
}
