//! Workbook (XLSX, XLS, ODS) reading via calamine

use crate::table::Spreadsheet;
use crate::{Result, SheetError};
use calamine::{Data, Reader};
use chrono::{NaiveDateTime, Timelike};
use std::fmt;
use std::io::Cursor;

/// Read one worksheet of a workbook held in memory.
///
/// Uses the first sheet when `sheet` is `None`.
pub(crate) fn read_workbook<'a, R>(bytes: &'a [u8], sheet: Option<&str>) -> Result<Spreadsheet>
where
    R: Reader<Cursor<&'a [u8]>>,
    R::Error: fmt::Display,
{
    let mut workbook: R = calamine::open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| SheetError::Workbook(format!("failed to open workbook: {e}")))?;

    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .into_iter()
            .find(|name| name == wanted)
            .ok_or_else(|| SheetError::SheetNotFound(wanted.to_string()))?,
        None => names.into_iter().next().ok_or(SheetError::NoWorksheets)?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| SheetError::Workbook(format!("failed to read sheet '{name}': {e}")))?;

    tracing::debug!(
        sheet = %name,
        height = range.height(),
        width = range.width(),
        "Read worksheet"
    );

    Spreadsheet::from_grid(
        range
            .rows()
            .map(|row| row.iter().map(render_cell).collect::<Vec<_>>()),
    )
}

/// Render a cell the way it reads in the sheet
pub(crate) fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => render_float(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(dt) => render_datetime(dt),
            None => dt.to_string(),
        },
        // Formula errors (#DIV/0!, #N/A, ...) read as blank cells
        Data::Error(e) => {
            tracing::debug!(error = ?e, "Treating error cell as blank");
            String::new()
        }
        _ => cell.to_string(),
    }
}

/// Whole numbers print without a fractional part
fn render_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn render_datetime(dt: NaiveDateTime) -> String {
    if dt.time().num_seconds_from_midnight() == 0 && dt.nanosecond() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(1234.0, "1234")]
    #[case(-3.0, "-3")]
    #[case(42.5, "42.5")]
    #[case(0.1, "0.1")]
    #[case(0.0, "0")]
    fn test_render_float(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(render_float(value), expected);
    }

    #[test]
    fn test_render_simple_cells() {
        assert_eq!(render_cell(&Data::Empty), "");
        assert_eq!(render_cell(&Data::String("Jane Doe".into())), "Jane Doe");
        assert_eq!(render_cell(&Data::Int(7)), "7");
        assert_eq!(render_cell(&Data::Float(1e6)), "1000000");
        assert_eq!(render_cell(&Data::Bool(true)), "true");
        assert_eq!(
            render_cell(&Data::DateTimeIso("2024-03-05T10:00:00".into())),
            "2024-03-05T10:00:00"
        );
    }

    #[test]
    fn test_render_datetime() {
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(render_datetime(midnight), "2024-03-05");

        let afternoon = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(render_datetime(afternoon), "2024-03-05 14:30:00");
    }
}
