//! Spreadsheet - tabular row data for form filling
//!
//! Reads the first (or a named) sheet of a CSV, XLSX, XLS or ODS file into
//! a header row plus data rows of cell text. Every cell is rendered to the
//! string a user would see in the sheet, so the filling engine only ever
//! deals with text.
//!
//! # Example
//!
//! ```ignore
//! use spreadsheet::load_spreadsheet;
//!
//! let sheet = load_spreadsheet("people.xlsx")?;
//! for row in sheet.rows() {
//!     println!("{:?}", row.get("Full Name"));
//! }
//! ```

mod delimited;
mod table;
mod workbook;

pub use table::{DataRow, Spreadsheet};

use calamine::{Ods, Xls, Xlsx};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading a spreadsheet
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Spreadsheet has no header row")]
    MissingHeader,

    #[error("Duplicate column '{name}' (columns {first} and {second})")]
    DuplicateColumn {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("Worksheet not found: {0}")]
    SheetNotFound(String),

    #[error("Workbook has no worksheets")]
    NoWorksheets,

    #[error("Failed to read workbook: {0}")]
    Workbook(String),

    #[error("Unsupported spreadsheet format: {0}")]
    UnsupportedFormat(String),

    #[error("Spreadsheet is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for spreadsheet operations
pub type Result<T> = std::result::Result<T, SheetError>;

/// Supported spreadsheet file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// Delimited text (`,`, `;`, tab or `|`)
    Csv,
    /// Office Open XML workbook (`.xlsx`, `.xlsm`)
    Xlsx,
    /// Legacy Excel workbook
    Xls,
    /// OpenDocument spreadsheet
    Ods,
}

impl SheetFormat {
    /// Pick the format from a file extension, ignoring case
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Some(SheetFormat::Csv),
            "xlsx" | "xlsm" => Some(SheetFormat::Xlsx),
            "xls" => Some(SheetFormat::Xls),
            "ods" => Some(SheetFormat::Ods),
            _ => None,
        }
    }

    /// Pick the format from a path's extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(SheetFormat::from_extension)
            .ok_or_else(|| SheetError::UnsupportedFormat(path.display().to_string()))
    }
}

impl fmt::Display for SheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SheetFormat::Csv => "csv",
            SheetFormat::Xlsx => "xlsx",
            SheetFormat::Xls => "xls",
            SheetFormat::Ods => "ods",
        };
        f.write_str(name)
    }
}

/// Parse the first sheet of a spreadsheet held in memory
pub fn parse_spreadsheet(bytes: &[u8], format: SheetFormat) -> Result<Spreadsheet> {
    parse_worksheet(bytes, format, None)
}

/// Parse a named sheet (or the first one when `sheet` is `None`)
///
/// CSV files have a single unnamed sheet, so `sheet` is ignored for them.
pub fn parse_worksheet(bytes: &[u8], format: SheetFormat, sheet: Option<&str>) -> Result<Spreadsheet> {
    let spreadsheet = match format {
        SheetFormat::Csv => {
            if let Some(name) = sheet {
                tracing::warn!(sheet = name, "CSV files have no named sheets; ignoring sheet name");
            }
            delimited::read_delimited(bytes)?
        }
        SheetFormat::Xlsx => workbook::read_workbook::<Xlsx<_>>(bytes, sheet)?,
        SheetFormat::Xls => workbook::read_workbook::<Xls<_>>(bytes, sheet)?,
        SheetFormat::Ods => workbook::read_workbook::<Ods<_>>(bytes, sheet)?,
    };

    tracing::debug!(
        %format,
        columns = spreadsheet.headers().len(),
        rows = spreadsheet.len(),
        "Parsed spreadsheet"
    );
    Ok(spreadsheet)
}

/// Load the first sheet of a spreadsheet file, choosing the format from its extension
pub fn load_spreadsheet<P: AsRef<Path>>(path: P) -> Result<Spreadsheet> {
    load_worksheet(path, None)
}

/// Load a named sheet of a spreadsheet file
pub fn load_worksheet<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<Spreadsheet> {
    let path = path.as_ref();
    let format = SheetFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    parse_worksheet(&bytes, format, sheet)
}
