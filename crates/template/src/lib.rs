//! Form-fill engine - place spreadsheet values onto a PDF form
//!
//! This crate provides:
//! - Field templates parsed from CSV (`field_name,page_number,x,y,field_type,font_size`)
//! - Column mappings from template fields to spreadsheet columns
//! - Value formatting for text, number, date and checkbox fields
//! - Filling of a single document or a lazy batch of documents
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::SourcePdf;
//! use spreadsheet::load_spreadsheet;
//! use template::{fill_batch, parse_template, ColumnMapping};
//!
//! let template = parse_template(&std::fs::read_to_string("fields.csv")?)?;
//! let source = SourcePdf::open("form.pdf")?;
//! let sheet = load_spreadsheet("people.xlsx")?;
//! let mapping = ColumnMapping::auto(&template, sheet.headers());
//!
//! for outcome in fill_batch(&source, &template, sheet.rows(), &mapping)? {
//!     match outcome.result {
//!         Ok(doc) => std::fs::write(format!("row-{}.pdf", outcome.index), doc.bytes())?,
//!         Err(e) => eprintln!("row {}: {e}", outcome.index),
//!     }
//! }
//! ```

mod batch;
mod format;
mod mapping;
mod parser;
mod renderer;
mod schema;

pub use batch::{fill_batch, Batch, BatchSummary, CancelToken, RowFailure, RowOutcome};
pub use format::{
    format_checkbox, format_date, format_number, parse_checkbox, parse_date, truncate_to_width,
    DateFormat, NumberFormat,
};
pub use mapping::{ColumnMapping, ResolvedMapping};
pub use parser::{parse_template, OPTIONAL_COLUMNS, REQUIRED_COLUMNS};
pub use renderer::{fill_document, FillOptions, FilledDocument, FormFiller, Origin, Placement};
pub use schema::{FieldDescriptor, FieldType, Template};

pub use pdf_core::{Color, SourcePdf, StandardFont};
pub use spreadsheet::DataRow;

use thiserror::Error;

/// A malformed or inconsistent template, or an invalid fill option
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Template has no fields")]
    Empty,

    #[error("Invalid template header: {0}")]
    InvalidHeader(String),

    #[error("Line {line}: expected between {min} and {max} columns, found {found}")]
    ColumnCount {
        line: usize,
        min: usize,
        max: usize,
        found: usize,
    },

    #[error("Line {line}, column '{column}': {message}")]
    InvalidValue {
        line: usize,
        column: String,
        message: String,
    },

    #[error("Duplicate field name '{name}' (lines {first} and {second})")]
    DuplicateField {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("Invalid number format '{0}'")]
    InvalidNumberFormat(String),

    #[error("Invalid date format '{0}'")]
    InvalidDateFormat(String),

    #[error("Malformed CSV: {0}")]
    Csv(String),
}

/// A per-row failure while filling one document
#[derive(Debug, Error)]
pub enum FillError {
    #[error("Field '{field}': column '{column}' is missing from the row")]
    MissingColumn { field: String, column: String },

    #[error("Field '{field}': '{value}' is not a number")]
    NotANumber { field: String, value: String },

    #[error("Field '{field}': '{value}' is not a recognised date")]
    InvalidDate { field: String, value: String },

    #[error("Field '{field}': '{value}' is not a checkbox value")]
    InvalidCheckbox { field: String, value: String },

    #[error("Field '{field}': page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange {
        field: String,
        page: usize,
        page_count: usize,
    },

    #[error("Field '{0}' is not covered by the resolved mapping")]
    UnresolvedField(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),
}

impl FillError {
    /// Name of the field that failed, when the failure belongs to one
    pub fn field(&self) -> Option<&str> {
        match self {
            FillError::MissingColumn { field, .. }
            | FillError::NotANumber { field, .. }
            | FillError::InvalidDate { field, .. }
            | FillError::InvalidCheckbox { field, .. }
            | FillError::PageOutOfRange { field, .. }
            | FillError::UnresolvedField(field) => Some(field),
            FillError::Pdf(_) => None,
        }
    }
}

/// A column mapping that cannot be used with the template
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("Field '{0}' has no column mapping")]
    MissingField(String),

    #[error("Mapping refers to unknown field '{0}'")]
    UnknownField(String),

    #[error("Field '{field}' is mapped to column '{column}', which the spreadsheet does not have")]
    UnknownColumn { field: String, column: String },

    #[error("Invalid mapping JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Any error raised by the engine or its collaborators
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fill(#[from] FillError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("Spreadsheet error: {0}")]
    Sheet(#[from] spreadsheet::SheetError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;
