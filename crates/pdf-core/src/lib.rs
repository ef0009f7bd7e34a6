//! PDF Core - Low-level PDF overlay
//!
//! This crate provides functionality for:
//! - Opening PDF documents once and handing out independent copies
//! - Drawing text at specific coordinates with the standard PDF fonts
//! - Serializing the filled copy to bytes
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{SourcePdf, StandardFont};
//!
//! let source = SourcePdf::open("form.pdf")?;
//! let mut doc = source.instantiate();
//! doc.set_font(StandardFont::Helvetica, 10.0)?;
//! doc.insert_text("Jane Doe", 1, 120.0, 250.0)?;
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod font;
mod text;

pub use document::{Color, PdfDocument, SourcePdf, A4_HEIGHT};
pub use font::{encode_text_hex, encode_win_ansi, StandardFont};
pub use text::{generate_text_operators, TextRenderContext};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Invalid font size: {0}")]
    InvalidFontSize(f32),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;
