//! Document filling

use crate::format::{format_checkbox, format_date, format_number, truncate_to_width, DateFormat, NumberFormat};
use crate::mapping::ResolvedMapping;
use crate::schema::{FieldDescriptor, FieldType, Template};
use crate::FillError;
use pdf_core::{Color, PdfDocument, SourcePdf, StandardFont};
use spreadsheet::DataRow;

/// Where field `y` coordinates are measured from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    /// Native PDF orientation: `y` grows upwards from the page bottom
    #[default]
    BottomLeft,
    /// `y` grows downwards from the top edge of the page's MediaBox
    TopLeft,
}

/// Options shared by every document of a fill.
///
/// Defaults: bottom-left origin, `#,##0.##` numbers, `%d-%m-%Y` dates and
/// black text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillOptions {
    pub origin: Origin,
    pub number_format: NumberFormat,
    pub date_format: DateFormat,
    pub text_color: Color,
}

impl FillOptions {
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_number_format(mut self, number_format: NumberFormat) -> Self {
        self.number_format = number_format;
        self
    }

    pub fn with_date_format(mut self, date_format: DateFormat) -> Self {
        self.date_format = date_format;
        self
    }

    pub fn with_text_color(mut self, text_color: Color) -> Self {
        self.text_color = text_color;
        self
    }
}

/// One piece of text drawn on a filled document
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub field: String,
    /// Zero-based page index
    pub page: usize,
    /// X coordinate as given in the template
    pub x: f64,
    /// Y coordinate as given in the template
    pub y: f64,
    pub font: StandardFont,
    pub font_size: f32,
    pub text: String,
}

/// A serialized output document plus what was drawn on it
#[derive(Debug, Clone)]
pub struct FilledDocument {
    bytes: Vec<u8>,
    placements: Vec<Placement>,
}

impl FilledDocument {
    pub(crate) fn new(bytes: Vec<u8>, placements: Vec<Placement>) -> Self {
        Self { bytes, placements }
    }

    /// Serialized PDF
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Text placements in template order
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }
}

/// Fills copies of a source PDF from data rows
#[derive(Debug, Clone)]
pub struct FormFiller<'a> {
    source: &'a SourcePdf,
    template: &'a Template,
    options: FillOptions,
}

impl<'a> FormFiller<'a> {
    /// Create a filler with default options
    pub fn new(source: &'a SourcePdf, template: &'a Template) -> Self {
        Self {
            source,
            template,
            options: FillOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FillOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &FillOptions {
        &self.options
    }

    pub fn template(&self) -> &'a Template {
        self.template
    }

    pub fn source(&self) -> &'a SourcePdf {
        self.source
    }

    /// Fill one document from one row.
    ///
    /// Fields are drawn in template order. Unmapped fields and blank cells
    /// draw nothing. The source PDF is left untouched.
    pub fn fill(&self, row: &DataRow, mapping: &ResolvedMapping) -> Result<FilledDocument, FillError> {
        let page_count = self.source.page_count();
        let mut doc = self.source.instantiate();
        doc.set_text_color(self.options.text_color);

        let mut placements = Vec::new();

        for field in self.template {
            let name = field.field_name.as_str();
            let column = match mapping.column(name) {
                Some(Some(column)) => column,
                Some(None) => {
                    tracing::trace!(field = name, "Skipping unmapped field");
                    continue;
                }
                None => return Err(FillError::UnresolvedField(name.to_string())),
            };

            let raw = row.get(column).ok_or_else(|| FillError::MissingColumn {
                field: name.to_string(),
                column: column.to_string(),
            })?;

            if field.page_number >= page_count {
                return Err(FillError::PageOutOfRange {
                    field: name.to_string(),
                    page: field.page_number,
                    page_count,
                });
            }

            let Some(text) = self.render_value(field, raw)? else {
                continue;
            };

            let placement = self.draw(&mut doc, field, text)?;
            tracing::debug!(
                field = name,
                page = placement.page,
                x = placement.x,
                y = placement.y,
                text = %placement.text,
                "Placed field"
            );
            placements.push(placement);
        }

        let bytes = doc.to_bytes()?;
        Ok(FilledDocument::new(bytes, placements))
    }

    /// Text to draw for a cell, `None` when nothing should be drawn
    fn render_value(&self, field: &FieldDescriptor, raw: &str) -> Result<Option<String>, FillError> {
        if raw.trim().is_empty() {
            return Ok(None);
        }

        let invalid_value = || raw.trim().to_string();
        let text = match field.field_type {
            FieldType::Text => raw.to_string(),
            FieldType::Number => format_number(raw, &self.options.number_format).ok_or_else(|| {
                FillError::NotANumber {
                    field: field.field_name.clone(),
                    value: invalid_value(),
                }
            })?,
            FieldType::Date => format_date(raw, &self.options.date_format).ok_or_else(|| {
                FillError::InvalidDate {
                    field: field.field_name.clone(),
                    value: invalid_value(),
                }
            })?,
            FieldType::Checkbox => format_checkbox(raw).ok_or_else(|| FillError::InvalidCheckbox {
                field: field.field_name.clone(),
                value: invalid_value(),
            })?,
        };

        let text = match field.max_width {
            Some(max_width) => truncate_to_width(&text, max_width, field.font_size),
            None => text,
        };

        Ok((!text.is_empty()).then_some(text))
    }

    fn draw(&self, doc: &mut PdfDocument, field: &FieldDescriptor, text: String) -> Result<Placement, FillError> {
        let page = field.page_number + 1;
        let y = match self.options.origin {
            Origin::BottomLeft => field.y,
            Origin::TopLeft => doc.page_top(page)? - field.y,
        };

        doc.set_font(field.font, field.font_size)?;
        doc.insert_text(&text, page, field.x, y)?;

        Ok(Placement {
            field: field.field_name.clone(),
            page: field.page_number,
            x: field.x,
            y: field.y,
            font: field.font,
            font_size: field.font_size,
            text,
        })
    }
}

/// Fill one document with default options.
///
/// See [`FormFiller::fill`].
pub fn fill_document(
    source: &SourcePdf,
    template: &Template,
    row: &DataRow,
    mapping: &ResolvedMapping,
) -> Result<FilledDocument, FillError> {
    FormFiller::new(source, template).fill(row, mapping)
}
