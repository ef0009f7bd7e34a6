//! Field template types

use crate::ValidationError;
use pdf_core::StandardFont;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// How a cell value is turned into the drawn text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Cell text drawn verbatim
    #[default]
    Text,
    /// Decimal number, drawn with the batch's number format
    Number,
    /// Calendar date, drawn with the batch's date format
    Date,
    /// Yes/no value, drawn as `X` when set
    Checkbox,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Checkbox => "checkbox",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "text" => Ok(FieldType::Text),
            "number" => Ok(FieldType::Number),
            "date" => Ok(FieldType::Date),
            "checkbox" => Ok(FieldType::Checkbox),
            other => Err(format!(
                "unknown field type '{other}' (expected text, number, date or checkbox)"
            )),
        }
    }
}

/// One placement rule: where and how to draw a named field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Unique name of the field
    pub field_name: String,
    /// Zero-based page index
    pub page_number: usize,
    /// X coordinate in points
    pub x: f64,
    /// Y coordinate in points (from the bottom unless the fill uses a top-left origin)
    pub y: f64,
    pub field_type: FieldType,
    /// Font size in points
    pub font_size: f32,
    pub font: StandardFont,
    /// Widest the drawn text may be, in points
    pub max_width: Option<f64>,
}

impl FieldDescriptor {
    /// Create a descriptor in the default font with no width limit
    pub fn new(
        field_name: impl Into<String>,
        page_number: usize,
        x: f64,
        y: f64,
        field_type: FieldType,
        font_size: f32,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            page_number,
            x,
            y,
            field_type,
            font_size,
            font: StandardFont::default(),
            max_width: None,
        }
    }

    pub fn with_font(mut self, font: StandardFont) -> Self {
        self.font = font;
        self
    }

    pub fn with_max_width(mut self, max_width: f64) -> Self {
        self.max_width = Some(max_width);
        self
    }
}

/// Ordered set of field descriptors with unique names
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    fields: Vec<FieldDescriptor>,
}

impl Template {
    /// Build a template from descriptors, keeping their order.
    ///
    /// Duplicate names are reported with the 1-based positions of both
    /// descriptors.
    pub fn from_fields(fields: Vec<FieldDescriptor>) -> Result<Self, ValidationError> {
        if fields.is_empty() {
            return Err(ValidationError::Empty);
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (position, field) in fields.iter().enumerate() {
            if let Some(first) = seen.insert(&field.field_name, position + 1) {
                return Err(ValidationError::DuplicateField {
                    name: field.field_name.clone(),
                    first,
                    second: position + 1,
                });
            }
        }

        Ok(Self { fields })
    }

    /// Parser entry point; names are already known to be unique
    pub(crate) fn from_validated(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field_name.as_str())
    }

    /// Fields placed on a zero-based page
    pub fn fields_on_page(&self, page: usize) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(move |f| f.page_number == page)
    }

    pub fn get(&self, field_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.field_name == field_name)
    }

    pub fn contains(&self, field_name: &str) -> bool {
        self.get(field_name).is_some()
    }

    /// Highest zero-based page any field refers to
    pub fn last_page(&self) -> usize {
        self.fields.iter().map(|f| f.page_number).max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a Template {
    type Item = &'a FieldDescriptor;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
