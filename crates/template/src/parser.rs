//! Template CSV parsing

use crate::schema::{FieldDescriptor, FieldType, Template};
use crate::ValidationError;
use pdf_core::StandardFont;
use std::collections::HashMap;

/// Columns every template must start with, in this order
pub const REQUIRED_COLUMNS: [&str; 6] = ["field_name", "page_number", "x", "y", "field_type", "font_size"];

/// Columns that may follow the required ones, in any order
pub const OPTIONAL_COLUMNS: [&str; 2] = ["font_name", "max_width"];

/// Parse a template from CSV text.
///
/// The header must begin with [`REQUIRED_COLUMNS`]; [`OPTIONAL_COLUMNS`] may
/// follow. Blank lines are skipped and field order is preserved. Errors
/// carry the 1-based line number of the offending record.
///
/// # Example
///
/// ```ignore
/// let template = parse_template(
///     "field_name,page_number,x,y,field_type,font_size\n\
///      Full Name,0,120,250,text,10\n",
/// )?;
/// assert_eq!(template.len(), 1);
/// ```
pub fn parse_template(csv_content: &str) -> Result<Template, ValidationError> {
    let csv_content = csv_content.strip_prefix('\u{feff}').unwrap_or(csv_content);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_content.as_bytes());

    let mut records = reader.records();
    let header = loop {
        match records.next() {
            Some(record) => {
                let record = record.map_err(|e| ValidationError::Csv(e.to_string()))?;
                if !is_blank(&record) {
                    break record;
                }
            }
            None => return Err(ValidationError::Empty),
        }
    };
    let layout = Layout::from_header(&header)?;

    let mut fields = Vec::new();
    let mut lines: HashMap<String, usize> = HashMap::new();

    for record in records {
        let record = record.map_err(|e| ValidationError::Csv(e.to_string()))?;
        if is_blank(&record) {
            continue;
        }
        let line = record.position().map(|p| p.line() as usize).unwrap_or_default();

        let field = layout.parse_record(&record, line)?;
        if let Some(first) = lines.insert(field.field_name.clone(), line) {
            return Err(ValidationError::DuplicateField {
                name: field.field_name,
                first,
                second: line,
            });
        }
        fields.push(field);
    }

    if fields.is_empty() {
        return Err(ValidationError::Empty);
    }

    tracing::debug!(fields = fields.len(), "Parsed template");
    Ok(Template::from_validated(fields))
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

/// Column positions of the optional columns present in the header
struct Layout {
    width: usize,
    font_name: Option<usize>,
    max_width: Option<usize>,
}

impl Layout {
    fn from_header(header: &csv::StringRecord) -> Result<Self, ValidationError> {
        let names: Vec<&str> = header.iter().collect();

        if names.len() < REQUIRED_COLUMNS.len() || names[..REQUIRED_COLUMNS.len()] != REQUIRED_COLUMNS {
            return Err(ValidationError::InvalidHeader(format!(
                "expected '{}', found '{}'",
                REQUIRED_COLUMNS.join(","),
                names.join(",")
            )));
        }

        let mut layout = Layout {
            width: names.len(),
            font_name: None,
            max_width: None,
        };

        for (position, name) in names.iter().enumerate().skip(REQUIRED_COLUMNS.len()) {
            let slot = match *name {
                "font_name" => &mut layout.font_name,
                "max_width" => &mut layout.max_width,
                other => {
                    return Err(ValidationError::InvalidHeader(format!(
                        "unexpected column '{other}' (optional columns are {})",
                        OPTIONAL_COLUMNS.join(", ")
                    )))
                }
            };
            if slot.replace(position).is_some() {
                return Err(ValidationError::InvalidHeader(format!(
                    "column '{name}' appears twice"
                )));
            }
        }

        Ok(layout)
    }

    fn parse_record(
        &self,
        record: &csv::StringRecord,
        line: usize,
    ) -> Result<FieldDescriptor, ValidationError> {
        if record.len() < REQUIRED_COLUMNS.len() || record.len() > self.width {
            return Err(ValidationError::ColumnCount {
                line,
                min: REQUIRED_COLUMNS.len(),
                max: self.width,
                found: record.len(),
            });
        }

        let cell = |position: usize| record.get(position).unwrap_or_default();
        let invalid = |column: &str, message: String| ValidationError::InvalidValue {
            line,
            column: column.to_string(),
            message,
        };

        let field_name = cell(0);
        if field_name.is_empty() {
            return Err(invalid("field_name", "field name is empty".to_string()));
        }

        let page_number = cell(1).parse::<usize>().map_err(|_| {
            invalid(
                "page_number",
                format!("expected a non-negative integer, found '{}'", cell(1)),
            )
        })?;

        let x = parse_coordinate(cell(2)).map_err(|m| invalid("x", m))?;
        let y = parse_coordinate(cell(3)).map_err(|m| invalid("y", m))?;

        let field_type = cell(4)
            .parse::<FieldType>()
            .map_err(|m| invalid("field_type", m))?;

        let font_size = cell(5)
            .parse::<f32>()
            .ok()
            .filter(|size| size.is_finite() && *size > 0.0)
            .ok_or_else(|| {
                invalid(
                    "font_size",
                    format!("expected a positive number, found '{}'", cell(5)),
                )
            })?;

        let mut field = FieldDescriptor::new(field_name, page_number, x, y, field_type, font_size);

        if let Some(name) = self.font_name.map(cell).filter(|name| !name.is_empty()) {
            field.font = name
                .parse::<StandardFont>()
                .map_err(|_| invalid("font_name", format!("unknown font '{name}'")))?;
        }

        if let Some(raw) = self.max_width.map(cell).filter(|raw| !raw.is_empty()) {
            let max_width = raw
                .parse::<f64>()
                .ok()
                .filter(|width| width.is_finite() && *width > 0.0)
                .ok_or_else(|| {
                    invalid("max_width", format!("expected a positive number, found '{raw}'"))
                })?;
            field.max_width = Some(max_width);
        }

        Ok(field)
    }
}

fn parse_coordinate(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| format!("expected a number, found '{raw}'"))
}
