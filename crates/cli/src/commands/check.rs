use anyhow::Context;
use pdf_core::SourcePdf;
use std::path::Path;
use template::{parse_template, Template};

use crate::output;

/// Returns `false` when a field lies outside the PDF's pages
pub fn run(template_path: &Path, pdf_path: Option<&Path>) -> anyhow::Result<bool> {
    let text = std::fs::read_to_string(template_path)
        .with_context(|| format!("failed to read template {}", template_path.display()))?;
    let template = parse_template(&text)
        .with_context(|| format!("invalid template {}", template_path.display()))?;

    println!("Template OK: {} field(s)\n", template.len());
    output::print_fields(&template);

    let Some(pdf_path) = pdf_path else {
        return Ok(true);
    };

    let source = SourcePdf::open(pdf_path)
        .with_context(|| format!("failed to open PDF {}", pdf_path.display()))?;
    let out_of_range = fields_out_of_range(&template, source.page_count());

    println!();
    if out_of_range.is_empty() {
        println!("All fields fit the {} page(s) of {}", source.page_count(), pdf_path.display());
        return Ok(true);
    }
    for (field, page) in &out_of_range {
        println!(
            "  {field}: page {page} is out of range ({} has {} page(s))",
            pdf_path.display(),
            source.page_count()
        );
    }
    Ok(false)
}

/// `(field, page)` for every field placed past the last page
fn fields_out_of_range(template: &Template, page_count: usize) -> Vec<(&str, usize)> {
    template
        .fields()
        .iter()
        .filter(|field| field.page_number >= page_count)
        .map(|field| (field.field_name.as_str(), field.page_number))
        .collect()
}
