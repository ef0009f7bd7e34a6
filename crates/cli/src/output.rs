use anyhow::Context;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use template::{RowOutcome, Template};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Longest file stem taken from a data value
const MAX_STEM_CHARS: usize = 80;

/// Machine-readable account of a `fill` run
#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub template: String,
    pub pdf: String,
    pub data: String,
    pub out_dir: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
    pub succeeded: usize,
    pub failed: usize,
    pub rows: Vec<RowReport>,
}

/// One data row in a [`Report`]; `row` is 1-based
#[derive(Debug, PartialEq, Serialize)]
pub struct RowReport {
    pub row: usize,
    pub status: RowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Ok,
    Failed,
}

impl RowReport {
    /// Report a row's outcome; `file` is where a successful row was written
    pub fn new(outcome: &RowOutcome, file: Option<String>) -> Self {
        let row = outcome.index + 1;
        match &outcome.result {
            Ok(_) => RowReport {
                row,
                status: RowStatus::Ok,
                file,
                field: None,
                error: None,
            },
            Err(e) => RowReport {
                row,
                status: RowStatus::Failed,
                file: None,
                field: e.field().map(str::to_string),
                error: Some(e.to_string()),
            },
        }
    }
}

impl Report {
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Zip archive collecting the successful outputs of a run
pub struct Archive {
    path: PathBuf,
    writer: ZipWriter<File>,
    entries: usize,
}

impl Archive {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        let file = File::create(path).with_context(|| format!("failed to create archive {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: ZipWriter::new(file),
            entries: 0,
        })
    }

    /// Add one PDF under `name`
    pub fn add(&mut self, name: &str, bytes: &[u8]) -> anyhow::Result<()> {
        // Fixed timestamps keep archives of identical runs identical
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());
        self.writer
            .start_file(name, options)
            .with_context(|| format!("failed to add {name} to {}", self.path.display()))?;
        self.writer
            .write_all(bytes)
            .with_context(|| format!("failed to add {name} to {}", self.path.display()))?;
        self.entries += 1;
        Ok(())
    }

    /// Write the central directory; returns the number of entries
    pub fn finish(self) -> anyhow::Result<usize> {
        self.writer
            .finish()
            .with_context(|| format!("failed to finish archive {}", self.path.display()))?;
        Ok(self.entries)
    }
}

/// Hands out unique, filesystem-safe PDF file names
#[derive(Debug, Default)]
pub struct OutputNames {
    used: HashSet<String>,
}

impl OutputNames {
    /// Name for a row: the sanitised `preferred` value when it has one,
    /// `row-NNNN` otherwise, suffixed with `-2`, `-3`, ... on clashes
    pub fn assign(&mut self, row: usize, preferred: Option<&str>) -> String {
        let stem = preferred
            .map(sanitize_stem)
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| format!("row-{row:04}"));

        let mut candidate = format!("{stem}.pdf");
        let mut suffix = 2;
        while !self.used.insert(candidate.to_lowercase()) {
            candidate = format!("{stem}-{suffix}.pdf");
            suffix += 1;
        }
        candidate
    }
}

/// Keep letters, digits, `-`, `_` and `.`; turn everything else into `_`
fn sanitize_stem(value: &str) -> String {
    let mut stem = String::new();
    for c in value.trim().chars() {
        let c = if c.is_alphanumeric() || matches!(c, '-' | '.') { c } else { '_' };
        if c == '_' && stem.ends_with('_') {
            continue;
        }
        stem.push(c);
        if stem.chars().count() >= MAX_STEM_CHARS {
            break;
        }
    }
    stem.trim_matches(|c| c == '_' || c == '.').to_string()
}

pub fn print_fields(template: &Template) {
    let name_width = template
        .field_names()
        .map(|name| name.chars().count())
        .max()
        .unwrap_or(10)
        .max("field".len());

    println!(
        "  {:<name_width$}  {:>4}  {:>8}  {:>8}  {:<8}  {:>5}  {:<21}  max_width",
        "field", "page", "x", "y", "type", "size", "font"
    );
    for field in template {
        let max_width = field
            .max_width
            .map(|w| w.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<name_width$}  {:>4}  {:>8}  {:>8}  {:<8}  {:>5}  {:<21}  {}",
            field.field_name,
            field.page_number,
            field.x,
            field.y,
            field.field_type.as_str(),
            field.font_size,
            field.font.to_string(),
            max_width
        );
    }
}
