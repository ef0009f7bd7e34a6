use anyhow::{bail, Context};
use clap::{Args, ValueEnum};
use pdf_core::{Color, PdfError, SourcePdf};
use spreadsheet::load_worksheet;
use std::path::{Path, PathBuf};
use template::{
    parse_template, BatchSummary, ColumnMapping, DateFormat, FillError, FillOptions, FormFiller, NumberFormat,
    Origin, Template,
};

use crate::output::{Archive, OutputNames, Report, RowReport};

#[derive(Args, Debug)]
pub struct FillArgs {
    /// Template CSV describing field positions
    #[arg(long, value_name = "CSV")]
    pub template: PathBuf,

    /// PDF form to fill
    #[arg(long, value_name = "PDF")]
    pub pdf: PathBuf,

    /// Row data: CSV, XLSX, XLS or ODS
    #[arg(long, value_name = "FILE")]
    pub data: PathBuf,

    /// Directory the filled PDFs are written to
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// JSON object mapping field names to column names (null = leave blank)
    #[arg(long, value_name = "JSON")]
    pub mapping: Option<PathBuf>,

    /// Map one field to a column
    #[arg(long = "map", value_name = "FIELD=COLUMN", value_parser = parse_field_column)]
    pub map: Vec<(String, String)>,

    /// Leave a field blank
    #[arg(long, value_name = "FIELD")]
    pub unmapped: Vec<String>,

    /// Map fields to identically named columns (the default when no mapping is given)
    #[arg(long)]
    pub auto_map: bool,

    /// Worksheet name (defaults to the first sheet)
    #[arg(long, value_name = "NAME")]
    pub sheet: Option<String>,

    /// Column whose value names each output file
    #[arg(long, value_name = "COLUMN")]
    pub name_column: Option<String>,

    /// Where field y coordinates are measured from
    #[arg(long, value_enum, default_value_t = OriginArg::BottomLeft)]
    pub origin: OriginArg,

    /// Pattern for number fields
    #[arg(long, value_name = "PATTERN", default_value = NumberFormat::DEFAULT_PATTERN)]
    pub number_format: String,

    /// strftime pattern for date fields
    #[arg(long, value_name = "FORMAT", default_value = DateFormat::DEFAULT_PATTERN)]
    pub date_format: String,

    /// Text colour as a hex RGB triplet (e.g. 1F3A93)
    #[arg(long, value_name = "RRGGBB", value_parser = parse_color)]
    pub text_color: Option<Color>,

    /// Also collect the filled PDFs into a zip archive
    #[arg(long, value_name = "ZIP")]
    pub archive: Option<PathBuf>,

    /// Write a JSON report of every row
    #[arg(long, value_name = "JSON")]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OriginArg {
    BottomLeft,
    TopLeft,
}

impl From<OriginArg> for Origin {
    fn from(origin: OriginArg) -> Self {
        match origin {
            OriginArg::BottomLeft => Origin::BottomLeft,
            OriginArg::TopLeft => Origin::TopLeft,
        }
    }
}

fn parse_field_column(value: &str) -> Result<(String, String), String> {
    let (field, column) = value
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=COLUMN, found '{value}'"))?;
    let (field, column) = (field.trim(), column.trim());
    if field.is_empty() || column.is_empty() {
        return Err(format!("expected FIELD=COLUMN, found '{value}'"));
    }
    Ok((field.to_string(), column.to_string()))
}

fn parse_color(value: &str) -> Result<Color, String> {
    let hex = value.trim().trim_start_matches('#');
    let invalid = || format!("expected a colour like 1F3A93, found '{value}'");
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(Color::from_rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Returns `false` when any row failed
pub fn run(args: &FillArgs) -> anyhow::Result<bool> {
    let template_text = std::fs::read_to_string(&args.template)
        .with_context(|| format!("failed to read template {}", args.template.display()))?;
    let template = parse_template(&template_text)
        .with_context(|| format!("invalid template {}", args.template.display()))?;

    let source = SourcePdf::open(&args.pdf)
        .with_context(|| format!("failed to open PDF {}", args.pdf.display()))?;

    let sheet = load_worksheet(&args.data, args.sheet.as_deref())
        .with_context(|| format!("failed to read data {}", args.data.display()))?;
    tracing::info!(
        fields = template.len(),
        pages = source.page_count(),
        rows = sheet.len(),
        "Loaded inputs"
    );

    if let Some(column) = &args.name_column {
        if !sheet.has_column(column) {
            bail!("name column '{column}' is not in {}", args.data.display());
        }
    }

    let mapping = build_mapping(args, &template, sheet.headers())?
        .resolve(&template, Some(sheet.headers()))
        .context("column mapping does not fit the template")?;

    let mut options = FillOptions::default()
        .with_origin(args.origin.into())
        .with_number_format(NumberFormat::parse(&args.number_format)?)
        .with_date_format(DateFormat::parse(&args.date_format)?);
    if let Some(color) = args.text_color {
        options = options.with_text_color(color);
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;
    let mut archive = args.archive.as_deref().map(Archive::create).transpose()?;

    let mut report = Report {
        template: args.template.display().to_string(),
        pdf: args.pdf.display().to_string(),
        data: args.data.display().to_string(),
        out_dir: args.out_dir.display().to_string(),
        archive: args.archive.as_ref().map(|path| path.display().to_string()),
        ..Report::default()
    };
    let mut summary = BatchSummary::default();
    let mut names = OutputNames::default();

    let filler = FormFiller::new(&source, &template).with_options(options);
    for (mut outcome, data_row) in filler.batch(sheet.rows(), mapping).zip(sheet.rows()) {
        let row = outcome.index + 1;

        let written = outcome.result.as_ref().ok().map(|doc| {
            let preferred = args.name_column.as_deref().and_then(|column| data_row.get(column));
            let name = names.assign(row, preferred);
            write_output(&args.out_dir.join(&name), doc.bytes(), archive.as_mut(), &name).map(|()| name)
        });
        let file = match written {
            Some(Ok(name)) => Some(name),
            Some(Err(e)) => {
                tracing::warn!(row, error = %format!("{e:#}"), "Failed to write output");
                // Keep going; the row is reported as failed
                outcome.result = Err(FillError::Pdf(PdfError::SaveError(format!("{e:#}"))));
                None
            }
            None => None,
        };

        match &outcome.result {
            Ok(_) => println!("row {row}: ok -> {}", file.as_deref().unwrap_or_default()),
            Err(e) => println!("row {row}: FAILED: {e}"),
        }
        summary.record(&outcome);
        report.rows.push(RowReport::new(&outcome, file));
    }

    report.succeeded = summary.succeeded;
    report.failed = summary.failed;
    eprintln!(
        "Filled {} of {} row(s) into {}",
        summary.succeeded,
        summary.total(),
        args.out_dir.display()
    );

    if let Some(path) = &args.report {
        report
            .write(path)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        eprintln!("Report written to {}", path.display());
    }

    if let (Some(archive), Some(path)) = (archive, &args.archive) {
        let entries = archive.finish()?;
        eprintln!("Archived {entries} PDF(s) to {}", path.display());
    }

    Ok(summary.all_succeeded())
}

/// Combine the mapping sources; later ones override earlier ones.
///
/// Order: auto-map, mapping file, `--map`, `--unmapped`. With no source at
/// all, fields are auto-mapped.
fn build_mapping(args: &FillArgs, template: &Template, headers: &[String]) -> anyhow::Result<ColumnMapping> {
    let explicit = args.mapping.is_some() || !args.map.is_empty() || !args.unmapped.is_empty();

    let mut mapping = if args.auto_map || !explicit {
        ColumnMapping::auto(template, headers)
    } else {
        ColumnMapping::new()
    };

    if let Some(path) = &args.mapping {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read mapping {}", path.display()))?;
        let from_file = ColumnMapping::from_json(&json)
            .with_context(|| format!("invalid mapping {}", path.display()))?;
        mapping.extend(from_file);
    }

    for (field, column) in &args.map {
        mapping.insert(field.as_str(), column.as_str());
    }
    for field in &args.unmapped {
        mapping.insert_unmapped(field.as_str());
    }

    Ok(mapping)
}

/// Write one filled PDF, adding it to the archive when there is one
fn write_output(path: &Path, bytes: &[u8], archive: Option<&mut Archive>, name: &str) -> anyhow::Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    if let Some(archive) = archive {
        archive.add(name, bytes)?;
    }
    Ok(())
}
