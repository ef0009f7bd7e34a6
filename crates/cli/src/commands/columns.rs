use anyhow::Context;
use spreadsheet::load_worksheet;
use std::path::Path;

pub fn run(data_path: &Path, sheet: Option<&str>) -> anyhow::Result<bool> {
    let spreadsheet = load_worksheet(data_path, sheet)
        .with_context(|| format!("failed to read data {}", data_path.display()))?;

    println!("Columns in {}:\n", data_path.display());
    for (position, header) in spreadsheet.headers().iter().enumerate() {
        println!("  {:>3}  {header}", position + 1);
    }
    println!("\n{} data row(s)", spreadsheet.len());

    Ok(true)
}
