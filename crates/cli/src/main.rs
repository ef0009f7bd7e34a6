mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "formfill",
    version,
    about = "Fill a PDF form once per spreadsheet row"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the form for every data row and write one PDF per row
    Fill(commands::fill::FillArgs),
    /// Validate a template CSV and list its fields
    Check {
        /// Template CSV describing field positions
        #[arg(long, value_name = "CSV")]
        template: PathBuf,

        /// Also check field pages against this PDF
        #[arg(long, value_name = "PDF")]
        pdf: Option<PathBuf>,
    },
    /// List the columns and row count of a spreadsheet
    Columns {
        /// CSV, XLSX, XLS or ODS file
        #[arg(long, value_name = "FILE")]
        data: PathBuf,

        /// Worksheet name (defaults to the first sheet)
        #[arg(long, value_name = "NAME")]
        sheet: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formfill=info,template=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fill(args) => commands::fill::run(&args),
        Commands::Check { template, pdf } => commands::check::run(&template, pdf.as_deref()),
        Commands::Columns { data, sheet } => commands::columns::run(&data, sheet.as_deref()),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
