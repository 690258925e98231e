//! csv-reconcile CLI - import CSV files against known column layouts

use std::env;
use std::fs;
use std::process::ExitCode;

use clap::Parser;
use csv_reconcile::{Dialects, EncodingPolicy, ImportOutcome, Importer, Quote};
use log::{LevelFilter, info};
use serde_json::Value;

/// Import CSV files against a set of known column layouts (dialects).
///
/// Each input is matched against every dialect in the configuration file.
/// The result is either the mapped records, or a report of the columns that
/// could not be recognized.
#[derive(Parser, Debug)]
#[command(name = "csv-reconcile")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV file(s) to import
    #[arg(required = true)]
    inputs: Vec<String>,

    /// JSON file with the dialect definitions
    #[arg(long, value_name = "FILE")]
    dialects: String,

    /// Import even when some columns carrying data are unrecognized
    #[arg(long)]
    force: bool,

    /// Use this dialect instead of picking the best match
    #[arg(long, value_name = "NAME")]
    dialect: Option<String>,

    /// Field delimiter (single character, default: ',')
    #[arg(short = 'd', long)]
    delimiter: Option<char>,

    /// Quote character (single character, or 'none')
    #[arg(short = 'q', long)]
    quote: Option<String>,

    /// Guess the encoding of non-UTF-8 input instead of assuming Western
    #[arg(long)]
    detect_encoding: bool,

    /// Output format: text (default) or json
    #[arg(short = 'f', long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn init_logging() {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if env::var("RUST_LOG").is_err() {
        builder.filter_module("csv_reconcile", LevelFilter::Info);
    }
    let _ = builder.format_timestamp_millis().try_init();
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    let importer = match build_importer(&args) {
        Ok(importer) => importer,
        Err(e) => {
            eprintln!("Error loading dialects from {}: {}", args.dialects, e);
            return ExitCode::FAILURE;
        }
    };

    let mut exit_code = ExitCode::SUCCESS;

    for input in &args.inputs {
        match import_input(&importer, input, &args) {
            Ok(outcome) => match args.format {
                OutputFormat::Text => print_text_output(input, &outcome),
                OutputFormat::Json => print_json_output(input, &outcome),
            },
            Err(e) => {
                eprintln!("Error processing {input}: {e}");
                exit_code = ExitCode::FAILURE;
            }
        }
    }

    exit_code
}

fn build_importer(args: &Args) -> csv_reconcile::Result<Importer> {
    let dialects = Dialects::from_path(&args.dialects)?;
    let mut importer = Importer::new(&dialects)?;
    info!(
        "Loaded {} dialect(s) from '{}'",
        importer.registry().len(),
        args.dialects
    );

    if let Some(delim) = args.delimiter {
        importer.delimiter(delim as u8);
    }

    if let Some(ref quote_str) = args.quote {
        if quote_str.to_lowercase() == "none" {
            importer.quote(Quote::None);
        } else if let Some(c) = quote_str.chars().next() {
            importer.quote(Quote::Some(c as u8));
        }
    }

    if args.detect_encoding {
        importer.encoding_policy(EncodingPolicy::Detect);
    }

    if let Some(ref name) = args.dialect {
        importer.dialect(name.as_str());
    }

    Ok(importer)
}

fn read_input(input: &str) -> csv_reconcile::Result<Vec<u8>> {
    #[cfg(feature = "http")]
    if csv_reconcile::http::is_url(input) {
        return Ok(csv_reconcile::http::fetch_url(input)?);
    }

    Ok(fs::read(input)?)
}

fn import_input(importer: &Importer, input: &str, args: &Args) -> csv_reconcile::Result<ImportOutcome> {
    let data = read_input(input)?;
    importer.import_from_bytes(&data, args.force)
}

fn print_text_output(input: &str, outcome: &ImportOutcome) {
    println!("File: {input}");

    match outcome {
        ImportOutcome::Complete { row_objects } => {
            println!("  Outcome: complete");
            println!("  Records: {}", row_objects.len());
            for (i, record) in row_objects.iter().enumerate() {
                println!("    {}: {}", i + 1, Value::Object(record.clone()));
            }
        }
        ImportOutcome::Incomplete { columns, rows } => {
            println!("  Outcome: incomplete");
            println!("  Dialect: {}", columns.dialect_name);
            println!("  Present: {}", format_labels(&columns.present));
            println!("  Missing: {}", columns.missing.join(", "));
            println!("  Unmatched: {}", format_labels(&columns.unmatched));
            println!("  Rows held back: {}", rows.len());
        }
    }

    println!();
}

fn format_labels(labels: &[Option<String>]) -> String {
    labels
        .iter()
        .map(|label| label.as_deref().unwrap_or("<unnamed>"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_json_output(input: &str, outcome: &ImportOutcome) {
    let mut value = serde_json::to_value(outcome).unwrap_or(Value::Null);
    if let Value::Object(ref mut map) = value {
        map.insert("file".to_string(), Value::String(input.to_string()));
    }
    println!("{value}");
}
