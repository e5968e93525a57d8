//! ingot-load: Turn a JSON, NDJSON or XML file into flat NDJSON records
//!
//! Usage:
//!   # One record per element of the "results" array, to stdout
//!   ingot-load --records results census.json
//!
//!   # Compact field names and keep the key map for schema registration
//!   ingot-load --compact-keys --metadata census.meta.json -o census.jsonl census.json
//!
//!   # XML from stdin
//!   cat export.xml | ingot-load --format xml --records row

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ingot::document::write_summary;
use ingot::{load_json, load_ndjson, load_xml, LoadConfig, LoadSummary, RecordWriter};
use std::fs::File;
use std::io::{stdin, stdout, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Ndjson,
    Xml,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("xml") => Format::Xml,
            Some("jsonl") | Some("ndjson") => Format::Ndjson,
            _ => Format::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ingot-load")]
#[command(about = "Convert hierarchical data into flat NDJSON records", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Input format (default: from the file extension, else json)
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Emit the object elements of the array with this field name as records
    #[arg(long, value_name = "NAME")]
    records: Option<String>,

    /// Replace top-level field names with short digest-prefix codes
    #[arg(long)]
    compact_keys: bool,

    /// JSON file with load settings; flags override it
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write records here instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Write the key map and field catalog here as JSON
    #[arg(long, value_name = "PATH")]
    metadata: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    let format = args
        .format
        .or_else(|| args.input.as_deref().map(Format::from_path))
        .unwrap_or(Format::Json);

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(stdin())),
    };

    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(stdout().lock())),
    };
    let mut writer = RecordWriter::new(output);

    info!(?format, records = ?config.records_array_name, compact = config.compact_keys, "loading");
    let summary = match format {
        Format::Json => load_json(reader, &config, &mut writer),
        Format::Ndjson => load_ndjson(reader, &config, &mut writer),
        Format::Xml => load_xml(reader, &config, &mut writer),
    }
    .context("Failed to load input")?;
    writer.flush().context("Failed to write records")?;

    report(&summary, args.metadata.as_deref())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Settings from `--config`, overridden by command-line flags
fn load_config(args: &Args) -> Result<LoadConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => LoadConfig::default(),
    };

    if let Some(name) = &args.records {
        config.records_array_name = Some(name.clone());
    }
    if args.compact_keys {
        config.compact_keys = true;
    }
    Ok(config)
}

fn report(summary: &LoadSummary, metadata: Option<&Path>) -> Result<()> {
    if let Some(path) = metadata {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_summary(BufWriter::new(file), summary)?;
    }

    if summary.records == 0 {
        eprintln!("Warning: No records found in input");
    } else {
        eprintln!(
            "✓ {} records, {} fields{}",
            summary.records,
            summary.fields.len(),
            if summary.key_map.is_some() { " (keys compacted)" } else { "" }
        );
    }
    Ok(())
}
