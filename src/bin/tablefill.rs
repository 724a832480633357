use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use office_table_fill::{
    CsvOptions, ExtractOptions, ExtractionReport, FillMode, FillRecord, GridOptions, HeaderMode,
    PageDetections, PageSelection, QualityMode, RowStrategy, TableArea, TableFillRequest,
    extract_tables, handle_table_fill, tables_to_csv_string,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "tablefill",
    version,
    about = "Rebuild tables from OCR detections and fill them with records"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build tables from recorded detector output.
    Extract(ExtractArgs),
    /// Answer a table-fill request body.
    Fill(FillArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QualityArg {
    BestEffort,
    Strict,
    SkipAmbiguous,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// JSON array of per-page detections.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Page selection like 1-3,5.
    #[arg(long)]
    pages: Option<String>,

    /// Fallback table area in format page:x1,y1,x2,y2. Repeatable.
    #[arg(long = "area")]
    areas: Vec<String>,

    /// Share of the region height that separates two rows.
    #[arg(long, default_value_t = office_table_fill::DEFAULT_ROW_THRESHOLD_RATIO)]
    row_threshold: f32,

    /// Sort fragments top to bottom before grouping rows.
    #[arg(long)]
    sort_rows: bool,

    /// Ignore fragments below this OCR confidence.
    #[arg(long, default_value_t = 0.0)]
    min_confidence: f32,

    /// Use the first row of each table as column names.
    #[arg(long, conflicts_with = "detect_header")]
    has_header: bool,

    /// Guess whether the first row holds column names.
    #[arg(long, conflicts_with = "has_header")]
    detect_header: bool,

    #[arg(long, value_enum, default_value_t = QualityArg::BestEffort)]
    quality: QualityArg,

    /// JSON array of fill records applied to every table.
    #[arg(long)]
    fill: Option<PathBuf>,

    /// Match fill records to rows by this column instead of by position.
    #[arg(long, requires = "fill")]
    key_column: Option<String>,

    /// Output delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Drop page column from output CSV.
    #[arg(long = "nopage")]
    no_page: bool,

    /// Drop table_id column from output CSV.
    #[arg(long = "notable")]
    no_table: bool,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct FillArgs {
    /// Request body: {"tables": [...], "fill_data": [...]}.
    #[arg(short, long)]
    input: PathBuf,

    /// Output path; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_options(args: &ExtractArgs) -> Result<ExtractOptions> {
    let pages = args
        .pages
        .as_deref()
        .map(PageSelection::from_str)
        .transpose()
        .context("failed to parse --pages")?;

    let areas = args
        .areas
        .iter()
        .map(|value| {
            TableArea::from_str(value).with_context(|| format!("failed to parse --area '{value}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    let header_mode = if args.has_header {
        HeaderMode::HasHeader
    } else if args.detect_header {
        HeaderMode::AutoDetect
    } else {
        HeaderMode::NoHeader
    };

    let quality_mode = match args.quality {
        QualityArg::BestEffort => QualityMode::BestEffort,
        QualityArg::Strict => QualityMode::Strict,
        QualityArg::SkipAmbiguous => QualityMode::SkipAmbiguous,
    };

    Ok(ExtractOptions {
        pages,
        areas,
        grid: GridOptions {
            row_threshold_ratio: args.row_threshold,
            row_strategy: if args.sort_rows {
                RowStrategy::SortedByY
            } else {
                RowStrategy::Sequential
            },
            min_confidence: args.min_confidence,
        },
        header_mode,
        quality_mode,
    })
}

fn parse_csv_options(args: &ExtractArgs) -> Result<CsvOptions> {
    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    Ok(CsvOptions {
        delimiter: args.delimiter as u8,
        no_page: args.no_page,
        no_table: args.no_table,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse '{}'", path.display()))
}

fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("failed to write '{}'", path.display())),
        None => {
            print!("{content}");
            Ok(())
        }
    }
}

fn log_report(report: &ExtractionReport, verbose: bool) {
    if report.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", report.warnings.len());
    if verbose {
        for warning in &report.warnings {
            eprintln!(
                "  - {:?} page={:?} table_id={:?} confidence={:?}: {}",
                warning.code, warning.page, warning.table_id, warning.confidence, warning.message
            );
        }
    }
}

fn run_extract(args: &ExtractArgs) -> Result<ExtractionReport> {
    let options = parse_options(args)?;
    let csv_options = parse_csv_options(args)?;
    let pages: Vec<PageDetections> = read_json(&args.input)?;

    let mut report = extract_tables(&pages, &options)
        .with_context(|| format!("failed to extract tables from '{}'", args.input.display()))?;

    if let Some(fill_path) = &args.fill {
        let records: Vec<FillRecord> = read_json(fill_path)?;
        let mode = args
            .key_column
            .clone()
            .map_or(FillMode::Positional, |key_column| FillMode::ByName { key_column });
        report = report.fill(&records, &mode);
    }

    let content = match args.format {
        OutputFormat::Csv => tables_to_csv_string(&report.tables, &csv_options)?,
        OutputFormat::Json => serde_json::to_string_pretty(&report)? + "\n",
    };
    write_output(args.output.as_deref(), &content)?;
    Ok(report)
}

fn run_fill(args: &FillArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read '{}'", args.input.display()))?;
    let request = TableFillRequest::from_json(&raw)
        .map_err(|error| anyhow!("{}: {}", error.code, error.message))
        .with_context(|| format!("failed to parse '{}'", args.input.display()))?;

    let response = handle_table_fill(request);
    let content = serde_json::to_string_pretty(&response)? + "\n";
    write_output(args.output.as_deref(), &content)
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("office_table_fill=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Extract(args) => match run_extract(&args) {
            Ok(report) => {
                log_report(&report, args.verbose);
                if report.row_count > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::Fill(args) => match run_fill(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
