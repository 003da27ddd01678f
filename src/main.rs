use anyhow::Result;
use clap::{Parser, ValueEnum};
use pubmed_affiliations::config::{load_config, Config, LogFormat};
use pubmed_affiliations::report::{
    create_output_file, render_table, write_csv, write_csv_file, write_json, ReportRow,
    WriteError,
};
use pubmed_affiliations::sources::{FileSource, PubMedSource, Source};
use pubmed_affiliations::utils::is_terminal;
use pubmed_affiliations::{Error, Pipeline, RecordParser, SearchQuery};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// PubMed Affiliations - find papers with pharmaceutical/biotech company authors
#[derive(Parser, Debug)]
#[command(name = "pubmed-affiliations")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch PubMed papers and report authors affiliated with pharmaceutical or biotech companies", long_about = None)]
struct Cli {
    /// PubMed search query (full PubMed query syntax is supported)
    #[arg(required_unless_present_any = ["ids", "input", "print_config"])]
    query: Option<String>,

    /// Write the results to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Print debug information during execution
    #[arg(short, long)]
    debug: bool,

    /// Maximum number of papers to fetch [default: 50]
    #[arg(long, value_name = "N")]
    max_results: Option<usize>,

    /// Restrict to these PubMed IDs (repeatable, or comma separated)
    #[arg(long = "id", value_name = "PMID", value_delimiter = ',')]
    ids: Vec<String>,

    /// Read records from a saved efetch XML file instead of querying PubMed
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Also report papers without company-affiliated authors
    #[arg(long)]
    include_all: bool,

    /// Publication year filter: 2020, 2018-2022, 2010- or -2015
    #[arg(long)]
    year: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging (-v debug, -vv trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short)]
    quiet: bool,

    /// Request timeout in seconds [default: 30]
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Print the resolved configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// CSV when writing to a file or a pipe, table on a terminal
    Auto,
    /// Table format (human-readable)
    Table,
    /// CSV with a header row
    Csv,
    /// JSON array of rows
    Json,
}

impl OutputFormat {
    fn resolve(self, file: Option<&Path>) -> Self {
        match self {
            OutputFormat::Auto if file.is_some() || !is_terminal() => OutputFormat::Csv,
            OutputFormat::Auto => OutputFormat::Table,
            other => other,
        }
    }
}

/// Apply command-line overrides on top of file and environment settings
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(max_results) = cli.max_results {
        config.pubmed.max_results = max_results;
    }
    if let Some(timeout) = cli.timeout {
        config.pubmed.timeout_secs = timeout;
    }
    if cli.include_all {
        config.report.include_all = true;
    }
    if cli.quiet {
        config.logging.level = "error".to_string();
    } else if cli.verbose > 1 {
        config.logging.level = "trace".to_string();
    } else if cli.debug || cli.verbose == 1 {
        config.logging.level = "debug".to_string();
    }
    config
}

fn init_tracing(level: &str, format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("pubmed_affiliations={}", level)),
    );
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn build_query(cli: &Cli, config: &Config) -> SearchQuery {
    let mut query = SearchQuery::new(cli.query.clone().unwrap_or_default())
        .ids(cli.ids.iter().cloned())
        .max_results(config.pubmed.max_results);
    if let Some(year) = &cli.year {
        query = query.year(year.clone());
    }
    query
}

fn write_report(rows: &[ReportRow], format: OutputFormat, file: Option<&Path>) -> Result<(), WriteError> {
    match (format, file) {
        (OutputFormat::Json, Some(path)) => {
            let mut out = create_output_file(path)?;
            write_json(rows, &mut out)?;
            out.flush()?;
        }
        (OutputFormat::Table, Some(path)) => {
            let mut out = create_output_file(path)?;
            writeln!(out, "{}", render_table(rows))?;
            out.flush()?;
        }
        (_, Some(path)) => write_csv_file(rows, path)?,
        (OutputFormat::Json, None) => write_json(rows, std::io::stdout().lock())?,
        (OutputFormat::Table, None) => println!("{}", render_table(rows)),
        (_, None) => write_csv(rows, std::io::stdout().lock())?,
    }
    if let Some(path) = file {
        println!("Results saved to {}", path.display());
    }
    Ok(())
}

async fn run(cli: &Cli, config: &Config) -> Result<ExitCode> {
    let query = build_query(cli, config);

    let source: Arc<dyn Source> = match &cli.input {
        Some(path) => Arc::new(FileSource::new(path)),
        None => Arc::new(PubMedSource::from_config(
            &config.pubmed,
            config.retry.to_retry_config(),
        )?),
    };
    tracing::debug!("Using source {} ({})", source.name(), source.id());

    let pipeline = Pipeline::new(
        source,
        RecordParser::new(config.classifier.build_classifier()),
        config.report.filter(),
    );

    let summary = match pipeline.run(&query).await {
        Ok(summary) => summary,
        Err(Error::NoResults { query }) => {
            tracing::debug!("Nothing matched {}", query);
            eprintln!("No results found for the given query.");
            return Ok(ExitCode::FAILURE);
        }
        Err(Error::NoValidRecords { failed }) => {
            tracing::warn!("All {} records failed to parse", failed);
            eprintln!("No valid records found after parsing.");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if !summary.skipped.is_empty() {
        tracing::warn!(
            "{} of {} records could not be parsed and were skipped",
            summary.skipped.len(),
            summary.papers_parsed + summary.skipped.len()
        );
    }

    if summary.rows.is_empty() {
        println!("No papers found with pharmaceutical/biotech company affiliations.");
        return Ok(ExitCode::SUCCESS);
    }

    let format = cli.output.resolve(cli.file.as_deref());
    if let Err(e) = write_report(&summary.rows, format, cli.file.as_deref()) {
        eprintln!("Error: {}", e);
        // keep the results: dump them to stdout as CSV
        if let Err(fallback) = write_csv(&summary.rows, std::io::stdout().lock()) {
            tracing::error!("Could not write results to stdout: {}", fallback);
        }
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = apply_overrides(load_config(cli.config.as_deref())?, &cli);
    init_tracing(&config.logging.level, config.logging.format);

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(ExitCode::SUCCESS);
    }

    run(&cli, &config).await
}
