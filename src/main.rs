use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::{error, info};

use ontime_extract::classify::DEFAULT_AIRPORTS;
use ontime_extract::config::{DEFAULT_FILTER_BATCH_SIZE, RetryPolicy, UnitFailureMode};
use ontime_extract::source::RecordSource;
use ontime_extract::{
    AirportFilter, AliasTable, CancellationToken, CanonicalFieldSet, ClassificationPipeline,
    CsvFileSource, CsvSink, ExtractConfig, ExtractError, ParquetFileSource, PeriodCatalog,
    PipelineOptions, ReportingPeriod, RunOptions, RunSummary, UnitStatus, run_units,
};

/// Exit status when no unit produced any output
const EXIT_EMPTY_RESULT: u8 = 2;

#[derive(Parser)]
#[command(name = "ontime-extract")]
#[command(about = "Reconcile and filter monthly on-time flight extracts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one carrier's domestic flights from monthly extracts into one CSV
    Extract {
        /// Directory holding the monthly extract files
        #[arg(long)]
        catalog: PathBuf,

        /// Output CSV path (truncated first)
        #[arg(long)]
        out: PathBuf,

        /// Years to process, all twelve months each
        #[arg(long, num_args = 1.., default_values_t = [2023, 2024])]
        years: Vec<i32>,

        /// Individual periods (YYYY-MM) instead of whole years
        #[arg(long, num_args = 1.., conflicts_with = "years")]
        periods: Vec<ReportingPeriod>,

        /// Carrier code to keep
        #[arg(long, default_value = "AA")]
        carrier: String,

        /// Filter on the marketing carrier instead of the operating carrier
        #[arg(long)]
        use_marketing: bool,

        /// Do not count PR, VI, GU, AS and MP as domestic
        #[arg(long)]
        exclude_territories: bool,

        /// Rows per batch (default from ONTIME_BATCH_SIZE or 300000)
        #[arg(long)]
        batch_size: Option<usize>,

        /// Read attempts per unit before giving up
        #[arg(long, default_value_t = 3)]
        retries: u32,

        /// Abort the run on the first failing unit
        #[arg(long)]
        strict: bool,

        /// Stop after this many units
        #[arg(long)]
        max_units: Option<usize>,

        /// JSON alias table replacing the built-in one
        #[arg(long)]
        aliases: Option<PathBuf>,

        /// Write the run summary as JSON
        #[arg(long)]
        summary_json: Option<PathBuf>,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Keep one carrier's flights between a set of airports
    FilterAirports {
        /// Input CSV or Parquet file
        #[arg(long)]
        input: PathBuf,

        /// Output CSV path (truncated first)
        #[arg(long)]
        out: PathBuf,

        /// Comma-separated airport codes; both endpoints must be in the set
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_AIRPORTS.map(String::from))]
        airports: Vec<String>,

        /// Carrier code to keep
        #[arg(long, default_value = "AA")]
        carrier: String,

        /// Rows per batch
        #[arg(long, default_value_t = DEFAULT_FILTER_BATCH_SIZE)]
        batch_size: usize,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(ExtractError::EmptyResult { .. }) = e.downcast_ref::<ExtractError>() {
                error!("{e}");
                return ExitCode::from(EXIT_EMPTY_RESULT);
            }
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Extract {
            catalog,
            out,
            years,
            periods,
            carrier,
            use_marketing,
            exclude_territories,
            batch_size,
            retries,
            strict,
            max_units,
            aliases,
            summary_json,
            no_progress,
        } => {
            let mut config = ExtractConfig::from_env().with_carrier(carrier);
            if let Some(batch_size) = batch_size {
                config = config.with_batch_size(batch_size);
            }
            config.prefer_marketing = use_marketing;
            config.include_territories = !exclude_territories;
            config.retry = RetryPolicy {
                attempts: retries,
                ..RetryPolicy::default()
            };
            if strict {
                config = config.with_failure_mode(UnitFailureMode::Abort);
            }
            config.max_units = max_units;
            config.show_progress = !no_progress;
            config.validate()?;

            if !catalog.is_dir() {
                bail!("Catalog directory does not exist: {}", catalog.display());
            }

            let table = match aliases {
                Some(path) => AliasTable::from_json_file(&path)
                    .with_context(|| format!("Failed to load alias table {}", path.display()))?,
                None => AliasTable::on_time_reporting(),
            };
            let fields = CanonicalFieldSet::default();

            let periods = if periods.is_empty() {
                ReportingPeriod::for_years(&years)
            } else {
                periods
            };
            let sources = PeriodCatalog::new(&catalog).sources(&periods);
            info!(
                "Extracting carrier {} from {} period(s) in {}",
                config.carrier,
                sources.len(),
                catalog.display()
            );

            let pipeline =
                ClassificationPipeline::new(&table, &fields, PipelineOptions::from(&config));
            let mut sink = CsvSink::create(&out)
                .with_context(|| format!("Failed to create output {}", out.display()))?
                .with_field_order(&fields);

            let summary = run_units(
                &sources,
                &pipeline,
                &mut sink,
                &RunOptions::from(&config),
                &CancellationToken::new(),
            )?;
            report(&summary, &out, summary_json.as_deref())
        }

        Commands::FilterAirports {
            input,
            out,
            airports,
            carrier,
            batch_size,
            no_progress,
        } => {
            if !input.is_file() {
                bail!("Input file does not exist: {}", input.display());
            }
            let filter = AirportFilter::new(&carrier, &airports);
            if filter.airports().is_empty() {
                bail!("No airports given");
            }

            let source: Box<dyn RecordSource> =
                match input.extension().and_then(|e| e.to_str()) {
                    Some("parquet") => Box::new(ParquetFileSource::new(&input)),
                    _ => Box::new(CsvFileSource::new(&input)),
                };

            let config = ExtractConfig::default()
                .with_carrier(carrier)
                .with_batch_size(batch_size);
            config.validate()?;
            let options = RunOptions {
                failure_mode: UnitFailureMode::Abort,
                show_progress: !no_progress,
                ..RunOptions::from(&config)
            };

            let mut sink = CsvSink::create(&out)
                .with_context(|| format!("Failed to create output {}", out.display()))?
                .in_arrival_order();
            let summary = run_units(
                &[source],
                &filter,
                &mut sink,
                &options,
                &CancellationToken::new(),
            )?;
            report(&summary, &out, None)
        }
    }
}

fn report(summary: &RunSummary, out: &Path, summary_json: Option<&Path>) -> anyhow::Result<()> {
    let skipped = summary.with_status(UnitStatus::Skipped).count();
    let failed = summary.with_status(UnitStatus::Failed).count();
    if skipped + failed > 0 {
        log::warn!("{skipped} unit(s) skipped and {failed} failed; see warnings above");
    }
    info!("Wrote {} rows to {}", summary.rows_written, out.display());

    if let Some(path) = summary_json {
        let json = summary.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write summary {}", path.display()))?;
        info!("Run summary written to {}", path.display());
    }
    Ok(())
}
