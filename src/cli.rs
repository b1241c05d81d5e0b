//! CLI definition and dispatch.

use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use crate::adapters::csv_adapter;
use crate::adapters::env::{self, CACHE_TTL_MIN, FINVIZ_EXPORT_URL};
use crate::adapters::export_cache::{CachedExportAdapter, DEFAULT_TTL_MIN};
use crate::adapters::file_artifact_adapter::FileArtifactAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::news_probe::NeutralNewsProbe;
use crate::domain::config_validation::load_strategy_config;
use crate::domain::error::{EXIT_NO_QUALIFIERS, PremarketError};
use crate::domain::market_time;
use crate::domain::pipeline::{self, EngineOutput};
use crate::domain::strategy::StrategyConfig;
use crate::domain::summary::{RunOutcome, RunSummary, RunSummaryBuilder};
use crate::logging;
use crate::ports::artifact_port::ArtifactPort;
use crate::ports::export_port::{ExportFetcher, ExportPort};
use crate::ports::news_port::NewsPort;

pub const DEFAULT_CONFIG_PATH: &str = "config/strategy.ini";
pub const DEFAULT_RAW_DIR: &str = "data/raw";
pub const DEFAULT_WATCHLIST_DIR: &str = "data/watchlists";
pub const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Parser, Debug)]
#[command(name = "premarket", about = "Pre-market watchlist screener")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download the export, screen it, and write the watchlist artifacts
    Run {
        /// Strategy INI file [env: PREMARKET_CONFIG_PATH]
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output directory [env: PREMARKET_OUT_DIR]
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Override [selection] top_n
        #[arg(long)]
        top_n: Option<usize>,
        /// Reuse a same-day cached export younger than CACHE_TTL_MIN
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        use_cache: bool,
        /// Override [news] enabled
        #[arg(long, action = ArgAction::Set)]
        news: Option<bool>,
        /// Log file [env: PREMARKET_LOG_FILE]
        #[arg(long)]
        log_file: Option<PathBuf>,
        /// Run date (YYYY-MM-DD); defaults to today in --tz
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// IANA zone for the run date and timestamps [env: PREMARKET_TZ]
        #[arg(long)]
        tz: Option<String>,
        /// Mirror artifacts into this SQLite database
        #[arg(long)]
        sqlite: Option<PathBuf>,
        /// Export cache directory
        #[arg(long, default_value = DEFAULT_RAW_DIR)]
        raw_dir: PathBuf,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{value}': {e}"))
}

/// Fully resolved options for one `run`.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub run_date: NaiveDate,
    pub timezone: Tz,
    pub config_path: PathBuf,
    pub out_dir: PathBuf,
    pub raw_dir: PathBuf,
    pub log_file: PathBuf,
    pub sqlite_path: Option<PathBuf>,
    pub top_n: Option<usize>,
    pub use_cache: bool,
    pub news: Option<bool>,
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output: EngineOutput,
    pub summary: RunSummary,
}

impl RunReport {
    pub fn exit_code(&self) -> ExitCode {
        match self.summary.outcome {
            RunOutcome::Selected => ExitCode::SUCCESS,
            RunOutcome::NoQualifiers => ExitCode::from(EXIT_NO_QUALIFIERS),
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            out,
            top_n,
            use_cache,
            news,
            log_file,
            date,
            tz,
            sqlite,
            raw_dir,
        } => {
            let timezone = market_time::resolve_timezone(
                tz.or_else(|| env::env_str(env::PREMARKET_TZ)).as_deref(),
            );
            let run_date = date.unwrap_or_else(|| market_time::today_in(timezone));
            let stamp = run_date.format("%Y-%m-%d").to_string();
            let options = RunOptions {
                run_date,
                timezone,
                config_path: config
                    .or_else(|| env::env_str(env::PREMARKET_CONFIG_PATH).map(PathBuf::from))
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
                out_dir: out
                    .or_else(|| env::env_str(env::PREMARKET_OUT_DIR).map(PathBuf::from))
                    .unwrap_or_else(|| Path::new(DEFAULT_WATCHLIST_DIR).join(&stamp)),
                raw_dir,
                log_file: log_file
                    .or_else(|| env::env_str(env::PREMARKET_LOG_FILE).map(PathBuf::from))
                    .unwrap_or_else(|| {
                        Path::new(DEFAULT_LOG_DIR).join(format!("premarket_{stamp}.log"))
                    }),
                sqlite_path: sqlite,
                top_n,
                use_cache,
                news,
            };
            run_screen(&options)
        }
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, PremarketError> {
    FileConfigAdapter::from_file(path).map_err(|e| PremarketError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Load and validate the strategy file, then apply CLI overrides.
pub fn load_strategy(
    path: &Path,
    top_n: Option<usize>,
    news: Option<bool>,
) -> Result<StrategyConfig, PremarketError> {
    let adapter = load_config(path)?;
    let mut strategy = load_strategy_config(&adapter)?;
    if let Some(n) = top_n {
        if n == 0 {
            return Err(PremarketError::invalid("selection", "top_n", "--top-n must be at least 1"));
        }
        strategy.top_n = n;
    }
    if let Some(enabled) = news {
        strategy.news.enabled = enabled;
    }
    Ok(strategy)
}

#[cfg(feature = "http")]
fn http_fetcher(url: String) -> Result<Box<dyn ExportFetcher>, PremarketError> {
    Ok(Box::new(crate::adapters::http_fetcher::HttpExportFetcher::new(url)?))
}

#[cfg(not(feature = "http"))]
fn http_fetcher(_url: String) -> Result<Box<dyn ExportFetcher>, PremarketError> {
    Err(PremarketError::Acquisition {
        reason: "built without the `http` feature; only cached exports are available".into(),
    })
}

pub fn build_export_port(raw_dir: &Path) -> Result<CachedExportAdapter, PremarketError> {
    let ttl = Duration::from_secs(env::env_u64(CACHE_TTL_MIN, DEFAULT_TTL_MIN) * 60);
    let fetcher = match env::env_str(FINVIZ_EXPORT_URL) {
        Some(url) => Some(http_fetcher(url)?),
        None => {
            tracing::warn!("{FINVIZ_EXPORT_URL} is not set; only a fresh cached export can be used");
            None
        }
    };
    Ok(CachedExportAdapter::new(raw_dir, ttl, fetcher))
}

#[cfg(feature = "sqlite")]
fn sqlite_sink(path: &Path) -> Result<Box<dyn ArtifactPort>, PremarketError> {
    Ok(Box::new(crate::adapters::sqlite_adapter::SqliteAdapter::open(path)?))
}

#[cfg(not(feature = "sqlite"))]
fn sqlite_sink(_path: &Path) -> Result<Box<dyn ArtifactPort>, PremarketError> {
    Err(PremarketError::Artifact {
        artifact: "sqlite".into(),
        reason: "built without the `sqlite` feature".into(),
    })
}

fn run_screen(options: &RunOptions) -> ExitCode {
    // Stage 1: Logging
    if let Err(e) = logging::init(Some(&options.log_file)) {
        eprintln!("error: {e}");
        return ExitCode::from(&e);
    }

    // Stage 2: Wire adapters
    let export = match build_export_port(&options.raw_dir) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let mut sinks: Vec<Box<dyn ArtifactPort>> =
        vec![Box::new(FileArtifactAdapter::new(&options.out_dir))];
    if let Some(path) = &options.sqlite_path {
        match sqlite_sink(path) {
            Ok(sink) => sinks.push(sink),
            Err(e) => return fail(&e),
        }
    }
    let sink_refs: Vec<&dyn ArtifactPort> = sinks.iter().map(|s| s.as_ref()).collect();

    // Stage 3: Screen
    match execute_run(options, &export, &NeutralNewsProbe, &sink_refs) {
        Ok(report) => {
            if report.summary.outcome == RunOutcome::NoQualifiers {
                tracing::warn!("no symbols qualified");
            } else {
                tracing::info!(symbols = ?report.output.selection.symbols(), "watchlist ready");
            }
            report.exit_code()
        }
        Err(e) => fail(&e),
    }
}

fn fail(err: &PremarketError) -> ExitCode {
    tracing::error!("{err}");
    ExitCode::from(err)
}

/// Acquire, screen, and write artifacts through the given ports.
pub fn execute_run(
    options: &RunOptions,
    export: &dyn ExportPort,
    news: &dyn NewsPort,
    sinks: &[&dyn ArtifactPort],
) -> Result<RunReport, PremarketError> {
    let run_date = options.run_date;
    tracing::info!(%run_date, config = %options.config_path.display(), "starting run");

    // Stage 1: Load and validate strategy
    let strategy = load_strategy(&options.config_path, options.top_n, options.news)?;

    // Stage 2: Acquire export
    let started = Instant::now();
    let acquired = export.acquire(run_date, options.use_cache)?;
    let acquire_elapsed = started.elapsed();

    // Stage 3: Read export
    let started = Instant::now();
    let raw_rows = csv_adapter::read_export(&acquired.path)?;
    let read_elapsed = started.elapsed();
    tracing::info!(path = %acquired.path.display(), rows = raw_rows.len(), used_cache = acquired.used_cache, "export loaded");

    // Stage 4: Engine
    let output = pipeline::run_engine(&raw_rows, &strategy, run_date, news);

    // Stage 5: Summary
    let mut builder = output
        .summarize(RunSummaryBuilder::new(
            run_date,
            market_time::now_in(options.timezone).to_rfc3339(),
        ))
        .used_cached_export(acquired.used_cache)
        .timing("acquire", acquire_elapsed)
        .timing("read", read_elapsed);
    if acquired.used_cache {
        builder = builder.note(format!("export read from cache: {}", acquired.path.display()));
    }
    let summary = builder.build();

    // Stage 6: Artifacts
    for sink in sinks {
        sink.write_run(&output, &summary)?;
    }

    Ok(RunReport { output, summary })
}

fn run_validate(config_path: &Path) -> ExitCode {
    match load_strategy(config_path, None, None) {
        Ok(strategy) => {
            println!(
                "{}: OK ({} filters, {} weighted features, top_n = {}, max_per_sector = {})",
                config_path.display(),
                strategy.rules.len(),
                strategy.weights.len(),
                strategy.top_n,
                strategy.max_per_sector
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}
