//! FearGreed CLI — run the crypto sentiment ELT pipeline.
//!
//! Commands:
//! - `run`: extract-load, then create the external tables and run dbt
//! - `extract-load`: only pull news sentiment and market data into the bucket
//! - `transform`: only create the external tables and run dbt
//! - `tokens`: build the token catalog and print it, without uploading

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use feargreed_core::data::{
    AlphaVantage, CoinGecko, Fetch, HttpFetcher, TokenCatalog, TokenSource,
};
use feargreed_core::warehouse::DbtCommand;
use feargreed_core::RunContext;
use feargreed_runner::{
    log_health, run_id, transform_data, ArtifactSink, BatchSummary, BlockRegistry,
    ExtractLoadReport, JsonArtifactDir, LogArtifacts, OnFailure, Pipeline, PipelineConfig,
    SystemClock, TableTarget, UnitStatus,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "feargreed=info";

#[derive(Parser)]
#[command(
    name = "feargreed",
    version,
    about = "FearGreed CLI — crypto news sentiment and market data ELT"
)]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract-load, then provision tables and run the SQL build.
    Run(PipelineArgs),
    /// Pull news sentiment and market data into the bucket.
    ExtractLoad(PipelineArgs),
    /// Create the external tables and run the SQL build.
    Transform(PipelineArgs),
    /// Build the token catalog and print it.
    Tokens(PipelineArgs),
}

#[derive(Args)]
struct PipelineArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// First day to extract (YYYY-MM-DD or YYYYMMDD). Defaults to yesterday (UTC).
    #[arg(long)]
    start: Option<String>,

    /// Day to stop at, exclusive. Defaults to today (UTC).
    #[arg(long)]
    end: Option<String>,

    /// Named bucket and warehouse block.
    #[arg(long)]
    block: Option<String>,

    /// Warehouse dataset for the external tables.
    #[arg(long)]
    dataset: Option<String>,

    /// Bucket the external tables read from.
    #[arg(long)]
    bucket: Option<String>,

    /// Alpha Vantage API key. Falls back to ALPHA_VANTAGE_API_KEY.
    #[arg(long)]
    av_api_key: Option<String>,

    /// What a loop does when a day or token fails.
    #[arg(long, value_enum)]
    on_failure: Option<FailureArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FailureArg {
    /// Record the failure and move on.
    Continue,
    /// Stop the loop at the first failure.
    Abort,
}

impl From<FailureArg> for OnFailure {
    fn from(arg: FailureArg) -> Self {
        match arg {
            FailureArg::Continue => OnFailure::Continue,
            FailureArg::Abort => OnFailure::Abort,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Full,
    ExtractLoad,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Run(args) => run_pipeline(&args, Mode::Full),
        Commands::ExtractLoad(args) => run_pipeline(&args, Mode::ExtractLoad),
        Commands::Transform(args) => run_transform(&args),
        Commands::Tokens(args) => run_tokens(&args),
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .init(),
    }
}

/// Load the config file (if any) and apply flag overrides.
fn load_config(args: &PipelineArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(start) = &args.start {
        config.start_date = Some(start.clone());
    }
    if let Some(end) = &args.end {
        config.end_date = Some(end.clone());
    }
    if let Some(block) = &args.block {
        config.block_name = block.clone();
    }
    if let Some(dataset) = &args.dataset {
        config.dataset_name = dataset.clone();
    }
    if let Some(bucket) = &args.bucket {
        config.bucket_name = bucket.clone();
    }
    if let Some(key) = &args.av_api_key {
        config.av_api_key = Some(key.clone());
    }
    if let Some(policy) = args.on_failure {
        config.on_failure = policy.into();
    }
    Ok(config)
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn dbt_command(config: &PipelineConfig) -> DbtCommand {
    DbtCommand::new(
        config.dbt.command.clone(),
        &config.dbt.project_dir,
        &config.dbt.profiles_dir,
    )
}

fn run_pipeline(args: &PipelineArgs, mode: Mode) -> Result<()> {
    let config = load_config(args)?;
    let (start, end) = config.date_range(Utc::now().date_naive())?;
    let api_key = config.api_key(env_var)?;

    let fetch: Arc<dyn Fetch> = Arc::new(HttpFetcher::with_default_timeout()?);
    let alpha_vantage =
        AlphaVantage::new(fetch.clone(), api_key).with_topic(config.topic.to_topic());
    let coingecko = CoinGecko::new(fetch);
    let catalog = TokenCatalog::new(&coingecko, &alpha_vantage);

    let registry = BlockRegistry::new(config.blocks.clone());
    let bucket = registry.bucket(&config.block_name)?;
    let warehouse = registry.warehouse(&config.block_name)?;
    let dbt = dbt_command(&config);
    let artifacts: Box<dyn ArtifactSink> = match &config.artifacts_dir {
        Some(dir) => Box::new(JsonArtifactDir::new(dir)),
        None => Box::new(LogArtifacts),
    };

    let ctx = RunContext::new(run_id(&config, start, end, Utc::now()));
    let pipeline = Pipeline {
        config: &config,
        sentiments: &alpha_vantage,
        tokens: &catalog,
        market: &coingecko,
        bucket: bucket.as_ref(),
        warehouse: warehouse.as_ref(),
        transform: &dbt,
        artifacts: artifacts.as_ref(),
        clock: Arc::new(SystemClock),
    };

    let report = match mode {
        Mode::Full => pipeline.run(&ctx, start, end)?,
        Mode::ExtractLoad => {
            log_health(&ctx);
            pipeline.extract_load(&ctx, start, end)
        }
    };
    print_report(ctx.run_id(), &report);
    Ok(())
}

fn run_transform(args: &PipelineArgs) -> Result<()> {
    let config = load_config(args)?;
    let registry = BlockRegistry::new(config.blocks.clone());
    let warehouse = registry.warehouse(&config.block_name)?;
    let dbt = dbt_command(&config);
    let target = TableTarget {
        dataset_name: config.dataset_name.clone(),
        bucket_name: config.bucket_name.clone(),
    };

    let today = Utc::now().date_naive();
    let ctx = RunContext::new(run_id(&config, today, today, Utc::now()));
    log_health(&ctx);
    transform_data(
        &ctx,
        warehouse.as_ref(),
        &dbt,
        &target,
        &config.retries.create_table,
        &SystemClock,
    )?;
    println!("Tables ready in {}; transform complete.", config.dataset_name);
    Ok(())
}

fn run_tokens(args: &PipelineArgs) -> Result<()> {
    let config = load_config(args)?;
    // The currency list endpoint does not need a key.
    let api_key = config.api_key(env_var).unwrap_or_default();

    let fetch: Arc<dyn Fetch> = Arc::new(HttpFetcher::with_default_timeout()?);
    let alpha_vantage = AlphaVantage::new(fetch.clone(), api_key);
    let coingecko = CoinGecko::new(fetch);
    let catalog = TokenCatalog::new(&coingecko, &alpha_vantage);

    let tokens = catalog.token_catalog(&RunContext::new("tokens"))?;
    println!("{:<28} {:<10} NAME", "COINGECKO ID", "SYMBOL");
    for token in &tokens {
        println!("{:<28} {:<10} {}", token.coingecko_id, token.symbol, token.name);
    }
    println!("{} tokens", tokens.len());
    Ok(())
}

fn print_report(run_id: &str, report: &ExtractLoadReport) {
    println!();
    println!("=== Run {run_id}: {} to {} ===", report.start, report.end);
    print_batch(&report.sentiments);
    print_batch(&report.market);
}

fn print_batch(summary: &BatchSummary) {
    println!(
        "{:<26} {} uploaded, {} failed",
        summary.flow,
        summary.succeeded(),
        summary.failed()
    );
    for report in &summary.reports {
        if let UnitStatus::Failed { error } = &report.status {
            eprintln!("  {}: {error}", report.unit);
        }
    }
    if let Some(reason) = &summary.aborted {
        eprintln!("  stopped early: {reason}");
    }
}
