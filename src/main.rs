//! WardWatch - election-day ward monitoring rollups
//!
//! A CLI tool that reads raw ward records from a snapshot export and
//! derives ward, area council and dashboard monitoring views.
//!
//! Exit codes:
//!   0 - Success (no council at or above --fail-on-risk, or no threshold set)
//!   1 - Runtime error (config, malformed snapshot, unknown id, deadline, etc.)
//!   2 - A council (or ward, for ward views) reached the --fail-on-risk threshold

mod analysis;
mod cli;
mod config;
mod models;
mod provider;
mod report;
mod service;

use analysis::WardOptions;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat, ViewKind};
use config::{Config, CONFIG_FILE};
use models::RiskLevel;
use provider::SnapshotProvider;
use report::{ReportMetadata, View};
use service::{MonitoringService, RequestContext, ServiceOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so [general] verbose can raise the level
    let (mut config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("WardWatch v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Request failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .wardwatch.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set the snapshot path, concurrency, deadline, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so stdout carries only the report.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Produce the requested view and write it out. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();
    debug!("Effective config: {:?}", config);

    let Some(snapshot) = config.source.snapshot.clone() else {
        bail!("No snapshot given. Pass --snapshot or set [source] snapshot in {}", CONFIG_FILE);
    };
    let format = OutputFormat::from_name(&config.report.format)
        .with_context(|| format!("Unknown report format in config: {}", config.report.format))?;

    let provider = SnapshotProvider::load(&PathBuf::from(&snapshot))?;
    info!("Loaded snapshot: {}", snapshot);

    let options = ServiceOptions {
        concurrency: config.general.concurrency.max(1),
        ward: WardOptions {
            assess_risk: config.analysis.ward_risk,
        },
    };
    let service = MonitoringService::new(Arc::new(provider), options);

    let mut ctx = RequestContext::new();
    if config.source.timeout_seconds > 0 {
        ctx = ctx.with_timeout(Duration::from_secs(config.source.timeout_seconds));
    }
    let (ctx, cancel) = ctx.cancellable();

    // Ctrl-C abandons the request instead of killing the process mid-write
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling request");
            cancel.cancel();
        }
    });

    let view = build_view(&service, &ctx, &args).await?;

    let output = match format {
        OutputFormat::Json => report::generate_json_report(&view)?,
        OutputFormat::Markdown => {
            let metadata = ReportMetadata {
                source: snapshot.clone(),
                generated_at: Utc::now(),
                include_wards: config.report.include_wards,
            };
            report::generate_markdown_report(&view, &metadata)
        }
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("✅ Report saved to: {}", path.display());
        }
        None => println!("{}", output),
    }

    info!("Done in {:.1}ms", start_time.elapsed().as_secs_f64() * 1000.0);

    // Check --fail-on-risk threshold
    if let Some(threshold) = args.fail_on_risk {
        let threshold = RiskLevel::from(threshold);
        if view.max_risk().is_some_and(|risk| risk >= threshold) {
            eprintln!(
                "\n⛔ Risk at or above {} found. Failing (exit code 2).",
                threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Dispatch the selected view to the service.
async fn build_view(
    service: &MonitoringService<SnapshotProvider>,
    ctx: &RequestContext,
    args: &Args,
) -> Result<View> {
    let view = match args.view {
        ViewKind::Dashboard => View::Dashboard(service.dashboard(ctx).await?),
        ViewKind::Councils => View::Councils(service.council_summaries(ctx).await?),
        ViewKind::Council => {
            let id = args.council.as_deref().context("--council is required")?;
            View::Council(service.council_detail(ctx, id).await?)
        }
        ViewKind::Wards => {
            let id = args.council.as_deref().context("--council is required")?;
            View::Wards(service.ward_summaries(ctx, id).await?)
        }
        ViewKind::Ward => {
            let id = args.ward.as_deref().context("--ward is required")?;
            View::Ward(service.ward_detail(ctx, id).await?)
        }
    };
    Ok(view)
}

/// Load configuration from file or use defaults.
///
/// Returns the path the configuration came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    Ok(match Config::load_default()? {
        Some(config) => (config, Some(PathBuf::from(CONFIG_FILE))),
        None => (Config::default(), None),
    })
}
