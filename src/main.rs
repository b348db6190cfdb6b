//! Profile Quality - data completeness auditor for profile APIs
//!
//! A CLI tool that pages through a remote profile service, measures how
//! complete each profile field is per role, and writes a static report.
//!
//! Exit codes:
//!   0 - Success, including runs where the service returned no data
//!   1 - Runtime error (invalid arguments, config, report write failure)

mod analysis;
mod cli;
mod config;
mod fetch;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Local;
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use fetch::{FetchOutcome, Fetcher, StopReason};
use models::{Report, ReportMetadata};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Profile Quality v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_audit(args).await {
        error!("Audit failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .profile-quality.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Set [source] endpoint and token, then adjust fields as needed.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over the verbosity flags when set.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(args.log_level().into()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run fetch, analysis and report generation.
async fn run_audit(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    println!("{}", "=".repeat(60));
    println!("🎯 PROFILE DATA QUALITY ANALYZER");
    println!("{}", "=".repeat(60));

    // Step 1: Fetch
    println!("\n🔄 Fetching data from {}", config.source.endpoint);
    let fetcher = Fetcher::new(config.fetch_config(!args.quiet))?;
    let outcome = fetcher.fetch_all().await;
    print_fetch_outcome(&outcome);

    if outcome.records.is_empty() {
        println!("\n❌ No data to analyze. Exiting.");
        return Ok(());
    }

    // Step 2: Analyze
    println!("\n📊 Analyzing data quality...");
    let settings = config.analysis_settings();
    let analysis = analysis::analyze(&outcome.records, &settings);
    debug!(
        "{} categories cover {} records",
        analysis.categories.len(),
        analysis.total_records()
    );

    // Step 3: Render and save
    println!("\n📝 Generating {:?} report...", args.format);
    let report = Report {
        metadata: ReportMetadata {
            title: config.report.title.clone(),
            endpoint: config.source.endpoint.clone(),
            generated_at: Local::now(),
            total_records: outcome.records.len(),
            pages_fetched: outcome.pages_fetched,
            partial_cause: outcome.failure().map(|e| e.to_string()),
        },
        analysis,
    };

    let path = report::write_report(&report, &config.report.output_dir, args.format)?;

    println!("\n✅ Report generated successfully: {}", path.display());
    println!("\n📈 Summary:");
    println!("   • Total Profiles: {}", report.metadata.total_records);
    println!("   • Unique Roles: {}", report.analysis.categories.len());
    println!(
        "   • Average Quality Score: {:.1}%",
        report.analysis.average_quality()
    );
    if let Some(ref cause) = report.metadata.partial_cause {
        println!("   • ⚠️  Based on partial data: {}", cause);
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

/// Report how pagination ended.
fn print_fetch_outcome(outcome: &FetchOutcome) {
    match &outcome.stop {
        StopReason::Failed(e) => {
            println!("❌ Error fetching data: {}", e);
            println!(
                "   Continuing with {} records from {} pages",
                outcome.records.len(),
                outcome.pages_fetched
            );
        }
        StopReason::PageCeiling => {
            println!(
                "⚠️  Stopped at the page limit after {} pages",
                outcome.pages_fetched
            );
        }
        StopReason::EndOfData => {}
    }
    println!("✅ Fetched {} profiles", outcome.records.len());
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
