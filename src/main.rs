//! postsweep - main entry point
//!
//! Loads the maintenance config and runs the requested command against the
//! JSON content store. The store writes itself back only when a command
//! changed something, before any result is cached or mailed.

use anyhow::{Context, Result};
use chrono::Utc;
use std::io::Read;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use postsweep::auth::EDIT_POSTS;
use postsweep::cli::{Cli, Commands};
use postsweep::{
    CapabilityPolicy, DispositionRule, FileResultCache, FilterCriteria, LogNotifier,
    MaintenanceConfig, MemoryStore, Notifier, Principal, ResultCache, ScanOrchestrator, ScanRun,
    SpoolNotifier, StampQuery, TriggeredBy, handle_scan_request, stamp_last_scan,
};

/// Initialize tracing; RUST_LOG overrides the default `info` level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Main application entry point
fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match cli.command {
        Commands::Validate { config } => validate_config(&config),
        Commands::Scan {
            post_type,
            category,
            age_threshold,
            engagement_threshold,
            rule,
        } => {
            let config = load_config(&cli.config)?;
            let defaults = &config.schedule.criteria;
            let criteria = FilterCriteria {
                content_types: post_type,
                category_ids: category,
                age_threshold_days: age_threshold.unwrap_or(defaults.age_threshold_days),
                engagement_threshold: engagement_threshold
                    .unwrap_or(defaults.engagement_threshold),
            };
            let rule = rule.unwrap_or(config.schedule.rule);
            run_scan(&config, &criteria, rule, TriggeredBy::Manual, cli.dry_run)
        }
        Commands::Scheduled => {
            let config = load_config(&cli.config)?;
            info!("Running scheduled maintenance scan");
            run_scan(
                &config,
                &config.schedule.criteria,
                config.schedule.rule,
                TriggeredBy::Scheduled,
                cli.dry_run,
            )
        }
        Commands::Request { input } => {
            let config = load_config(&cli.config)?;
            run_request(&config, &input, cli.dry_run)
        }
        Commands::Stamp {
            post_type,
            start_date,
            end_date,
            post_ids,
            verbose,
        } => {
            let config = load_config(&cli.config)?;
            let query = StampQuery {
                content_types: post_type,
                start_date,
                end_date,
                ids: (!post_ids.is_empty()).then_some(post_ids),
            };
            run_stamp(&config, &query, verbose, cli.dry_run)
        }
        Commands::LastResult => {
            let config = load_config(&cli.config)?;
            show_last_result(&config)
        }
    }
}

/// Load and validate the config, falling back to defaults if the file is missing
fn load_config(path: &Path) -> Result<MaintenanceConfig> {
    let config = if path.exists() {
        info!("Loading configuration from {:?}", path);
        MaintenanceConfig::load_from_file(path)?
    } else {
        warn!("Configuration file {:?} not found, using defaults", path);
        MaintenanceConfig::default()
    };
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {:?}", path))?;
    Ok(config)
}

fn validate_config(path: &Path) -> Result<()> {
    info!("Validating configuration file: {:?}", path);
    match MaintenanceConfig::load_from_file(path) {
        Ok(config) => match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration file is valid: {:?}", path);
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to load configuration file: {:#}", e);
            eprintln!("✗ Failed to load configuration file: {:#}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn build_orchestrator(
    config: &MaintenanceConfig,
    rule: DispositionRule,
    dry_run: bool,
) -> Result<ScanOrchestrator<MemoryStore>> {
    let store = MemoryStore::load_from_file(&config.store_path)?.persist_to(&config.store_path);
    let notifier: Box<dyn Notifier> = match &config.notify_spool {
        Some(path) => Box::new(SpoolNotifier::new(path)),
        None => Box::new(LogNotifier),
    };

    Ok(
        ScanOrchestrator::new(store, notifier, FileResultCache::new(&config.cache_path))
            .with_rule(rule)
            .with_cache_ttl(config.cache_ttl())
            .with_admin_email(&config.admin_email)
            .with_dry_run(dry_run),
    )
}

fn run_scan(
    config: &MaintenanceConfig,
    criteria: &FilterCriteria,
    rule: DispositionRule,
    triggered_by: TriggeredBy,
    dry_run: bool,
) -> Result<()> {
    let mut orchestrator = build_orchestrator(config, rule, dry_run)?;

    let run = match orchestrator.run_scan(criteria, triggered_by) {
        Ok(run) => run,
        Err(e) => {
            eprintln!("✗ Scan failed: {}", e);
            std::process::exit(1);
        }
    };
    print_run(&run);
    Ok(())
}

fn print_run(run: &ScanRun) {
    if run.dry_run {
        println!(
            "Dry run: {} item(s) would be {}d: {:?}",
            run.matched_ids.len(),
            run.rule,
            run.matched_ids
        );
        return;
    }

    println!(
        "Scanned: {} archived, {} deleted, {} failed",
        run.result.archived_ids.len(),
        run.result.deleted_ids.len(),
        run.result.failed_ids.len()
    );
    if !run.result.archived_ids.is_empty() {
        println!("  archived: {:?}", run.result.archived_ids);
    }
    if !run.result.deleted_ids.is_empty() {
        println!("  deleted:  {:?}", run.result.deleted_ids);
    }
    if !run.result.failed_ids.is_empty() {
        println!("  failed:   {:?}", run.result.failed_ids);
    }
}

/// Feed a JSON body through the invocation handler as a local administrator
fn run_request(config: &MaintenanceConfig, input: &str, dry_run: bool) -> Result<()> {
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read request from {:?}", input))?
    };
    let body: serde_json::Value =
        serde_json::from_str(&raw).context("Failed to parse request JSON")?;

    let mut orchestrator = build_orchestrator(config, config.schedule.rule, dry_run)?;
    let response = handle_scan_request(
        &mut orchestrator,
        &CapabilityPolicy::default(),
        &Principal::user([EDIT_POSTS]),
        &body,
    );

    println!("{}", serde_json::to_string_pretty(&response.body)?);

    if response.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

fn run_stamp(
    config: &MaintenanceConfig,
    query: &StampQuery,
    verbose: bool,
    dry_run: bool,
) -> Result<()> {
    let mut store =
        MemoryStore::load_from_file(&config.store_path)?.persist_to(&config.store_path);
    let report = stamp_last_scan(&mut store, query, Utc::now(), dry_run)
        .context("Failed to stamp scanned content")?;

    if verbose {
        for id in &report.scanned_ids {
            let title = store.get(*id).map(|item| item.title.as_str()).unwrap_or("");
            println!("Scanning post ID {}: {}", id, title);
        }
    }

    if report.dry_run {
        println!("Dry run: {} post(s) would be stamped", report.scanned_ids.len());
    } else {
        println!("✓ Last scan date updated for {} post(s)", report.updated);
    }
    Ok(())
}

fn show_last_result(config: &MaintenanceConfig) -> Result<()> {
    let cache = FileResultCache::new(&config.cache_path);
    match cache.latest(Utc::now())? {
        Some(entry) => {
            println!(
                "Last maintenance ({}, {}): {} posts archived, {} posts deleted",
                entry.triggered_by,
                entry.stored_at.format("%Y-%m-%d %H:%M UTC"),
                entry.result.archived_ids.len(),
                entry.result.deleted_ids.len()
            );
            println!("{}", serde_json::to_string_pretty(&entry.result)?);
        }
        None => println!("No recent maintenance"),
    }
    Ok(())
}
