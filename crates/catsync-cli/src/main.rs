use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use catsync_cli::{Command, Config, SyncArgs};
use catsync_client::{CatalogApiClient, ElasticsearchClient};
use catsync_core::traits::{SearchHit, SearchIndex};
use catsync_core::{AppError, BatchSyncSummary, DbConfig, RunReport, SyncService, TracingReporter};
use catsync_db::IdentifierRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let config = Config::parse();

    let result = match &config.command {
        Command::Sync(args) => run_sync(&config, args).await,
        Command::Search { query, limit } => run_search(&config, query, *limit).await,
    };

    if let Err(e) = &result {
        if let Some(app_err) = e.downcast_ref::<AppError>() {
            error!("{}", app_err.user_message());
        }
    }
    result
}

async fn run_sync(config: &Config, args: &SyncArgs) -> anyhow::Result<()> {
    let http_config = args.http_config();
    let index = ElasticsearchClient::with_http_config(config.index_settings(), &http_config)?;
    let catalog = CatalogApiClient::new(&config.api_url, &config.key, &http_config)?;

    info!("Connecting to catalog database...");
    let pool = catsync_db::connect(&config.db_settings(), &DbConfig::default())
        .await
        .context("Failed to connect to database")?;
    let repo = IdentifierRepository::new(pool);

    let service = SyncService::with_config(repo, catalog, index.clone(), args.sync_config());
    info!(
        window_size = service.config().window_size,
        policy = %service.config().write_policy,
        index = index.index_name(),
        "Starting sync"
    );

    let shutdown_token = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown_token.clone()));

    let summary = service
        .sync_all(&args.kinds(), &TracingReporter, shutdown_token.clone())
        .await;

    print_batch_summary(&summary);

    if summary.is_cancelled() || shutdown_token.is_cancelled() {
        warn!("Sync interrupted, skipping smoke search");
    } else if !args.smoke_query.is_empty() {
        // The smoke search only reports; its failure does not fail the run.
        if let Err(e) = search(&index, &args.smoke_query, 10).await {
            warn!(error = %e, "Smoke search failed");
        }
    }

    if summary.failed_kinds() > 0 {
        anyhow::bail!(
            "{} of {} entity types could not be synced",
            summary.failed_kinds(),
            summary.results.len()
        );
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM) and cancel the token.
///
/// The pipeline stops between windows; the current window completes.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, finishing the current window...");
    shutdown_token.cancel();
}

/// Print a summary of all synced entity kinds.
fn print_batch_summary(summary: &BatchSyncSummary) {
    for result in &summary.results {
        match &result.report {
            Some(report) => print_run_summary(report),
            None => {
                if let Some(err) = &result.error {
                    error!("Could not sync {}: {}", result.kind, err);
                }
            }
        }
    }

    info!("");
    info!("═══════════════════════════════════════════════════════");
    info!("SYNC COMPLETE");
    info!("═══════════════════════════════════════════════════════");
    info!("  Entity types:        {}", summary.results.len());
    info!("  Failed types:        {}", summary.failed_kinds());
    info!("  Total processed:     {}", summary.total_items());
    info!("  Successful:          {}", summary.total_successful());
    info!("  Failed:              {}", summary.total_failed());
    info!("═══════════════════════════════════════════════════════");
}

/// Print the report for one entity kind.
fn print_run_summary(report: &RunReport) {
    info!("");
    info!("═══════════════════════════════════════════════════════");
    info!("{} sync {}", report.kind, report.status.as_str());
    info!("═══════════════════════════════════════════════════════");
    info!("  ↑ Updated:           {}", report.updated);
    info!("  + Inserted:          {}", report.inserted);
    info!("  ✗ Failed:            {}", report.failed);
    info!("  - Skipped:           {}", report.skipped);
    info!("───────────────────────────────────────────────────────");
    info!("  Successful:          {}", report.successful);

    if report.errors.is_empty() {
        if !report.is_cancelled() {
            info!("All {} records processed successfully!", report.kind);
        }
        return;
    }

    info!("───────────────────────────────────────────────────────");
    info!("Errors:");
    for item in &report.errors {
        error!("  - {} {}: {}", report.kind, item.id, item.message);
    }
}

async fn run_search(config: &Config, query: &str, limit: usize) -> anyhow::Result<()> {
    let index = ElasticsearchClient::new(config.index_settings())?;
    search(&index, query, limit).await
}

async fn search<X: SearchIndex>(index: &X, query: &str, limit: usize) -> anyhow::Result<()> {
    info!("Searching for: '{}' (limit: {})", query, limit);

    let hits = index.search(query, limit).await?;

    if hits.is_empty() {
        println!("\nNo results found for: \"{}\"\n", query);
        return Ok(());
    }

    println!("\nSearch results for: \"{}\"\n", query);
    for (i, hit) in hits.iter().enumerate() {
        println!("{}", format_hit(i + 1, hit));
    }
    println!();

    Ok(())
}

/// One result line: position, type, id, score and a short title.
fn format_hit(position: usize, hit: &SearchHit) -> String {
    let doc_type = hit.doc_type.as_deref().unwrap_or("-");
    let score = hit
        .score
        .map(|s| format!("{:.2}", s))
        .unwrap_or_else(|| "-".to_string());
    let title = hit_title(hit)
        .map(|t| truncate_text(t, 80))
        .unwrap_or_default();
    format!("{}. [{} {}] ({}) {}", position, doc_type, hit.id, score, title)
        .trim_end()
        .to_string()
}

fn hit_title(hit: &SearchHit) -> Option<&str> {
    ["ShortDesc", "Title"].iter().find_map(|key| {
        hit.source
            .get(*key)
            .and_then(|v| v.as_str())
            .filter(|t| !t.is_empty())
    })
}

fn truncate_text(text: &str, max_len: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.chars().count() <= max_len {
        cleaned
    } else {
        // Safely truncate text by characters to handle multi-byte UTF-8
        let truncated: String = cleaned.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}
