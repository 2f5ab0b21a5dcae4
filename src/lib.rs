pub mod api;
pub mod collector;
pub mod config;
pub mod db;
pub mod entities;
pub mod services;
pub mod state;

use std::path::Path;
use tokio::signal;

use collector::{CollectorSession, IngestClient, PageRequest, ReplayTransport, Transport};
pub use config::Config;
use state::SharedState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "serve" | "daemon" | "-d" | "--daemon" => run_serve(config).await,

        "extract" | "x" => {
            if args.len() < 3 {
                println!("Usage: trendarr extract <payload.json>");
                return Ok(());
            }
            cmd_extract(&config, &args[2])
        }

        "collect" | "c" => {
            if args.len() < 3 {
                println!("Usage: trendarr collect <payload.json> [more files...]");
                return Ok(());
            }
            cmd_collect(&config, &args[2..]).await
        }

        "stats" => cmd_stats(&config).await,

        "init" => {
            let created = Config::create_default_if_missing()?;
            if created {
                println!("Created default config.toml");
            } else {
                println!("config.toml already exists");
            }
            Ok(())
        }

        "help" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        other => {
            println!("Unknown command: {other}");
            print_help();
            Ok(())
        }
    }
}

async fn run_serve(config: Config) -> anyhow::Result<()> {
    info!(
        "Trendarr v{} starting in server mode...",
        env!("CARGO_PKG_VERSION")
    );

    let port = config.server.port;
    let state = api::create_app_state_from_config(config).await?;
    let app = api::router(state).await;

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("Keyword API running at http://0.0.0.0:{}", port);
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {}", e);
        }
    });

    info!("Server running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }

    server_handle.abort();
    info!("Server stopped");

    Ok(())
}

/// Parse a saved payload file and print the terms that would be staged,
/// without touching the staging cache or the service.
fn cmd_extract(config: &Config, path: &str) -> anyhow::Result<()> {
    let body = std::fs::read_to_string(path)?;
    let terms = collector::extract::extract_terms(&body, &config.extraction.rules())?;

    if terms.is_empty() {
        println!("No significant terms in {path}");
        return Ok(());
    }

    println!("{} significant terms:", terms.len());
    for term in terms {
        let marker = if term.is_breakout { " [breakout]" } else { "" };
        println!("  {:<40} {:>10.1}{}", term.text, term.score, marker);
    }
    Ok(())
}

/// Run saved payload files through the full pipeline: intercept, extract,
/// stage, then submit everything to the configured keyword service.
async fn cmd_collect(config: &Config, paths: &[String]) -> anyhow::Result<()> {
    let session = CollectorSession::start(config.extraction.rules());
    let staging = session.staging().clone();
    let monitored = &config.collector.monitored_endpoint;

    for path in paths {
        let path = Path::new(path);
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid payload path: {}", path.display()))?;

        let tap = session.tap(ReplayTransport::new(parent), monitored);
        let url = format!("https://replay.local{monitored}/{name}");
        tap.send(&PageRequest::get(&url)).await?;
    }

    // Waits for the parse worker to drain every queued capture.
    session.close().await;

    println!("{} terms staged", staging.size());
    if staging.size() == 0 {
        return Ok(());
    }

    let client = IngestClient::new(&config.collector.api_base_url)?;
    let report = staging.commit(&client).await;
    println!(
        "Submitted {}/{} terms to {} ({} failed)",
        report.succeeded, report.attempted, config.collector.api_base_url, report.failed
    );
    Ok(())
}

async fn cmd_stats(config: &Config) -> anyhow::Result<()> {
    let shared = SharedState::new(config.clone()).await?;
    let stats = shared.store.keyword_stats().await?;

    println!("Keywords: {} total", stats.total);
    println!("  used:    {}", stats.used);
    println!("  unused:  {}", stats.unused);
    println!("  ignored: {}", stats.ignored);
    Ok(())
}

fn print_help() {
    println!("Trendarr - Trending Keyword Collector");
    println!("Captures trend payloads and serves a deduplicated keyword store");
    println!();
    println!("USAGE:");
    println!("  trendarr <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("  serve, daemon      Run the keyword ingestion and query service");
    println!("  extract <file>     Parse a saved payload and print significant terms");
    println!("  collect <files>    Stage saved payloads and submit them to the service");
    println!("  stats              Show keyword store counts");
    println!("  init               Create default config file");
    println!("  help               Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("  trendarr serve                    # Start the API on the configured port");
    println!("  trendarr extract payload.json     # Dry-run extraction");
    println!("  trendarr collect a.json b.json    # Extract, stage and submit");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to set the database path, port and extraction rules.");
}
