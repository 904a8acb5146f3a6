use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use socmet_core::Platform;
use socmet_session::{ScrapeService, StreamHandle};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "socmet-cli")]
#[command(about = "Extract engagement metrics and comments from social media posts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one session and print the unified response as JSON.
    Scrape(Target),
    /// Run one session and print each event as a JSON line.
    Stream(Target),
}

#[derive(Debug, Args)]
struct Target {
    /// facebook, instagram, x (or twitter), tiktok or youtube.
    #[arg(long, short)]
    platform: Platform,
    /// Post or profile URL to extract from.
    url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = socmet_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let service = Arc::new(ScrapeService::from_config(&config)?);

    match cli.command {
        Commands::Scrape(target) => run_scrape(&service, target).await,
        Commands::Stream(target) => run_stream(&service, target).await,
    }
}

async fn run_scrape(service: &ScrapeService, target: Target) -> anyhow::Result<()> {
    let response = service
        .scrape(target.platform, &target.url)
        .await
        .with_context(|| format!("scraping {} failed", target.url))?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn run_stream(service: &Arc<ScrapeService>, target: Target) -> anyhow::Result<()> {
    let StreamHandle {
        mut events,
        cancel,
        task,
    } = service.spawn_stream(target.platform, target.url);

    let mut failed = false;
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let line = serde_json::json!({
                    "event": event.name(),
                    "data": serde_json::from_str::<serde_json::Value>(&event.payload_json()?)?,
                });
                println!("{line}");
                if event.is_terminal() {
                    failed = matches!(event, socmet_session::StreamEvent::Error(_));
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, cancelling session");
                cancel.cancel();
            }
        }
    }

    task.await.context("streaming session panicked")?;
    if failed {
        anyhow::bail!("streaming session ended with an error event");
    }
    Ok(())
}
