use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use gh_notion_sync::config;
use gh_notion_sync::events;
use gh_notion_sync::github::GithubClient;
use gh_notion_sync::model::EventPayload;
use gh_notion_sync::notion::NotionClient;

#[derive(Debug, Parser)]
#[command(author, version, about = "Mirror GitHub issue events into a Notion database")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Event name; falls back to the GITHUB_EVENT_NAME environment variable
    #[arg(long)]
    event_name: Option<String>,

    /// Path to the JSON event payload; falls back to GITHUB_EVENT_PATH
    #[arg(long)]
    event_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;

    let event_name = args
        .event_name
        .or_else(|| std::env::var("GITHUB_EVENT_NAME").ok())
        .context("event name not provided (--event-name or GITHUB_EVENT_NAME)")?;
    let event_path = args
        .event_path
        .or_else(|| std::env::var("GITHUB_EVENT_PATH").ok().map(PathBuf::from))
        .context("event payload not provided (--event-path or GITHUB_EVENT_PATH)")?;

    let raw = tokio::fs::read_to_string(&event_path)
        .await
        .with_context(|| format!("failed to read event payload {}", event_path.display()))?;
    let payload: EventPayload =
        serde_json::from_str(&raw).context("invalid event payload JSON")?;

    let github = GithubClient::new(cfg.github.token.clone());
    let notion = NotionClient::new(
        cfg.notion.token.clone(),
        cfg.notion.version.clone(),
        cfg.notion.database_id.clone(),
    );

    info!(event = %event_name, "Starting...");
    let outcome = events::run_event(&github, &notion, &event_name, &payload).await?;
    info!(?outcome, "Complete!");
    Ok(())
}
