use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use gh_notion_sync::config;
use gh_notion_sync::github::GithubClient;
use gh_notion_sync::model::RepoName;
use gh_notion_sync::notion::NotionClient;
use gh_notion_sync::sync;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Create a Notion page for every GitHub issue missing from the database, then exit"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Repository to reconcile, as owner/name
    #[arg(long)]
    repo: String,
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
    let repo = RepoName::parse(&args.repo)?;

    let github = GithubClient::new(cfg.github.token.clone());
    let notion = NotionClient::new(
        cfg.notion.token.clone(),
        cfg.notion.version.clone(),
        cfg.notion.database_id.clone(),
    );

    info!(repo = %repo, "Starting bulk reconciliation");
    let created = sync::sync_all(&github, &notion, &repo).await?;
    for issue in &created {
        info!(issue = issue.number, title = %issue.title, "created");
    }
    info!(created = created.len(), "Bulk reconciliation complete");
    Ok(())
}
