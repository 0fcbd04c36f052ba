//! Bulk reconciliation: create a database page for every GitHub issue that
//! has no page yet.

use anyhow::anyhow;
use futures::future::join_all;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::SyncError;
use crate::github::IssueSource;
use crate::model::{Issue, RepoName};
use crate::notion::PageStore;
use crate::pagination::collect_paginated;
use crate::placement::resolve_project_placement;
use crate::properties::{self, ID_PROPERTY};

/// Reconcile the whole repository against the database.
///
/// Fetches every database page and every issue (both fully paginated),
/// diffs on the issue `id` held in the numeric "ID" property, and creates
/// a page for each missing issue as one unordered concurrent batch. Bulk
/// creation writes properties only — no body children.
///
/// Returns the issues for which a page was created. Re-running after a
/// successful run creates nothing.
pub async fn sync_all(
    source: &dyn IssueSource,
    store: &dyn PageStore,
    repo: &RepoName,
) -> Result<Vec<Issue>, SyncError> {
    info!("Checking for issues already in the database...");
    let pages =
        collect_paginated(|cursor| async move { store.query_pages(cursor.as_deref()).await })
            .await?;
    // Pages without a usable numeric ID are skipped, not errors.
    let known_ids: HashSet<i64> = pages
        .iter()
        .filter_map(|page| page.number_property(ID_PROPERTY))
        .collect();

    info!("Finding GitHub issues...");
    let records =
        collect_paginated(|cursor| async move { source.list_issues(repo, cursor.as_deref()).await })
            .await?;

    let missing: Vec<Issue> = records
        .into_iter()
        .filter(|record| !record.is_pull_request())
        .filter(|issue| !known_ids.contains(&issue.id))
        .collect();
    info!(
        known = known_ids.len(),
        missing = missing.len(),
        "computed missing issue set"
    );

    let results = join_all(
        missing
            .iter()
            .map(|issue| create_issue_page(source, store, repo, issue)),
    )
    .await;

    let total = missing.len();
    let mut created = Vec::new();
    let mut failures = 0usize;
    for (issue, result) in missing.into_iter().zip(results) {
        match result {
            Ok(page_id) => {
                info!(issue = issue.number, page_id = %page_id, "created page");
                created.push(issue);
            }
            Err(err) => {
                warn!(issue = issue.number, error = ?err, "failed to create page");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(SyncError::Remote(anyhow!(
            "{failures} of {total} page creations failed"
        )));
    }
    Ok(created)
}

async fn create_issue_page(
    source: &dyn IssueSource,
    store: &dyn PageStore,
    repo: &RepoName,
    issue: &Issue,
) -> anyhow::Result<String> {
    let placement = resolve_project_placement(source, repo, issue.number).await?;
    let props = properties::issue_properties(issue, placement.as_ref())?;
    store.create_page(props, None).await
}
