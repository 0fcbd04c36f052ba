//! Project placement lookup: which (project, column) a card representing
//! an issue currently occupies.

use anyhow::Result;
use tracing::debug;

use crate::github::IssueSource;
use crate::model::{ProjectPlacement, RepoName};
use crate::pagination::collect_paginated;

/// Scan the repository's classic projects for a card referencing the
/// issue. Returns the first matching (project, column) in enumeration
/// order; absence of a match is not an error.
///
/// Cost is O(projects × columns × cards) remote calls, each level
/// paginated. Accepted as a bounded, infrequent operation — it runs once
/// per issue write.
pub async fn resolve_project_placement(
    source: &dyn IssueSource,
    repo: &RepoName,
    issue_number: i64,
) -> Result<Option<ProjectPlacement>> {
    let projects =
        collect_paginated(|cursor| async move { source.list_projects(repo, cursor.as_deref()).await })
            .await?;
    debug!(count = projects.len(), "found projects");

    for project in &projects {
        let columns = collect_paginated(|cursor| async move {
            source.list_columns(project.id, cursor.as_deref()).await
        })
        .await?;

        for column in &columns {
            let cards = collect_paginated(|cursor| async move {
                source.list_cards(column.id, cursor.as_deref()).await
            })
            .await?;

            if cards
                .iter()
                .any(|card| card_issue_number(card.content_url.as_deref()) == Some(issue_number))
            {
                return Ok(Some(ProjectPlacement {
                    project: project.name.clone(),
                    column: column.name.clone(),
                }));
            }
        }
    }

    Ok(None)
}

/// Numeric suffix of a card's linked-content URL, after `/issues/`.
fn card_issue_number(content_url: Option<&str>) -> Option<i64> {
    content_url?.split("/issues/").nth(1)?.parse().ok()
}
