//! Single-event reconciliation, driven by inbound lifecycle events.

use tracing::{info, warn};

use crate::error::{Outcome, SyncError};
use crate::github::IssueSource;
use crate::model::{EventPayload, Issue, RepoName};
use crate::notion::PageStore;
use crate::placement::resolve_project_placement;
use crate::properties::{self, PropertySet, Status, ID_PROPERTY, STATUS_PROPERTY};
use crate::reconcile::reconcile_blocks;
use crate::sync;

pub const ISSUES_EVENT: &str = "issues";
pub const PULL_REQUEST_EVENT: &str = "pull_request";
pub const MANUAL_SYNC_EVENT: &str = "workflow_dispatch";

/// Dispatch one inbound event by name. A payload without a repository
/// fails fast regardless of event kind.
pub async fn run_event(
    source: &dyn IssueSource,
    store: &dyn PageStore,
    event_name: &str,
    payload: &EventPayload,
) -> Result<Outcome, SyncError> {
    let repo = repo_from_payload(payload)?;
    match event_name {
        ISSUES_EVENT => handle_issue_event(source, store, &repo, payload).await,
        PULL_REQUEST_EVENT => handle_pull_request_event(source, store, &repo, payload).await,
        MANUAL_SYNC_EVENT => {
            sync::sync_all(source, store, &repo).await?;
            Ok(Outcome::Applied)
        }
        other => {
            info!(event = other, "ignoring unsupported event");
            Ok(Outcome::Skipped)
        }
    }
}

fn repo_from_payload(payload: &EventPayload) -> Result<RepoName, SyncError> {
    let full_name = payload
        .repository
        .as_ref()
        .map(|r| r.full_name.as_str())
        .ok_or(SyncError::MissingRepository)?;
    RepoName::parse(full_name)
}

/// `opened` creates a page; every other issue action is treated uniformly
/// as an edit.
async fn handle_issue_event(
    source: &dyn IssueSource,
    store: &dyn PageStore,
    repo: &RepoName,
    payload: &EventPayload,
) -> Result<Outcome, SyncError> {
    let issue = payload
        .issue
        .as_ref()
        .ok_or(SyncError::MissingPayloadField("issue"))?;
    match payload.action.as_deref() {
        Some("opened") => issue_opened(source, store, repo, issue).await,
        _ => issue_edited(source, store, repo, issue).await,
    }
}

async fn issue_opened(
    source: &dyn IssueSource,
    store: &dyn PageStore,
    repo: &RepoName,
    issue: &Issue,
) -> Result<Outcome, SyncError> {
    info!(issue = issue.number, "Creating page for issue");

    let placement = resolve_project_placement(source, repo, issue.number).await?;
    let props = properties::issue_properties(issue, placement.as_ref())?;
    let children = properties::render_body_blocks(issue);
    let page_id = store.create_page(props, Some(children)).await?;

    info!(issue = issue.number, page_id = %page_id, "created page");
    Ok(Outcome::Applied)
}

async fn issue_edited(
    source: &dyn IssueSource,
    store: &dyn PageStore,
    repo: &RepoName,
    issue: &Issue,
) -> Result<Outcome, SyncError> {
    info!(id = issue.id, "Querying database for page with github id");

    let pages = store.query_by_number(ID_PROPERTY, issue.id).await?;
    let Some(page) = pages.first() else {
        warn!(id = issue.id, "Could not find page with github id");
        return Ok(Outcome::NotFound);
    };

    info!(page_id = %page.id, issue = issue.number, "Updating page for issue");
    let desired = properties::render_body_blocks(issue);
    reconcile_blocks(store, &page.id, &desired).await?;

    let placement = resolve_project_placement(source, repo, issue.number).await?;
    let props = properties::issue_properties(issue, placement.as_ref())?;
    store.update_page(&page.id, props).await?;
    Ok(Outcome::Applied)
}

/// A pull request opened against an issue moves that issue's page to
/// "In Review". Other pull-request actions are ignored.
async fn handle_pull_request_event(
    source: &dyn IssueSource,
    store: &dyn PageStore,
    repo: &RepoName,
    payload: &EventPayload,
) -> Result<Outcome, SyncError> {
    if payload.action.as_deref() != Some("opened") {
        return Ok(Outcome::Skipped);
    }
    let pr = payload
        .pull_request
        .as_ref()
        .ok_or(SyncError::MissingPayloadField("pull_request"))?;

    let number = issue_number_from_url(&pr.issue_url)?;
    // The payload carries only the repo-scoped issue number, but the join
    // key is the globally stable id. Resolve number -> id before querying.
    let issue = source.get_issue(repo, number).await?;

    let pages = store.query_by_number(ID_PROPERTY, issue.id).await?;
    let Some(page) = pages.first() else {
        warn!(
            issue = number,
            "Could not find page for issue referenced by pull request"
        );
        return Ok(Outcome::NotFound);
    };

    info!(page_id = %page.id, issue = number, "Marking issue as in review");
    let mut props = PropertySet::new();
    props.insert(
        STATUS_PROPERTY.to_string(),
        properties::status_select(Status::InReview),
    );
    store.update_page(&page.id, props).await?;
    Ok(Outcome::Applied)
}

/// Trailing path segment of a pull request's linked issue URL.
fn issue_number_from_url(url: &str) -> Result<i64, SyncError> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
        .ok_or_else(|| SyncError::InvalidIssueRef {
            url: url.to_string(),
        })
}
