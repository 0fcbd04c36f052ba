//! Mapping from a GitHub issue to the flat set of typed database
//! properties, plus body rendering.
//!
//! The property slots are fixed: every name in the set is written on every
//! page write, so a page is never left with stale values in only some
//! fields.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

use crate::error::SyncError;
use crate::model::{Issue, IssueState, ProjectPlacement};
use crate::notion::model::BlockContent;

/// Flat mapping from property names to typed Notion property payloads.
pub type PropertySet = Map<String, Value>;

/// The numeric property holding the GitHub issue `id` — the join key
/// between the two systems. Not the issue `number`, which is repo-scoped
/// and reused across repositories.
pub const ID_PROPERTY: &str = "ID";

pub const STATUS_PROPERTY: &str = "Status";

/// Status select values. `InReview` is reachable only through the
/// pull-request transition, never from issue state directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Open,
    Closed,
    InReview,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::Closed => "Closed",
            Status::InReview => "In Review",
        }
    }

    pub fn from_state(state: IssueState) -> Self {
        match state {
            IssueState::Open => Status::Open,
            IssueState::Closed => Status::Closed,
        }
    }
}

pub fn title(text: &str) -> Value {
    json!({ "title": [ { "type": "text", "text": { "content": text } } ] })
}

pub fn rich_text(text: &str) -> Value {
    json!({ "rich_text": [ { "type": "text", "text": { "content": text } } ] })
}

pub fn number(value: i64) -> Value {
    json!({ "number": value })
}

pub fn select(name: &str) -> Value {
    json!({ "select": { "name": name } })
}

pub fn multi_select<'a>(names: impl IntoIterator<Item = &'a str>) -> Value {
    let options: Vec<Value> = names.into_iter().map(|n| json!({ "name": n })).collect();
    json!({ "multi_select": options })
}

pub fn date(value: &DateTime<Utc>) -> Value {
    json!({ "date": { "start": value.to_rfc3339() } })
}

pub fn url(value: &str) -> Value {
    json!({ "url": value })
}

pub fn status_select(status: Status) -> Value {
    select(status.as_str())
}

/// Last two path segments of the issue's repository API URL. The same
/// derivation serves the bulk and event paths, so one issue always maps to
/// the same Organization/Repository regardless of entry point.
pub fn org_and_repo(repository_url: &str) -> (String, String) {
    let mut segments = repository_url.trim_end_matches('/').rsplit('/');
    let repo = segments.next().unwrap_or_default().to_string();
    let org = segments.next().unwrap_or_default().to_string();
    (org, repo)
}

/// Map one issue (plus optional project placement) to the full property
/// set. Missing optional fields map to empty values; a missing issue state
/// is the one failure.
pub fn issue_properties(
    issue: &Issue,
    placement: Option<&ProjectPlacement>,
) -> Result<PropertySet, SyncError> {
    let state = issue.state.ok_or(SyncError::MissingIssueState {
        number: issue.number,
    })?;
    let (org, repo) = org_and_repo(&issue.repository_url);
    let author = issue.user.as_ref().map(|u| u.login.as_str()).unwrap_or("");
    let milestone = issue
        .milestone
        .as_ref()
        .map(|m| m.title.as_str())
        .unwrap_or("");

    let mut props = PropertySet::new();
    props.insert("Name".to_string(), title(&issue.title));
    props.insert(
        STATUS_PROPERTY.to_string(),
        status_select(Status::from_state(state)),
    );
    props.insert("Organization".to_string(), rich_text(&org));
    props.insert("Repository".to_string(), rich_text(&repo));
    props.insert("Number".to_string(), number(issue.number));
    props.insert(
        "Assignees".to_string(),
        multi_select(issue.assignees.iter().map(|a| a.login.as_str())),
    );
    props.insert("Milestone".to_string(), rich_text(milestone));
    props.insert(
        "Labels".to_string(),
        multi_select(issue.labels.iter().map(|l| l.name.as_str())),
    );
    props.insert("Author".to_string(), rich_text(author));
    props.insert("Created".to_string(), date(&issue.created_at));
    props.insert("Updated".to_string(), date(&issue.updated_at));
    props.insert(ID_PROPERTY.to_string(), number(issue.id));
    props.insert("Link".to_string(), url(&issue.html_url));
    props.insert(
        "Project".to_string(),
        rich_text(placement.map(|p| p.project.as_str()).unwrap_or("")),
    );
    props.insert(
        "Project Column".to_string(),
        rich_text(placement.map(|p| p.column.as_str()).unwrap_or("")),
    );
    Ok(props)
}

static HTML_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<.*>.*</.*>").expect("valid HTML block pattern"));

/// Issue description with HTML tag blocks removed. An absent description
/// renders as empty text.
pub fn sanitize_body(body: Option<&str>) -> String {
    match body {
        Some(text) => HTML_BLOCK.replace_all(text, "").into_owned(),
        None => String::new(),
    }
}

/// Rendered page body: a single paragraph holding the sanitized
/// description.
pub fn render_body_blocks(issue: &Issue) -> Vec<BlockContent> {
    vec![BlockContent::paragraph(sanitize_body(
        issue.body.as_deref(),
    ))]
}
