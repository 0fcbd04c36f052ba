//! Domain types: GitHub payload shapes and typed wrappers shared by the
//! engines and the remote clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SyncError;

/// Issue state as reported by GitHub.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Milestone {
    pub title: String,
}

/// Present on an issue record when the record is actually a pull request.
/// Issues and pull requests share one numbering space; this marker is the
/// only discriminator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestMarker {
    #[serde(default)]
    pub url: Option<String>,
}

/// A GitHub issue. `id` is globally stable across repositories and is the
/// join key against the database; `number` is repo-scoped and reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    pub number: i64,
    pub title: String,
    #[serde(default)]
    pub state: Option<IssueState>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub assignees: Vec<Account>,
    #[serde(default)]
    pub milestone: Option<Milestone>,
    #[serde(default)]
    pub user: Option<Account>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub html_url: String,
    pub repository_url: String,
    #[serde(default)]
    pub pull_request: Option<PullRequestMarker>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// A classic project board of a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectColumn {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectCard {
    pub id: i64,
    #[serde(default)]
    pub content_url: Option<String>,
}

/// The (project, column) a card representing an issue currently occupies.
/// At most one placement is surfaced; absence is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPlacement {
    pub project: String,
    pub column: String,
}

/// An `owner/name` repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoName {
    pub owner: String,
    pub name: String,
}

impl RepoName {
    pub fn parse(full_name: &str) -> Result<Self, SyncError> {
        match full_name.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(SyncError::InvalidRepoName(full_name.to_string())),
        }
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Repository block of an inbound event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub full_name: String,
}

/// Pull request block of an inbound event payload. Only the linked issue
/// reference is consumed; it carries the repo-scoped number, not the id.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestPayload {
    pub issue_url: String,
}

/// An inbound lifecycle event as delivered by the host.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub issue: Option<Issue>,
    #[serde(default)]
    pub pull_request: Option<PullRequestPayload>,
    #[serde(default)]
    pub repository: Option<Repository>,
}
