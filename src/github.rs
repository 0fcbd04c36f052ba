use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::warn;

use crate::model::{Issue, Project, ProjectCard, ProjectColumn, RepoName};
use crate::pagination::Page;

const GITHUB_API_BASE: &str = "https://api.github.com/";

const PER_PAGE: u32 = 100;

/// Read access to a repository's issues and classic project boards.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// One page of the repository's issues, all states. Pull requests
    /// share the numbering space and are NOT filtered here; callers check
    /// the per-item discriminator.
    async fn list_issues(&self, repo: &RepoName, cursor: Option<&str>) -> Result<Page<Issue>>;

    /// One issue by its repo-scoped number.
    async fn get_issue(&self, repo: &RepoName, number: i64) -> Result<Issue>;

    async fn list_projects(&self, repo: &RepoName, cursor: Option<&str>) -> Result<Page<Project>>;

    async fn list_columns(
        &self,
        project_id: i64,
        cursor: Option<&str>,
    ) -> Result<Page<ProjectColumn>>;

    async fn list_cards(&self, column_id: i64, cursor: Option<&str>)
        -> Result<Page<ProjectCard>>;
}

#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GithubClient {
    pub fn new(token: String) -> Self {
        let base_url = Url::parse(GITHUB_API_BASE).expect("valid default GitHub URL");
        Self::with_base_url(token, base_url)
    }

    pub fn with_base_url(token: String, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("gh-notion-sync/0.1")
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            token,
        }
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response> {
        let res = self
            .http
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .context("failed to reach GitHub")?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!("GitHub API error - Status: {}, Body: {}", status, body);
            return Err(anyhow!("github error {}: {}", status, body));
        }
        Ok(res)
    }

    /// Fetch one page of a listing. The cursor is the `rel="next"` URL of
    /// the previous response's `Link` header; without one the first-page
    /// URL is used.
    async fn get_page<T: DeserializeOwned>(
        &self,
        first: Url,
        cursor: Option<&str>,
    ) -> Result<Page<T>> {
        let url = match cursor {
            Some(cursor) => Url::parse(cursor).context("invalid pagination cursor")?,
            None => first,
        };
        let res = self.get(url).await?;
        let next_cursor = next_link(
            res.headers()
                .get(reqwest::header::LINK)
                .and_then(|v| v.to_str().ok()),
        );
        let items = res
            .json::<Vec<T>>()
            .await
            .context("invalid GitHub response JSON")?;
        Ok(Page { items, next_cursor })
    }

    fn listing_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base_url.join(path).context("invalid GitHub base URL")?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url)
    }
}

#[async_trait]
impl IssueSource for GithubClient {
    async fn list_issues(&self, repo: &RepoName, cursor: Option<&str>) -> Result<Page<Issue>> {
        let first = self.listing_url(
            &format!("repos/{}/{}/issues", repo.owner, repo.name),
            &[
                ("state", "all".to_string()),
                ("per_page", PER_PAGE.to_string()),
            ],
        )?;
        self.get_page(first, cursor).await
    }

    async fn get_issue(&self, repo: &RepoName, number: i64) -> Result<Issue> {
        let url = self
            .base_url
            .join(&format!(
                "repos/{}/{}/issues/{}",
                repo.owner, repo.name, number
            ))
            .context("invalid GitHub base URL")?;
        let res = self.get(url).await?;
        res.json::<Issue>()
            .await
            .context("invalid GitHub response JSON")
    }

    async fn list_projects(&self, repo: &RepoName, cursor: Option<&str>) -> Result<Page<Project>> {
        let first = self.listing_url(
            &format!("repos/{}/{}/projects", repo.owner, repo.name),
            &[("per_page", PER_PAGE.to_string())],
        )?;
        self.get_page(first, cursor).await
    }

    async fn list_columns(
        &self,
        project_id: i64,
        cursor: Option<&str>,
    ) -> Result<Page<ProjectColumn>> {
        let first = self.listing_url(
            &format!("projects/{project_id}/columns"),
            &[("per_page", PER_PAGE.to_string())],
        )?;
        self.get_page(first, cursor).await
    }

    async fn list_cards(
        &self,
        column_id: i64,
        cursor: Option<&str>,
    ) -> Result<Page<ProjectCard>> {
        let first = self.listing_url(
            &format!("projects/columns/{column_id}/cards"),
            &[("per_page", PER_PAGE.to_string())],
        )?;
        self.get_page(first, cursor).await
    }
}

/// Extract the `rel="next"` target from a `Link` response header.
fn next_link(header: Option<&str>) -> Option<String> {
    for part in header?.split(',') {
        let (target, params) = match part.split_once(';') {
            Some(pair) => pair,
            None => continue,
        };
        if params.split(';').any(|p| p.trim() == r#"rel="next""#) {
            let target = target.trim();
            return Some(target.strip_prefix('<')?.strip_suffix('>')?.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_link_finds_next_relation() {
        let header = r#"<https://api.github.com/repositories/1/issues?page=2>; rel="next", <https://api.github.com/repositories/1/issues?page=5>; rel="last""#;
        assert_eq!(
            next_link(Some(header)),
            Some("https://api.github.com/repositories/1/issues?page=2".to_string())
        );
    }

    #[test]
    fn next_link_absent_on_last_page() {
        let header = r#"<https://api.github.com/repositories/1/issues?page=1>; rel="prev", <https://api.github.com/repositories/1/issues?page=1>; rel="first""#;
        assert_eq!(next_link(Some(header)), None);
        assert_eq!(next_link(None), None);
    }

    #[test]
    fn listing_url_appends_query() {
        let client = GithubClient::new("token".into());
        let url = client
            .listing_url("repos/acme/widgets/issues", &[("state", "all".to_string())])
            .unwrap();
        assert_eq!(url.path(), "/repos/acme/widgets/issues");
        assert!(url.query().unwrap().contains("state=all"));
    }
}
