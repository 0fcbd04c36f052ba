//! Recording mock implementations of the two capability traits, shared by
//! the engine-level tests.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

use gh_notion_sync::github::IssueSource;
use gh_notion_sync::model::{
    Account, Issue, IssueState, Project, ProjectCard, ProjectColumn, PullRequestMarker, RepoName,
};
use gh_notion_sync::notion::model::{BlockContent, ExistingBlock, PageRef};
use gh_notion_sync::notion::PageStore;
use gh_notion_sync::pagination::Page;
use gh_notion_sync::properties::PropertySet;

pub fn repo() -> RepoName {
    RepoName::parse("acme/widgets").unwrap()
}

pub fn issue(number: i64, id: i64) -> Issue {
    Issue {
        id,
        number,
        title: format!("Issue #{number}"),
        state: Some(IssueState::Open),
        body: Some(format!("Body of issue #{number}")),
        labels: Vec::new(),
        assignees: Vec::new(),
        milestone: None,
        user: Some(Account {
            login: "alice".to_string(),
        }),
        created_at: Utc.with_ymd_and_hms(2023, 1, 10, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2023, 1, 11, 8, 30, 0).unwrap(),
        html_url: format!("https://github.com/acme/widgets/issues/{number}"),
        repository_url: "https://api.github.com/repos/acme/widgets".to_string(),
        pull_request: None,
    }
}

/// An issue record that is actually a pull request.
pub fn pull_request_record(number: i64, id: i64) -> Issue {
    let mut record = issue(number, id);
    record.pull_request = Some(PullRequestMarker {
        url: Some(format!(
            "https://api.github.com/repos/acme/widgets/pulls/{number}"
        )),
    });
    record
}

pub fn page_ref(id: &str, github_id: i64) -> PageRef {
    PageRef {
        id: id.to_string(),
        properties: json!({ "ID": { "number": github_id } }),
    }
}

pub fn page_ref_without_id(id: &str) -> PageRef {
    PageRef {
        id: id.to_string(),
        properties: json!({}),
    }
}

#[derive(Clone, Default)]
pub struct RecordingGithub {
    pub issue_pages: Arc<Mutex<VecDeque<Page<Issue>>>>,
    pub issue_cursors: Arc<Mutex<Vec<Option<String>>>>,
    pub issues_by_number: Arc<Mutex<HashMap<i64, Issue>>>,
    pub issue_lookups: Arc<Mutex<Vec<i64>>>,
    pub projects: Arc<Mutex<Vec<Project>>>,
    pub columns: Arc<Mutex<HashMap<i64, Vec<ProjectColumn>>>>,
    pub cards: Arc<Mutex<HashMap<i64, Vec<ProjectCard>>>>,
}

impl RecordingGithub {
    pub fn with_issue_pages(pages: Vec<Page<Issue>>) -> Self {
        Self {
            issue_pages: Arc::new(Mutex::new(VecDeque::from(pages))),
            ..Default::default()
        }
    }

    pub async fn issue_cursors(&self) -> Vec<Option<String>> {
        self.issue_cursors.lock().await.clone()
    }

    pub async fn add_issue(&self, record: Issue) {
        self.issues_by_number
            .lock()
            .await
            .insert(record.number, record);
    }

    pub async fn add_placement(&self, project: Project, column: ProjectColumn, card: ProjectCard) {
        self.columns
            .lock()
            .await
            .insert(project.id, vec![column.clone()]);
        self.cards.lock().await.insert(column.id, vec![card]);
        self.projects.lock().await.push(project);
    }
}

#[async_trait]
impl IssueSource for RecordingGithub {
    async fn list_issues(&self, _repo: &RepoName, cursor: Option<&str>) -> Result<Page<Issue>> {
        self.issue_cursors
            .lock()
            .await
            .push(cursor.map(str::to_string));
        Ok(self.issue_pages.lock().await.pop_front().unwrap_or_default())
    }

    async fn get_issue(&self, _repo: &RepoName, number: i64) -> Result<Issue> {
        self.issue_lookups.lock().await.push(number);
        self.issues_by_number
            .lock()
            .await
            .get(&number)
            .cloned()
            .ok_or_else(|| anyhow!("no issue #{number}"))
    }

    async fn list_projects(&self, _repo: &RepoName, _cursor: Option<&str>) -> Result<Page<Project>> {
        Ok(Page::last(self.projects.lock().await.clone()))
    }

    async fn list_columns(
        &self,
        project_id: i64,
        _cursor: Option<&str>,
    ) -> Result<Page<ProjectColumn>> {
        Ok(Page::last(
            self.columns
                .lock()
                .await
                .get(&project_id)
                .cloned()
                .unwrap_or_default(),
        ))
    }

    async fn list_cards(
        &self,
        column_id: i64,
        _cursor: Option<&str>,
    ) -> Result<Page<ProjectCard>> {
        Ok(Page::last(
            self.cards
                .lock()
                .await
                .get(&column_id)
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

/// Page store mock. Block children are stateful: appends and deletes
/// mutate the per-page listing so convergence is observable across calls.
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub query_pages: Arc<Mutex<VecDeque<Page<PageRef>>>>,
    pub query_cursors: Arc<Mutex<Vec<Option<String>>>>,
    pub number_queries: Arc<Mutex<Vec<(String, i64)>>>,
    pub pages_by_id: Arc<Mutex<HashMap<i64, Vec<PageRef>>>>,
    pub create_responses: Arc<Mutex<VecDeque<Result<String>>>>,
    pub created: Arc<Mutex<Vec<(PropertySet, Option<Vec<BlockContent>>)>>>,
    pub page_updates: Arc<Mutex<Vec<(String, PropertySet)>>>,
    pub children: Arc<Mutex<HashMap<String, Vec<ExistingBlock>>>>,
    pub block_updates: Arc<Mutex<Vec<(String, BlockContent)>>>,
    pub appended: Arc<Mutex<Vec<(String, Vec<BlockContent>)>>>,
    pub deleted: Arc<Mutex<Vec<String>>>,
    append_seq: Arc<Mutex<usize>>,
}

impl RecordingStore {
    pub async fn add_query_page(&self, page: Page<PageRef>) {
        self.query_pages.lock().await.push_back(page);
    }

    pub async fn add_page_for_id(&self, github_id: i64, page: PageRef) {
        self.pages_by_id
            .lock()
            .await
            .entry(github_id)
            .or_default()
            .push(page);
    }

    pub async fn set_children(&self, page_id: &str, block_ids: &[&str]) {
        self.children.lock().await.insert(
            page_id.to_string(),
            block_ids
                .iter()
                .map(|id| ExistingBlock { id: id.to_string() })
                .collect(),
        );
    }

    pub async fn children_of(&self, page_id: &str) -> Vec<String> {
        self.children
            .lock()
            .await
            .get(page_id)
            .map(|blocks| blocks.iter().map(|b| b.id.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageStore for RecordingStore {
    async fn query_pages(&self, cursor: Option<&str>) -> Result<Page<PageRef>> {
        self.query_cursors
            .lock()
            .await
            .push(cursor.map(str::to_string));
        Ok(self.query_pages.lock().await.pop_front().unwrap_or_default())
    }

    async fn query_by_number(&self, property: &str, value: i64) -> Result<Vec<PageRef>> {
        self.number_queries
            .lock()
            .await
            .push((property.to_string(), value));
        Ok(self
            .pages_by_id
            .lock()
            .await
            .get(&value)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_page(
        &self,
        properties: PropertySet,
        children: Option<Vec<BlockContent>>,
    ) -> Result<String> {
        self.created.lock().await.push((properties, children));
        self.create_responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("page-id".to_string()))
    }

    async fn update_page(&self, page_id: &str, properties: PropertySet) -> Result<()> {
        self.page_updates
            .lock()
            .await
            .push((page_id.to_string(), properties));
        Ok(())
    }

    async fn list_block_children(&self, page_id: &str) -> Result<Vec<ExistingBlock>> {
        Ok(self
            .children
            .lock()
            .await
            .get(page_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_block(&self, block_id: &str, content: &BlockContent) -> Result<()> {
        self.block_updates
            .lock()
            .await
            .push((block_id.to_string(), content.clone()));
        Ok(())
    }

    async fn append_blocks(&self, page_id: &str, contents: &[BlockContent]) -> Result<()> {
        self.appended
            .lock()
            .await
            .push((page_id.to_string(), contents.to_vec()));
        let mut children = self.children.lock().await;
        let entry = children.entry(page_id.to_string()).or_default();
        let mut seq = self.append_seq.lock().await;
        for _ in contents {
            *seq += 1;
            entry.push(ExistingBlock {
                id: format!("appended-{}", *seq),
            });
        }
        Ok(())
    }

    async fn delete_block(&self, block_id: &str) -> Result<()> {
        self.deleted.lock().await.push(block_id.to_string());
        for blocks in self.children.lock().await.values_mut() {
            blocks.retain(|b| b.id != block_id);
        }
        Ok(())
    }
}
