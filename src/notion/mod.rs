use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;
use tracing::warn;

use crate::notion::model::{
    BlockContent, CreatePageResp, ExistingBlock, ListBlockChildrenResp, PageRef, QueryDatabaseResp,
};
use crate::pagination::{collect_paginated, Page};
use crate::properties::PropertySet;

pub mod model;

const NOTION_API_BASE: &str = "https://api.notion.com/";

/// Rows fetched per query request when draining the whole database.
const QUERY_PAGE_SIZE: u32 = 100;

/// Query/create/update/delete access to one database and the block
/// children of its pages.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// One page of the full database listing.
    async fn query_pages(&self, cursor: Option<&str>) -> Result<Page<PageRef>>;

    /// Pages whose numeric property equals `value`. 0 or 1 results
    /// expected; callers use the first when the store returns more.
    async fn query_by_number(&self, property: &str, value: i64) -> Result<Vec<PageRef>>;

    async fn create_page(
        &self,
        properties: PropertySet,
        children: Option<Vec<BlockContent>>,
    ) -> Result<String>;

    async fn update_page(&self, page_id: &str, properties: PropertySet) -> Result<()>;

    /// The ordered block children of a page, fully drained.
    async fn list_block_children(&self, page_id: &str) -> Result<Vec<ExistingBlock>>;

    async fn update_block(&self, block_id: &str, content: &BlockContent) -> Result<()>;

    async fn append_blocks(&self, page_id: &str, contents: &[BlockContent]) -> Result<()>;

    async fn delete_block(&self, block_id: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct NotionClient {
    http: Client,
    base_url: Url,
    token: String,
    version: String,
    database_id: String,
}

impl fmt::Debug for NotionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionClient")
            .field("base_url", &self.base_url)
            .field("database_id", &self.database_id)
            .finish_non_exhaustive()
    }
}

impl NotionClient {
    pub fn new(token: String, version: String, database_id: String) -> Self {
        let base_url = Url::parse(NOTION_API_BASE).expect("valid default Notion URL");
        Self::with_base_url(token, version, database_id, base_url)
    }

    pub fn with_base_url(
        token: String,
        version: String,
        database_id: String,
        base_url: Url,
    ) -> Self {
        let http = Client::builder()
            .user_agent("gh-notion-sync/0.1")
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            token,
            version,
            database_id,
        }
    }

    async fn execute(&self, method: Method, path: &str, body: Option<&Value>) -> Result<reqwest::Response> {
        let url = self.base_url.join(path).context("invalid Notion base URL")?;
        let mut request = self
            .http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version);
        if let Some(body) = body {
            request = request.header("Content-Type", "application/json").json(body);
        }
        let res = request.send().await.context("failed to reach Notion")?;

        if res.status() == StatusCode::TOO_MANY_REQUESTS {
            let body = res.text().await.unwrap_or_default();
            warn!("Rate limited by Notion: {}", body);
            return Err(anyhow!("received 429 from Notion: {}", body));
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            warn!("Notion API error - Status: {}, Body: {}", status, body);
            return Err(anyhow!("notion error {}: {}", status, body));
        }
        Ok(res)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let res = self.execute(method, path, body).await?;
        res.json::<T>().await.context("invalid Notion response JSON")
    }
}

#[async_trait]
impl PageStore for NotionClient {
    async fn query_pages(&self, cursor: Option<&str>) -> Result<Page<PageRef>> {
        let body = build_query_request(cursor, QUERY_PAGE_SIZE);
        let resp: QueryDatabaseResp = self
            .execute_json(
                Method::POST,
                &format!("v1/databases/{}/query", self.database_id),
                Some(&body),
            )
            .await?;
        Ok(Page {
            items: resp.results,
            next_cursor: if resp.has_more { resp.next_cursor } else { None },
        })
    }

    async fn query_by_number(&self, property: &str, value: i64) -> Result<Vec<PageRef>> {
        let body = build_number_filter_request(property, value);
        let resp: QueryDatabaseResp = self
            .execute_json(
                Method::POST,
                &format!("v1/databases/{}/query", self.database_id),
                Some(&body),
            )
            .await?;
        Ok(resp.results)
    }

    async fn create_page(
        &self,
        properties: PropertySet,
        children: Option<Vec<BlockContent>>,
    ) -> Result<String> {
        let body = build_create_page_request(&self.database_id, &properties, children.as_deref());
        let resp: CreatePageResp = self.execute_json(Method::POST, "v1/pages", Some(&body)).await?;
        Ok(resp.id)
    }

    async fn update_page(&self, page_id: &str, properties: PropertySet) -> Result<()> {
        let body = json!({ "properties": Value::Object(properties) });
        self.execute(Method::PATCH, &format!("v1/pages/{page_id}"), Some(&body))
            .await?;
        Ok(())
    }

    async fn list_block_children(&self, page_id: &str) -> Result<Vec<ExistingBlock>> {
        collect_paginated(|cursor| async move {
            let mut path = format!("v1/blocks/{page_id}/children?page_size={QUERY_PAGE_SIZE}");
            if let Some(cursor) = cursor.as_deref() {
                path.push_str("&start_cursor=");
                path.push_str(cursor);
            }
            let resp: ListBlockChildrenResp = self.execute_json(Method::GET, &path, None).await?;
            Ok(Page {
                items: resp.results,
                next_cursor: if resp.has_more { resp.next_cursor } else { None },
            })
        })
        .await
    }

    async fn update_block(&self, block_id: &str, content: &BlockContent) -> Result<()> {
        self.execute(
            Method::PATCH,
            &format!("v1/blocks/{block_id}"),
            Some(&content.to_json()),
        )
        .await?;
        Ok(())
    }

    async fn append_blocks(&self, page_id: &str, contents: &[BlockContent]) -> Result<()> {
        let body = build_append_children_request(contents);
        self.execute(
            Method::PATCH,
            &format!("v1/blocks/{page_id}/children"),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn delete_block(&self, block_id: &str) -> Result<()> {
        self.execute(Method::DELETE, &format!("v1/blocks/{block_id}"), None)
            .await?;
        Ok(())
    }
}

pub fn build_query_request(cursor: Option<&str>, page_size: u32) -> Value {
    let mut body = json!({ "page_size": page_size });
    if let Some(cursor) = cursor {
        body["start_cursor"] = json!(cursor);
    }
    body
}

pub fn build_number_filter_request(property: &str, value: i64) -> Value {
    json!({
        "filter": {
            "property": property,
            "number": { "equals": value }
        },
        "page_size": 1
    })
}

pub fn build_create_page_request(
    database_id: &str,
    properties: &PropertySet,
    children: Option<&[BlockContent]>,
) -> Value {
    let mut body = json!({
        "parent": { "database_id": database_id },
        "properties": Value::Object(properties.clone()),
    });
    if let Some(children) = children {
        let blocks: Vec<Value> = children.iter().map(BlockContent::to_json).collect();
        body["children"] = Value::Array(blocks);
    }
    body
}

pub fn build_append_children_request(contents: &[BlockContent]) -> Value {
    let blocks: Vec<Value> = contents.iter().map(BlockContent::to_json).collect();
    json!({ "children": blocks })
}
