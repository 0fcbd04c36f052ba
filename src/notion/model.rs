use serde::Deserialize;
use serde_json::{json, Value};

/// One row returned by a database query. Properties are kept as raw JSON;
/// callers harvest the slots they need.
#[derive(Deserialize, Debug, Clone)]
pub struct PageRef {
    pub id: String,
    #[serde(default)]
    pub properties: Value,
}

impl PageRef {
    /// Numeric value of a number property, if the page carries a usable
    /// one.
    pub fn number_property(&self, name: &str) -> Option<i64> {
        self.properties.get(name)?.get("number")?.as_i64()
    }
}

#[derive(Deserialize, Debug)]
pub struct QueryDatabaseResp {
    pub results: Vec<PageRef>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// A block already present on a page. Position in the listing is its only
/// identity; no per-block key survives across renders.
#[derive(Deserialize, Debug, Clone)]
pub struct ExistingBlock {
    pub id: String,
}

#[derive(Deserialize, Debug)]
pub struct ListBlockChildrenResp {
    pub results: Vec<ExistingBlock>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Deserialize, Debug)]
pub struct CreatePageResp {
    pub id: String,
}

/// A paragraph of rich text — the only block shape this system renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockContent {
    pub text: String,
}

impl BlockContent {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "type": "paragraph",
            "paragraph": {
                "rich_text": [
                    { "type": "text", "text": { "content": self.text } }
                ]
            }
        })
    }
}
