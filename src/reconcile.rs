//! Positional block reconciliation: make a page's block children equal the
//! freshly rendered content, using position as the only block identity.

use anyhow::Result;
use futures::future::join_all;
use tracing::debug;

use crate::notion::model::{BlockContent, ExistingBlock};
use crate::notion::PageStore;

/// The positional split of one reconciliation. Append and delete never
/// co-occur: one of them is always empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPlan {
    /// Existing blocks rewritten in place with the desired content.
    pub update: Vec<(String, BlockContent)>,
    /// Desired blocks beyond the overlap, appended in order.
    pub append: Vec<BlockContent>,
    /// Existing blocks beyond the overlap, removed in any order.
    pub delete: Vec<String>,
}

/// Compute the update/append/delete split for `existing` vs `desired`.
pub fn plan(existing: &[ExistingBlock], desired: &[BlockContent]) -> BlockPlan {
    let overlap = existing.len().min(desired.len());
    BlockPlan {
        update: existing[..overlap]
            .iter()
            .zip(&desired[..overlap])
            .map(|(block, content)| (block.id.clone(), content.clone()))
            .collect(),
        append: desired[overlap..].to_vec(),
        delete: existing[overlap..].iter().map(|b| b.id.clone()).collect(),
    }
}

/// Reconcile a page's block children to `desired`: rewrite the overlap,
/// then append the tail when the rendered content is longer, or delete the
/// leftovers when it is shorter.
///
/// Updates run as one unordered concurrent batch, as do deletions. A
/// failing operation fails the reconciliation for this page but does not
/// cancel or roll back its siblings; a retry converges because the diff is
/// positional.
pub async fn reconcile_blocks(
    store: &dyn PageStore,
    page_id: &str,
    desired: &[BlockContent],
) -> Result<()> {
    let existing = store.list_block_children(page_id).await?;
    let plan = plan(&existing, desired);
    debug!(
        page_id,
        updates = plan.update.len(),
        appends = plan.append.len(),
        deletes = plan.delete.len(),
        "reconciling body blocks"
    );

    let updates = join_all(
        plan.update
            .iter()
            .map(|(block_id, content)| store.update_block(block_id, content)),
    )
    .await;
    for result in updates {
        result?;
    }

    if !plan.append.is_empty() {
        store.append_blocks(page_id, &plan.append).await?;
    } else if !plan.delete.is_empty() {
        let deletes = join_all(plan.delete.iter().map(|block_id| store.delete_block(block_id))).await;
        for result in deletes {
            result?;
        }
    }

    Ok(())
}
