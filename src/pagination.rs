//! Cursor pagination shared by both remote stores.

use anyhow::Result;
use std::future::Future;

/// One page of a remote listing plus the cursor to the next page, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// A page with no further pages behind it.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::last(Vec::new())
    }
}

/// Drain a paginated listing into one vector, following `next_cursor`
/// until the remote reports no further page.
pub async fn collect_paginated<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = fetch(cursor.take()).await?;
        items.extend(page.items);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[tokio::test]
    async fn follows_cursor_chain_to_exhaustion() {
        let pages = RefCell::new(VecDeque::from(vec![
            Page {
                items: vec![1, 2],
                next_cursor: Some("A".to_string()),
            },
            Page {
                items: vec![3],
                next_cursor: Some("B".to_string()),
            },
            Page {
                items: vec![4, 5],
                next_cursor: None,
            },
        ]));
        let cursors = RefCell::new(Vec::new());

        let items = collect_paginated(|cursor| {
            cursors.borrow_mut().push(cursor.clone());
            let page = pages.borrow_mut().pop_front().expect("no page scripted");
            async move { Ok(page) }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(
            *cursors.borrow(),
            vec![None, Some("A".to_string()), Some("B".to_string())]
        );
    }

    #[tokio::test]
    async fn single_page_listing_fetches_once() {
        let calls = RefCell::new(0);
        let items: Vec<i64> = collect_paginated(|_| {
            *calls.borrow_mut() += 1;
            async { Ok(Page::last(vec![7])) }
        })
        .await
        .unwrap();
        assert_eq!(items, vec![7]);
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test]
    async fn fetch_error_propagates() {
        let result: Result<Vec<i64>> =
            collect_paginated(|_| async { Err(anyhow!("listing failed")) }).await;
        assert!(result.is_err());
    }
}
