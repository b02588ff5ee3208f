//! Cursor pagination for workspace queries
//!
//! Workspace databases return at most [`PAGE_SIZE`] results per call plus a
//! `has_more` flag and an opaque `next_cursor`. [`collect_all`] follows the
//! cursor sequentially until the source reports no more results.

use async_trait::async_trait;
use serde::Deserialize;

/// Page size requested on every query
pub const PAGE_SIZE: u32 = 100;

/// One page of results
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Anything that can serve cursor-addressed pages
#[async_trait]
pub trait PageSource<T: Send> {
    type Error: Send;

    /// Fetch the page starting at `cursor` (the first page when `None`)
    async fn fetch_page(&self, cursor: Option<String>) -> Result<Page<T>, Self::Error>;
}

/// Concatenate every page of `source` in order.
///
/// Stops when a page reports `has_more = false`, or when a page claims more
/// results but carries no cursor to continue from.
pub async fn collect_all<T, S>(source: &S) -> Result<Vec<T>, S::Error>
where
    T: Send,
    S: PageSource<T> + Sync,
{
    let mut all = Vec::new();
    let mut cursor = None;
    let mut pages = 0usize;

    loop {
        let page = source.fetch_page(cursor.take()).await?;
        pages += 1;
        all.extend(page.results);

        match (page.has_more, page.next_cursor) {
            (true, Some(next)) => cursor = Some(next),
            (true, None) => {
                tracing::warn!("Page {} reported more results without a cursor; stopping", pages);
                break;
            }
            (false, _) => break,
        }
    }

    tracing::debug!(pages, results = all.len(), "Pagination complete");
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves fixed pages of integers and records the cursors it was asked for
    struct FakeSource {
        pages: Vec<Vec<u32>>,
        requested: Mutex<Vec<Option<String>>>,
    }

    impl FakeSource {
        fn new(pages: Vec<Vec<u32>>) -> Self {
            Self {
                pages,
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageSource<u32> for FakeSource {
        type Error = String;

        async fn fetch_page(&self, cursor: Option<String>) -> Result<Page<u32>, String> {
            self.requested.lock().unwrap().push(cursor.clone());
            let index: usize = match cursor {
                None => 0,
                Some(c) => c.parse().map_err(|_| format!("bad cursor {}", c))?,
            };
            let has_more = index + 1 < self.pages.len();
            Ok(Page {
                results: self.pages[index].clone(),
                has_more,
                next_cursor: has_more.then(|| (index + 1).to_string()),
            })
        }
    }

    #[tokio::test]
    async fn test_collect_all_concatenates_in_order() {
        let source = FakeSource::new(vec![vec![1, 2, 3], vec![4, 5], vec![6]]);
        let all = collect_all(&source).await.unwrap();

        assert_eq!(all, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(
            *source.requested.lock().unwrap(),
            vec![None, Some("1".to_string()), Some("2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_single_page() {
        let source = FakeSource::new(vec![vec![7]]);
        assert_eq!(collect_all(&source).await.unwrap(), vec![7]);
        assert_eq!(source.requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_result() {
        let source = FakeSource::new(vec![vec![]]);
        assert!(collect_all(&source).await.unwrap().is_empty());
    }

    struct CursorlessSource;

    #[async_trait]
    impl PageSource<u32> for CursorlessSource {
        type Error = String;

        async fn fetch_page(&self, _cursor: Option<String>) -> Result<Page<u32>, String> {
            Ok(Page {
                results: vec![1],
                has_more: true,
                next_cursor: None,
            })
        }
    }

    #[tokio::test]
    async fn test_missing_cursor_terminates() {
        assert_eq!(collect_all(&CursorlessSource).await.unwrap(), vec![1]);
    }

    struct FailingSource;

    #[async_trait]
    impl PageSource<u32> for FailingSource {
        type Error = String;

        async fn fetch_page(&self, _cursor: Option<String>) -> Result<Page<u32>, String> {
            Err("upstream down".to_string())
        }
    }

    #[tokio::test]
    async fn test_error_propagates() {
        assert_eq!(
            collect_all(&FailingSource).await.unwrap_err(),
            "upstream down"
        );
    }

    #[test]
    fn test_page_decodes_workspace_shape() {
        let page: Page<serde_json::Value> = serde_json::from_str(
            r#"{"object": "list", "results": [{"id": "a"}], "has_more": true, "next_cursor": "abc"}"#,
        )
        .unwrap();
        assert!(page.has_more);
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));
        assert_eq!(page.results.len(), 1);
    }
}
