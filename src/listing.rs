//! Listing fetcher: loads pages of news items into the feed.
//!
//! Each call issues exactly one `/news` request. Failures are converted to a
//! user-visible message stored in the feed and also returned to the caller,
//! who decides whether to try again.

use crate::api::NewsApi;
use crate::error::ClientError;
use crate::models::{Cursor, NewsPage};
use crate::state::{Action, Store};
use tracing::{info, instrument, warn};

/// User-visible prefix for listing failures.
pub const FETCH_FAILED: &str = "Failed to fetch news items";

/// Loads pages from a [`NewsApi`] into a [`Store`].
#[derive(Debug)]
pub struct ListingFetcher<'a, A> {
    api: &'a A,
    page_size: u32,
}

impl<'a, A: NewsApi> ListingFetcher<'a, A> {
    pub fn new(api: &'a A, page_size: u32) -> Self {
        Self { api, page_size }
    }

    /// Fetch the page starting at `cursor` (or the first page) and append it.
    ///
    /// # Returns
    ///
    /// The page as returned by the server. Its items have already been
    /// appended to the store and its `next_key` recorded as the cursor.
    #[instrument(level = "info", skip_all, fields(page_size = self.page_size, has_cursor = cursor.is_some()))]
    pub async fn fetch_page(
        &self,
        store: &Store,
        cursor: Option<&Cursor>,
    ) -> Result<NewsPage, ClientError> {
        store.dispatch(Action::FetchStarted);

        match self.api.list_news(self.page_size, cursor).await {
            Ok(page) => {
                info!(count = page.news_items.len(), "Loaded news page");
                store.dispatch(Action::FetchSucceeded(page.clone()));
                Ok(page)
            }
            Err(e) => {
                warn!(error = %e, "Listing request failed");
                store.dispatch(Action::FetchFailed(e.user_message(FETCH_FAILED)));
                Err(e)
            }
        }
    }

    /// Fetch the page after the last one loaded.
    ///
    /// # Returns
    ///
    /// `Ok(false)` without issuing a request when the end of the list has
    /// already been reached, `Ok(true)` after loading a page.
    pub async fn fetch_next(&self, store: &Store) -> Result<bool, ClientError> {
        let (has_more, cursor) = store.read(|s| (s.has_more(), s.cursor.clone()));
        if !has_more {
            return Ok(false);
        }
        self.fetch_page(store, cursor.as_ref()).await?;
        Ok(true)
    }

    /// Load up to `max_pages` pages one after another.
    ///
    /// Stops early at the end of the list or at the first failure.
    ///
    /// # Returns
    ///
    /// The number of pages loaded.
    #[instrument(level = "info", skip_all, fields(max_pages = max_pages))]
    pub async fn fetch_pages(&self, store: &Store, max_pages: usize) -> Result<usize, ClientError> {
        let mut loaded = 0;
        while loaded < max_pages {
            if !self.fetch_next(store).await? {
                break;
            }
            loaded += 1;
        }
        info!(loaded, total_items = store.read(|s| s.items.len()), "Finished loading pages");
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeApi, item};
    use serde_json::json;

    #[tokio::test]
    async fn test_first_page_fills_empty_feed_sorted_by_date() {
        let api = FakeApi::with_pages(vec![NewsPage {
            news_items: vec![item("a", "2024-01-01"), item("b", "2024-01-03")],
            next_key: None,
        }]);
        let store = Store::default();

        ListingFetcher::new(&api, 20).fetch_page(&store, None).await.unwrap();

        let state = store.snapshot();
        assert!(!state.loading);
        let dates: Vec<&str> = state.displayed().iter().map(|i| i.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-03", "2024-01-01"]);
        assert_eq!(
            api.calls(),
            vec![Call::List {
                limit: 20,
                start_key: None
            }]
        );
    }

    #[tokio::test]
    async fn test_cursor_is_passed_back_verbatim() {
        let cursor = json!({"partitionKey": "news", "date": "2024-01-02T00:00:00Z", "id": "b"});
        let api = FakeApi::with_pages(vec![
            NewsPage {
                news_items: vec![item("a", "2024-01-03")],
                next_key: Some(Cursor(cursor.clone())),
            },
            NewsPage {
                news_items: vec![item("c", "2024-01-01")],
                next_key: None,
            },
        ]);
        let store = Store::default();
        let fetcher = ListingFetcher::new(&api, 1);

        assert_eq!(fetcher.fetch_pages(&store, 5).await.unwrap(), 2);

        assert_eq!(
            api.calls(),
            vec![
                Call::List {
                    limit: 1,
                    start_key: None
                },
                Call::List {
                    limit: 1,
                    start_key: Some(Cursor(cursor))
                },
            ]
        );
        assert_eq!(store.read(|s| s.items.len()), 2);

        // End of list reached: no further request.
        assert!(!fetcher.fetch_next(&store).await.unwrap());
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_pages_respects_limit() {
        let api = FakeApi::with_pages(vec![
            NewsPage {
                news_items: vec![item("a", "2024-01-03")],
                next_key: Some(Cursor(json!("k1"))),
            },
            NewsPage {
                news_items: vec![item("b", "2024-01-02")],
                next_key: Some(Cursor(json!("k2"))),
            },
        ]);
        let store = Store::default();

        let loaded = ListingFetcher::new(&api, 20)
            .fetch_pages(&store, 1)
            .await
            .unwrap();

        assert_eq!(loaded, 1);
        assert_eq!(api.calls().len(), 1);
        assert!(store.read(|s| s.has_more()));
    }

    #[tokio::test]
    async fn test_server_error_is_reported_once_without_retry() {
        let api = FakeApi::default();
        let store = Store::default();

        let err = ListingFetcher::new(&api, 20)
            .fetch_page(&store, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Server { .. }));
        assert_eq!(api.calls().len(), 1);
        let state = store.snapshot();
        assert!(!state.loading);
        assert!(state.error.unwrap().starts_with(FETCH_FAILED));
    }
}
