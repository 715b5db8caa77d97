//! Infinite lists built on the query cache.
//!
//! An [`InfiniteQuery`] stores a [`PageSet`] under the list's key prefix (the
//! query key without its page number). Loading more pages goes through the
//! same cache slot, so a list never has two requests in flight at once.

pub mod pages;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::app::FetchError;
use crate::cache::{CacheEntry, FetchKind, QueryCache, QueryOptions, QueryStatus};
use crate::domain::{Article, ListQuery, QueryKey};
use crate::repository::ArticleRepository;

pub use pages::PageSet;

/// Outcome of [`InfiniteQuery::load_more`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadMore {
    /// `page` was fetched and appended.
    Loaded { page: u32 },
    /// The fetch failed; already loaded pages are kept.
    Failed(FetchError),
    NoMorePages,
    /// Another fetch for this list is in flight.
    Busy,
    /// The first page has not been loaded yet.
    NotLoaded,
}

/// Read model of an infinite list.
#[derive(Debug, Clone)]
pub struct InfiniteSnapshot {
    pub articles: Vec<Article>,
    pub total_results: u32,
    pub page_count: u32,
    pub status: QueryStatus,
    pub error: Option<FetchError>,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub is_fetching_more: bool,
    pub has_more: bool,
}

impl InfiniteSnapshot {
    pub fn has_data(&self) -> bool {
        self.page_count > 0
    }
}

impl From<CacheEntry<PageSet>> for InfiniteSnapshot {
    fn from(entry: CacheEntry<PageSet>) -> Self {
        let pages = entry.data.as_ref();
        Self {
            articles: pages
                .map(|p| p.articles().cloned().collect())
                .unwrap_or_default(),
            total_results: pages.map(PageSet::total_results).unwrap_or(0),
            page_count: pages.map(PageSet::page_count).unwrap_or(0),
            status: entry.status,
            is_loading: entry.is_loading(),
            is_refreshing: matches!(entry.fetching, Some(FetchKind::Fetch | FetchKind::Refresh))
                && pages.is_some(),
            is_fetching_more: entry.fetching == Some(FetchKind::FetchMore),
            has_more: pages.is_some_and(PageSet::has_more),
            error: entry.error,
        }
    }
}

#[derive(Clone)]
pub struct InfiniteQuery {
    cache: QueryCache<PageSet>,
    repository: Arc<ArticleRepository>,
    query: ListQuery,
    key: QueryKey,
    options: QueryOptions,
}

impl InfiniteQuery {
    pub fn new(
        cache: QueryCache<PageSet>,
        repository: Arc<ArticleRepository>,
        query: ListQuery,
        options: QueryOptions,
    ) -> Self {
        let query = query.with_page(1);
        let key = query.prefix();
        Self {
            cache,
            repository,
            query,
            key,
            options,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Loads page 1, then as many further pages as `keep` already held.
    fn reload(
        &self,
        keep: u32,
    ) -> impl Future<Output = Result<PageSet, FetchError>> + Send + 'static {
        let repository = self.repository.clone();
        let query = self.query.clone();
        async move {
            let first = repository.fetch_page(&query).await?;
            let mut pages = PageSet::first(first, query.page_size());
            while pages.page_count() < keep {
                let Some(next) = pages.next_page() else {
                    break;
                };
                let page = repository.fetch_page(&query.with_page(next)).await?;
                pages = pages.with_next(page);
            }
            Ok(pages)
        }
    }

    /// Reads the list through the cache. Stale lists are refetched in the
    /// background, keeping as many pages as were loaded.
    pub async fn fetch(&self) -> InfiniteSnapshot {
        self.cache
            .fetch(&self.key, self.options, |current| {
                self.reload(current.map(|p| p.page_count()).unwrap_or(1))
            })
            .await
            .into()
    }

    /// Pull-to-refresh: reloads from page 1, dropping later pages on success.
    pub async fn refresh(&self) -> InfiniteSnapshot {
        self.cache
            .refresh(&self.key, self.options, |_| self.reload(1))
            .await
            .into()
    }

    pub async fn load_more(&self) -> LoadMore {
        let Some(entry) = self.cache.entry(&self.key) else {
            return LoadMore::NotLoaded;
        };
        if entry.is_fetching() {
            return LoadMore::Busy;
        }
        let Some(next) = entry.data.as_ref().map(PageSet::next_page) else {
            return LoadMore::NotLoaded;
        };
        let Some(next) = next else {
            debug!("No more pages for {}", self.key);
            return LoadMore::NoMorePages;
        };

        let repository = self.repository.clone();
        let query = self.query.clone();
        let fetched = self
            .cache
            .try_fetch_more(&self.key, move |pages: &PageSet| {
                // Re-checked under the cache lock: the list may have moved on.
                if pages.next_page() != Some(next) {
                    return None;
                }
                let pages = pages.clone();
                Some(async move {
                    let page = repository.fetch_page(&query.with_page(next)).await?;
                    Ok(pages.with_next(page))
                })
            })
            .await;

        match fetched {
            None => LoadMore::Busy,
            Some(CacheEntry {
                status: QueryStatus::Error,
                error: Some(e),
                ..
            }) => LoadMore::Failed(e),
            Some(_) => {
                info!("Loaded page {} of {}", next, self.key);
                LoadMore::Loaded { page: next }
            }
        }
    }

    pub fn snapshot(&self) -> InfiniteSnapshot {
        self.cache
            .entry(&self.key)
            .unwrap_or_else(|| CacheEntry::new(self.key.clone()))
            .into()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheEntry<PageSet>> {
        self.cache.subscribe(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::domain::{SearchFilters, TopHeadlinesQuery};
    use crate::gateway::fake::{server_error, FakeGateway};

    fn headlines(gateway: Arc<FakeGateway>) -> InfiniteQuery {
        InfiniteQuery::new(
            QueryCache::new(),
            Arc::new(ArticleRepository::new(gateway)),
            ListQuery::TopHeadlines(TopHeadlinesQuery::default()),
            QueryOptions::default(),
        )
    }

    fn requested_pages(gateway: &FakeGateway) -> Vec<String> {
        gateway
            .requests()
            .iter()
            .filter_map(|r| r.params.get("page").map(str::to_string))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_forty_five_results_in_pages_of_twenty() {
        let gateway = FakeGateway::new(45);
        let list = headlines(gateway.clone());

        let snapshot = list.fetch().await;
        assert_eq!(snapshot.articles.len(), 20);
        assert_eq!(snapshot.total_results, 45);
        assert!(snapshot.has_more);

        assert_eq!(list.load_more().await, LoadMore::Loaded { page: 2 });
        assert_eq!(list.load_more().await, LoadMore::Loaded { page: 3 });
        assert_eq!(list.load_more().await, LoadMore::NoMorePages);

        let snapshot = list.snapshot();
        assert_eq!(snapshot.articles.len(), 45);
        assert!(!snapshot.has_more);
        assert_eq!(requested_pages(&gateway), vec!["1", "2", "3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_more_without_next_page_issues_no_request() {
        let gateway = FakeGateway::new(10);
        let list = headlines(gateway.clone());

        list.fetch().await;
        assert_eq!(list.load_more().await, LoadMore::NoMorePages);
        assert_eq!(list.load_more().await, LoadMore::NoMorePages);
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_more_before_first_page_is_noop() {
        let gateway = FakeGateway::new(45);
        let list = headlines(gateway.clone());

        assert_eq!(list.load_more().await, LoadMore::NotLoaded);
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_load_more_fetches_once() {
        let gateway = FakeGateway::with_latency(100, Duration::from_millis(50));
        let list = headlines(gateway.clone());
        list.fetch().await;

        let (a, b) = tokio::join!(list.load_more(), list.load_more());
        let outcomes = [a, b];
        assert!(outcomes.contains(&LoadMore::Loaded { page: 2 }));
        assert!(outcomes.contains(&LoadMore::Busy));
        assert_eq!(requested_pages(&gateway), vec!["1", "2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_fetching_more_while_loading() {
        let gateway = FakeGateway::with_latency(100, Duration::from_millis(50));
        let list = headlines(gateway.clone());
        list.fetch().await;

        let pending = {
            let list = list.clone();
            tokio::spawn(async move { list.load_more().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let snapshot = list.snapshot();
        assert!(snapshot.is_fetching_more);
        assert!(!snapshot.is_refreshing);
        assert_eq!(snapshot.articles.len(), 20);

        assert_eq!(pending.await.unwrap(), LoadMore::Loaded { page: 2 });
        assert!(!list.snapshot().is_fetching_more);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_load_more_keeps_loaded_pages() {
        let gateway = FakeGateway::new(100);
        let list = headlines(gateway.clone());
        list.fetch().await;

        gateway.fail_next(server_error("/top-headlines"));
        let outcome = list.load_more().await;
        assert!(matches!(outcome, LoadMore::Failed(ref e) if e.status() == Some(500)));

        let snapshot = list.snapshot();
        assert_eq!(snapshot.articles.len(), 20);
        assert_eq!(snapshot.status, QueryStatus::Error);
        assert!(snapshot.has_more);

        // Retrying asks for the same page again, so no gap appears.
        assert_eq!(list.load_more().await, LoadMore::Loaded { page: 2 });
        assert_eq!(requested_pages(&gateway), vec!["1", "2", "2"]);
        assert_eq!(list.snapshot().status, QueryStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_resets_to_first_page() {
        let gateway = FakeGateway::new(100);
        let list = headlines(gateway.clone());
        list.fetch().await;
        list.load_more().await;
        assert_eq!(list.snapshot().page_count, 2);

        let snapshot = list.refresh().await;
        assert_eq!(snapshot.page_count, 1);
        assert_eq!(snapshot.articles.len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_articles() {
        let gateway = FakeGateway::new(100);
        let list = headlines(gateway.clone());
        list.fetch().await;
        list.load_more().await;

        gateway.fail_next(server_error("/top-headlines"));
        let snapshot = list.refresh().await;

        assert_eq!(snapshot.status, QueryStatus::Error);
        assert!(snapshot.error.is_some());
        assert_eq!(snapshot.articles.len(), 40);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_refetch_keeps_loaded_page_count() {
        let gateway = FakeGateway::new(100);
        let list = headlines(gateway.clone());
        list.fetch().await;
        list.load_more().await;

        tokio::time::sleep(QueryOptions::default().stale_time).await;
        let snapshot = list.fetch().await;
        assert!(snapshot.is_refreshing);
        assert_eq!(snapshot.articles.len(), 40);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(list.snapshot().page_count, 2);
        assert_eq!(requested_pages(&gateway), vec!["1", "2", "1", "2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_result_is_success_not_error() {
        let gateway = FakeGateway::new(0);
        let list = InfiniteQuery::new(
            QueryCache::new(),
            Arc::new(ArticleRepository::new(gateway)),
            ListQuery::Search(SearchFilters::query("zzzz")),
            QueryOptions::default(),
        );

        let snapshot = list.fetch().await;
        assert_eq!(snapshot.status, QueryStatus::Success);
        assert!(snapshot.error.is_none());
        assert!(snapshot.articles.is_empty());
        assert!(!snapshot.has_more);
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_is_page_independent() {
        let gateway = FakeGateway::new(10);
        let list = headlines(gateway);
        let page3 = ListQuery::TopHeadlines(TopHeadlinesQuery::default()).with_page(3);
        assert_eq!(list.key(), &page3.prefix());
        assert_eq!(list.key().page(), None);
    }
}
