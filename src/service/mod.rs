//! Entry point for UI collaborators.
//!
//! Single-page reads go through one cache, infinite lists through another;
//! both are owned here and shared by every consumer of the service.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::cache::{CacheEntry, QueryCache, QueryOptions};
use crate::config::CacheConfig;
use crate::domain::{Article, ListQuery, ResultPage, SearchFilters, TopHeadlinesQuery};
use crate::pagination::{InfiniteQuery, PageSet};
use crate::repository::ArticleRepository;

/// Page size of the related-articles list in the detail view.
pub const RELATED_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub headlines: QueryOptions,
    pub search: QueryOptions,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        let gc_time = Duration::from_secs(config.gc_secs);
        Self {
            headlines: QueryOptions {
                stale_time: Duration::from_secs(config.headlines_stale_secs),
                gc_time,
            },
            search: QueryOptions {
                stale_time: Duration::from_secs(config.search_stale_secs),
                gc_time,
            },
        }
    }
}

pub struct NewsService {
    repository: Arc<ArticleRepository>,
    pages: QueryCache<ResultPage>,
    lists: QueryCache<PageSet>,
    policy: CachePolicy,
}

impl NewsService {
    pub fn new(repository: Arc<ArticleRepository>, policy: CachePolicy) -> Self {
        Self {
            repository,
            pages: QueryCache::new(),
            lists: QueryCache::new(),
            policy,
        }
    }

    pub fn repository(&self) -> &Arc<ArticleRepository> {
        &self.repository
    }

    fn options_for(&self, query: &ListQuery) -> QueryOptions {
        match query {
            ListQuery::TopHeadlines(_) | ListQuery::Related { .. } => self.policy.headlines,
            ListQuery::Search(_) => self.policy.search,
        }
    }

    /// One page of top headlines, served from cache when fresh.
    pub async fn fetch_top_headlines(
        &self,
        country: &str,
        page_size: u32,
        page: u32,
    ) -> CacheEntry<ResultPage> {
        let query = TopHeadlinesQuery::new(country, page_size, page);
        self.load_page(ListQuery::TopHeadlines(query), false).await
    }

    /// One page of search results, served from cache when fresh.
    pub async fn search_news(&self, filters: &SearchFilters) -> CacheEntry<ResultPage> {
        self.load_page(ListQuery::Search(filters.clone()), false)
            .await
    }

    pub async fn refresh_top_headlines(
        &self,
        country: &str,
        page_size: u32,
        page: u32,
    ) -> CacheEntry<ResultPage> {
        let query = TopHeadlinesQuery::new(country, page_size, page);
        self.load_page(ListQuery::TopHeadlines(query), true).await
    }

    pub async fn refresh_search(&self, filters: &SearchFilters) -> CacheEntry<ResultPage> {
        self.load_page(ListQuery::Search(filters.clone()), true)
            .await
    }

    /// One page of any list, served from cache when fresh.
    pub async fn fetch_page(&self, query: ListQuery) -> CacheEntry<ResultPage> {
        self.load_page(query, false).await
    }

    async fn load_page(&self, query: ListQuery, force: bool) -> CacheEntry<ResultPage> {
        let key = query.key();
        let options = self.options_for(&query);
        let repository = self.repository.clone();
        let fetcher = move |_: Option<ResultPage>| async move { repository.fetch_page(&query).await };

        if force {
            self.pages.refresh(&key, options, fetcher).await
        } else {
            self.pages.fetch(&key, options, fetcher).await
        }
    }

    pub fn list(&self, query: ListQuery) -> InfiniteQuery {
        let options = self.options_for(&query);
        InfiniteQuery::new(self.lists.clone(), self.repository.clone(), query, options)
    }

    pub fn top_headlines_feed(&self, country: &str, page_size: u32) -> InfiniteQuery {
        self.list(ListQuery::TopHeadlines(TopHeadlinesQuery::new(
            country, page_size, 1,
        )))
    }

    pub fn search_feed(&self, filters: &SearchFilters) -> InfiniteQuery {
        self.list(ListQuery::Search(filters.clone()))
    }

    /// More headlines to show under an article's detail view, one list per
    /// source name. The current article is filtered out by the view, not here.
    pub fn related_feed(&self, article: &Article, country: &str) -> InfiniteQuery {
        self.list(ListQuery::Related {
            source: article.source_name().to_string(),
            headlines: TopHeadlinesQuery::new(country, RELATED_PAGE_SIZE, 1),
        })
    }

    pub fn collect_garbage(&self) -> usize {
        self.pages.collect_garbage() + self.lists.collect_garbage()
    }

    pub fn spawn_gc(&self, every: Duration) -> (JoinHandle<()>, JoinHandle<()>) {
        (self.pages.spawn_gc(every), self.lists.spawn_gc(every))
    }
}
