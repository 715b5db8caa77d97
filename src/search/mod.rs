//! Debounced search over `/everything`.
//!
//! Keystrokes update the input immediately; the search term only changes
//! once typing pauses. An empty term searches the configured default term
//! instead, so the results list is never blank.

pub mod debounce;

use std::sync::{Arc, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::SearchConfig;
use crate::domain::{SearchFilters, SortBy};
use crate::pagination::InfiniteQuery;
use crate::service::NewsService;

pub use debounce::Debouncer;

pub struct SearchController {
    service: Arc<NewsService>,
    input: Debouncer<String>,
    sort: watch::Sender<SortBy>,
    base: SearchFilters,
    default_term: String,
}

impl SearchController {
    pub fn new(service: Arc<NewsService>, config: &SearchConfig) -> Self {
        let base = SearchFilters {
            language: config.language.clone(),
            page_size: config.page_size,
            ..SearchFilters::default()
        };
        let (sort, _) = watch::channel(config.sort_by);
        Self {
            service,
            input: Debouncer::new(String::new(), config.debounce()),
            sort,
            base,
            default_term: config.default_term.clone(),
        }
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.input.set(text.into());
    }

    /// The text as typed, before debouncing.
    pub fn input(&self) -> String {
        self.input.value()
    }

    /// Searches the current input without waiting for the debounce delay.
    pub fn submit(&self) {
        self.input.flush();
    }

    /// The term actually searched: the settled input, or the default term
    /// when the input is blank.
    pub fn term(&self) -> String {
        let settled = self.input.settled();
        let settled = settled.trim();
        if settled.is_empty() {
            self.default_term.clone()
        } else {
            settled.to_string()
        }
    }

    /// Whether results are for something the user typed.
    pub fn has_user_term(&self) -> bool {
        !self.input.settled().trim().is_empty()
    }

    pub fn sort(&self) -> SortBy {
        *self.sort.borrow()
    }

    pub fn set_sort(&self, sort: SortBy) {
        self.sort.send_if_modified(|current| {
            let changed = *current != sort;
            *current = sort;
            changed
        });
    }

    pub fn cycle_sort(&self) -> SortBy {
        let next = self.sort().next();
        self.set_sort(next);
        next
    }

    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            q: Some(self.term()),
            sort_by: self.sort(),
            ..self.base.clone()
        }
    }

    pub fn query(&self) -> InfiniteQuery {
        self.service.search_feed(&self.filters())
    }

    /// Fetches the current search, then again whenever the settled term or
    /// the sort mode changes. The task ends when the controller is dropped.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let mut terms = self.input.subscribe();
        let mut sorts = self.sort.subscribe();
        let controller: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                let Some(this) = controller.upgrade() else {
                    break;
                };
                let query = this.query();
                debug!("Searching {}", query.key());
                drop(this);
                tokio::spawn(async move {
                    query.fetch().await;
                });

                tokio::select! {
                    changed = terms.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    changed = sorts.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::gateway::fake::FakeGateway;
    use crate::repository::ArticleRepository;
    use crate::service::CachePolicy;

    fn controller(gateway: Arc<FakeGateway>) -> Arc<SearchController> {
        let service = NewsService::new(
            Arc::new(ArticleRepository::new(gateway)),
            CachePolicy::default(),
        );
        Arc::new(SearchController::new(
            Arc::new(service),
            &SearchConfig::default(),
        ))
    }

    fn searched(gateway: &FakeGateway) -> Vec<(String, String)> {
        gateway
            .requests()
            .iter()
            .map(|r| {
                (
                    r.params.get("q").unwrap_or_default().to_string(),
                    r.params.get("sortBy").unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_issues_one_search() {
        let gateway = FakeGateway::new(45);
        let search = controller(gateway.clone());
        let _task = search.spawn();

        for text in ["a", "ab", "abc"] {
            search.set_input(text);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        let terms: Vec<String> = searched(&gateway).into_iter().map(|(q, _)| q).collect();
        assert_eq!(terms, vec!["news", "abc"]);
        assert_eq!(search.term(), "abc");
        assert_eq!(search.query().snapshot().articles.len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_input_searches_default_term() {
        let gateway = FakeGateway::new(5);
        let search = controller(gateway.clone());

        search.set_input("   ");
        search.submit();

        assert!(!search.has_user_term());
        assert_eq!(search.term(), "news");
        assert_eq!(search.filters().q.as_deref(), Some("news"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_input_reuses_cached_default_results() {
        let gateway = FakeGateway::new(5);
        let search = controller(gateway.clone());
        let _task = search.spawn();
        tokio::time::sleep(Duration::from_millis(10)).await;

        search.set_input("rust");
        search.submit();
        tokio::time::sleep(Duration::from_millis(10)).await;
        search.set_input("");
        search.submit();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let terms: Vec<String> = searched(&gateway).into_iter().map(|(q, _)| q).collect();
        assert_eq!(terms, vec!["news", "rust"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sort_change_searches_again() {
        let gateway = FakeGateway::new(5);
        let search = controller(gateway.clone());
        let _task = search.spawn();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(search.cycle_sort(), SortBy::Relevancy);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(
            searched(&gateway),
            vec![
                ("news".to_string(), "publishedAt".to_string()),
                ("news".to_string(), "relevancy".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_ends_with_controller() {
        let gateway = FakeGateway::new(5);
        let search = controller(gateway);
        let task = search.spawn();
        tokio::time::sleep(Duration::from_millis(10)).await;

        drop(search);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("search task should stop")
            .unwrap();
    }
}
