use std::sync::Arc;

use crate::app::FetchError;
use crate::domain::{
    Endpoint, ListQuery, ResultPage, SearchFilters, TopHeadlinesQuery, DEFAULT_COUNTRY,
};
use crate::gateway::Gateway;

/// Typed access to the two read endpoints.
pub struct ArticleRepository {
    gateway: Arc<dyn Gateway>,
}

impl ArticleRepository {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    pub async fn get_top_headlines(&self, query: &TopHeadlinesQuery) -> Result<ResultPage, FetchError> {
        self.gateway
            .get(Endpoint::TopHeadlines.path(), &query.to_params())
            .await
    }

    pub async fn get_news_by_category(&self, category: &str, page_size: u32) -> Result<ResultPage, FetchError> {
        let query = TopHeadlinesQuery {
            category: Some(category.to_string()),
            ..TopHeadlinesQuery::new(DEFAULT_COUNTRY, page_size, 1)
        };
        self.get_top_headlines(&query).await
    }

    pub async fn search_news(&self, filters: &SearchFilters) -> Result<ResultPage, FetchError> {
        self.gateway
            .get(Endpoint::Everything.path(), &filters.to_params())
            .await
    }

    pub async fn fetch_page(&self, query: &ListQuery) -> Result<ResultPage, FetchError> {
        match query {
            ListQuery::TopHeadlines(q) => self.get_top_headlines(q).await,
            ListQuery::Search(f) => self.search_news(f).await,
            ListQuery::Related { headlines, .. } => self.get_top_headlines(headlines).await,
        }
    }
}
