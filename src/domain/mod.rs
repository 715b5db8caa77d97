pub mod article;
pub mod page;
pub mod query;

pub use article::{Article, ArticleSource};
pub use page::ResultPage;
pub use query::{
    Endpoint, ListQuery, QueryKey, QueryParams, SearchFilters, SortBy, TopHeadlinesQuery,
    DEFAULT_COUNTRY, DEFAULT_PAGE_SIZE,
};
