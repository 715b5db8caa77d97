use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_COUNTRY: &str = "us";
pub const DEFAULT_PAGE_SIZE: u32 = 20;

const PAGE_PARAM: &str = "page";
/// Key-only parameter separating related lists from the plain headlines list.
const RELATED_PARAM: &str = "relatedTo";

/// Query-string parameters, kept sorted so equal filters produce equal keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl ToString) -> &mut Self {
        self.0.insert(name.to_string(), value.to_string());
        self
    }

    /// Inserts only when a value is present; absent filters are never sent.
    pub fn insert_opt<V: ToString>(&mut self, name: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.insert(name, value);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}", pairs.join("&"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    TopHeadlines,
    Everything,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::TopHeadlines => "/top-headlines",
            Endpoint::Everything => "/everything",
        }
    }
}

/// Cache identity of a request: endpoint plus normalized parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub endpoint: Endpoint,
    pub params: QueryParams,
}

impl QueryKey {
    pub fn new(endpoint: Endpoint, params: QueryParams) -> Self {
        Self { endpoint, params }
    }

    pub fn page(&self) -> Option<u32> {
        self.params.get(PAGE_PARAM).and_then(|p| p.parse().ok())
    }

    /// The key without its page number, identifying a logical infinite list.
    pub fn prefix(&self) -> QueryKey {
        let mut params = self.params.clone();
        params.remove(PAGE_PARAM);
        QueryKey::new(self.endpoint, params)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?{}", self.endpoint.path(), self.params)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortBy {
    #[serde(rename = "relevancy")]
    Relevancy,
    #[serde(rename = "popularity")]
    Popularity,
    #[default]
    #[serde(rename = "publishedAt")]
    PublishedAt,
}

impl SortBy {
    pub const ALL: [SortBy; 3] = [SortBy::PublishedAt, SortBy::Relevancy, SortBy::Popularity];

    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Relevancy => "relevancy",
            SortBy::Popularity => "popularity",
            SortBy::PublishedAt => "publishedAt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortBy::Relevancy => "Relevance",
            SortBy::Popularity => "Popularity",
            SortBy::PublishedAt => "Most recent",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SortBy::PublishedAt => SortBy::Relevancy,
            SortBy::Relevancy => SortBy::Popularity,
            SortBy::Popularity => SortBy::PublishedAt,
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevancy" => Ok(SortBy::Relevancy),
            "popularity" => Ok(SortBy::Popularity),
            "publishedAt" | "published-at" | "published_at" => Ok(SortBy::PublishedAt),
            other => Err(format!(
                "Invalid sort mode: {other}. Use relevancy, popularity or publishedAt"
            )),
        }
    }
}

/// Filters for `/top-headlines`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopHeadlinesQuery {
    pub country: String,
    pub category: Option<String>,
    pub page_size: u32,
    pub page: u32,
}

impl Default for TopHeadlinesQuery {
    fn default() -> Self {
        Self {
            country: DEFAULT_COUNTRY.to_string(),
            category: None,
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

impl TopHeadlinesQuery {
    pub fn new(country: impl Into<String>, page_size: u32, page: u32) -> Self {
        Self {
            country: country.into(),
            category: None,
            page_size,
            page,
        }
    }

    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params
            .insert("country", &self.country)
            .insert_opt("category", self.category.as_ref())
            .insert("pageSize", self.page_size)
            .insert(PAGE_PARAM, self.page);
        params
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::new(Endpoint::TopHeadlines, self.to_params())
    }
}

/// Filters for `/everything`. Unset optional fields are left out of the
/// request entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilters {
    pub q: Option<String>,
    pub sources: Option<String>,
    pub domains: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub language: Option<String>,
    pub sort_by: SortBy,
    pub page_size: u32,
    pub page: u32,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            q: None,
            sources: None,
            domains: None,
            from: None,
            to: None,
            language: None,
            sort_by: SortBy::default(),
            page_size: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

impl SearchFilters {
    pub fn query(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }

    pub fn to_params(&self) -> QueryParams {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

        let mut params = QueryParams::new();
        params
            .insert_opt("q", non_empty(&self.q))
            .insert_opt("sources", non_empty(&self.sources))
            .insert_opt("domains", non_empty(&self.domains))
            .insert_opt("from", self.from.map(|d| d.format("%Y-%m-%d")))
            .insert_opt("to", self.to.map(|d| d.format("%Y-%m-%d")))
            .insert_opt("language", non_empty(&self.language))
            .insert("sortBy", self.sort_by)
            .insert("pageSize", self.page_size)
            .insert(PAGE_PARAM, self.page);
        params
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::new(Endpoint::Everything, self.to_params())
    }
}

/// A request that can be paged through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListQuery {
    TopHeadlines(TopHeadlinesQuery),
    Search(SearchFilters),
    /// Headlines shown next to an article, cached per source name. The
    /// request itself is a plain `/top-headlines` read.
    Related {
        source: String,
        headlines: TopHeadlinesQuery,
    },
}

impl ListQuery {
    pub fn page_size(&self) -> u32 {
        match self {
            ListQuery::TopHeadlines(q) => q.page_size,
            ListQuery::Search(f) => f.page_size,
            ListQuery::Related { headlines, .. } => headlines.page_size,
        }
    }

    pub fn with_page(&self, page: u32) -> ListQuery {
        match self {
            ListQuery::TopHeadlines(q) => ListQuery::TopHeadlines(TopHeadlinesQuery {
                page,
                ..q.clone()
            }),
            ListQuery::Search(f) => ListQuery::Search(SearchFilters {
                page,
                ..f.clone()
            }),
            ListQuery::Related { source, headlines } => ListQuery::Related {
                source: source.clone(),
                headlines: TopHeadlinesQuery {
                    page,
                    ..headlines.clone()
                },
            },
        }
    }

    pub fn key(&self) -> QueryKey {
        match self {
            ListQuery::TopHeadlines(q) => q.key(),
            ListQuery::Search(f) => f.key(),
            ListQuery::Related { source, headlines } => {
                let mut key = headlines.key();
                key.params.insert(RELATED_PARAM, source);
                key
            }
        }
    }

    pub fn prefix(&self) -> QueryKey {
        self.key().prefix()
    }
}
