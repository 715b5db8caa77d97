//! Presentation helpers shared by the CLI and the TUI.

pub mod article;
pub mod dates;

use crate::app::FetchError;
use crate::cache::QueryStatus;
use crate::pagination::InfiniteSnapshot;

pub use article::{
    has_full_content, reading_time, related_articles, share_message, ArticleMetadata,
    ShareContext, SharePayload,
};
pub use dates::{format_published, DatePolicy};

/// What a list screen should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    Loading,
    /// The request succeeded with zero results.
    Empty { message: String },
    Ready,
    /// The last request failed. `has_content` is set when earlier results
    /// are still shown underneath the error.
    Failed { message: String, has_content: bool },
}

impl ListState {
    /// `term` is the search term the user typed, if any; it only changes the
    /// wording of the empty state.
    pub fn classify(snapshot: &InfiniteSnapshot, term: Option<&str>) -> Self {
        match snapshot.status {
            QueryStatus::Error => ListState::Failed {
                message: error_message(snapshot.error.as_ref()),
                has_content: !snapshot.articles.is_empty(),
            },
            QueryStatus::Idle | QueryStatus::Loading => ListState::Loading,
            QueryStatus::Success if snapshot.articles.is_empty() => ListState::Empty {
                message: empty_text(term),
            },
            QueryStatus::Success => ListState::Ready,
        }
    }
}

pub fn error_message(error: Option<&FetchError>) -> String {
    match error {
        Some(FetchError::Http { status: 401, .. }) => {
            "The news API rejected the API key. Set NEWS_API_KEY or api.api_key.".to_string()
        }
        Some(FetchError::Http { status: 429, .. }) => {
            "Too many requests. Try again later.".to_string()
        }
        Some(e) => e.to_string(),
        None => "Something went wrong.".to_string(),
    }
}

/// Summary line above a result list. Empty while there is nothing to show.
pub fn header_text(snapshot: &InfiniteSnapshot, term: Option<&str>) -> String {
    if snapshot.articles.is_empty() {
        return String::new();
    }
    match user_term(term) {
        Some(term) => format!("{} results for \"{}\"", snapshot.total_results, term),
        None => format!("{} articles", snapshot.total_results),
    }
}

pub fn empty_text(term: Option<&str>) -> String {
    match user_term(term) {
        Some(term) => format!("No news found for \"{term}\".\nTry different search terms."),
        None => "No news available right now.".to_string(),
    }
}

fn user_term(term: Option<&str>) -> Option<&str> {
    term.map(str::trim).filter(|t| !t.is_empty())
}
