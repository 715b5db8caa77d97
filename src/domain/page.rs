use serde::{Deserialize, Serialize};

use super::Article;

/// One response page from either endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
    pub status: String,
    pub total_results: u32,
    #[serde(default)]
    pub articles: Vec<Article>,
}

impl ResultPage {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}
