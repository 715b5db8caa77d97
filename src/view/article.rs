use chrono::{DateTime, Utc};

use crate::domain::Article;

use super::dates::{format_published, DatePolicy};

const WORDS_PER_MINUTE: usize = 200;
const FULL_CONTENT_CHARS: usize = 100;

/// Where an article is shared from; each place words the message differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareContext {
    Feed,
    Search,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub message: String,
}

pub fn share_message(article: &Article, context: ShareContext) -> SharePayload {
    let title = article.display_title();
    match context {
        ShareContext::Feed => SharePayload {
            message: format!("Top story:\n\n{}\n\n{}", title, article.url),
            title,
        },
        ShareContext::Search => SharePayload {
            message: format!(
                "Found in search results:\n\n{}\n\nSource: {}\n\n{}",
                title,
                article.source_name(),
                article.url
            ),
            title: format!("Search: {title}"),
        },
        ShareContext::Detail => SharePayload {
            message: format!("{}\n\n{}", title, article.url),
            title,
        },
    }
}

/// Minutes to read the article body at 200 words per minute, never less
/// than one.
pub fn reading_minutes(article: &Article) -> usize {
    let words = article.body_text().split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

pub fn reading_time(article: &Article) -> String {
    format!("{} min read", reading_minutes(article))
}

/// Whether the API sent more than a teaser of the body.
pub fn has_full_content(article: &Article) -> bool {
    article
        .display_content()
        .is_some_and(|c| c.chars().count() > FULL_CONTENT_CHARS)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleMetadata {
    pub published_at: String,
    pub source: String,
    pub author: String,
    pub reading_time: String,
}

impl ArticleMetadata {
    pub fn new(article: &Article, now: DateTime<Utc>) -> Self {
        Self {
            published_at: format_published(
                article.published_at,
                DatePolicy::AbsoluteWithTime,
                now,
            ),
            source: article.source_name().to_string(),
            author: article
                .author
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .unwrap_or("Unknown author")
                .to_string(),
            reading_time: reading_time(article),
        }
    }
}

/// Related articles for `current`'s detail view: the list without `current`
/// itself, matched by URL or by title.
pub fn related_articles<'a>(
    current: &'a Article,
    candidates: &'a [Article],
) -> impl Iterator<Item = &'a Article> + 'a {
    candidates
        .iter()
        .filter(move |a| a.url != current.url && a.title != current.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::article::tests::article;

    #[test]
    fn test_share_messages_per_context() {
        let a = article("https://news.test/a");

        let feed = share_message(&a, ShareContext::Feed);
        assert_eq!(feed.title, "Title for https://news.test/a");
        assert!(feed.message.starts_with("Top story:"));
        assert!(feed.message.ends_with("https://news.test/a"));

        let search = share_message(&a, ShareContext::Search);
        assert_eq!(search.title, "Search: Title for https://news.test/a");
        assert!(search.message.contains("Source: The Verge"));

        let detail = share_message(&a, ShareContext::Detail);
        assert_eq!(
            detail.message,
            "Title for https://news.test/a\n\nhttps://news.test/a"
        );
    }

    #[test]
    fn test_reading_time_rounds_up_with_minimum() {
        let mut a = article("https://news.test/a");
        a.content = None;
        a.description = None;
        assert_eq!(reading_minutes(&a), 1);

        a.content = Some(vec!["word"; 201].join(" "));
        assert_eq!(reading_minutes(&a), 2);
        assert_eq!(reading_time(&a), "2 min read");
    }

    #[test]
    fn test_full_content_ignores_truncation_marker() {
        let mut a = article("https://news.test/a");
        a.content = Some("Short teaser… [+4000 chars]".into());
        assert!(!has_full_content(&a));

        a.content = Some("x".repeat(150));
        assert!(has_full_content(&a));
    }

    #[test]
    fn test_metadata_author_fallback() {
        let mut a = article("https://news.test/a");
        a.author = Some("  ".into());
        let meta = ArticleMetadata::new(&a, Utc::now());
        assert_eq!(meta.author, "Unknown author");
        assert_eq!(meta.source, "The Verge");
    }

    #[test]
    fn test_related_excludes_current_article() {
        let current = article("https://news.test/1");
        let mut same_title = article("https://news.test/mirror");
        same_title.title = current.title.clone();
        let candidates = vec![
            article("https://news.test/0"),
            current.clone(),
            same_title,
            article("https://news.test/2"),
        ];

        let urls: Vec<&str> = related_articles(&current, &candidates)
            .map(|a| a.url.as_str())
            .collect();
        assert_eq!(urls, vec!["https://news.test/0", "https://news.test/2"]);
    }
}
