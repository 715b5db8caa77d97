use chrono::{DateTime, Utc};
use html_escape::decode_html_entities;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: String,
}

/// A single article as returned by the news API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: ArticleSource,
    pub author: Option<String>,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    #[serde(rename = "urlToImage")]
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub content: Option<String>,
}

impl Article {
    pub fn source_id(&self) -> Option<&str> {
        self.source.id.as_deref()
    }

    pub fn source_name(&self) -> &str {
        &self.source.name
    }

    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            return "(Untitled)".to_string();
        }
        decode_html_entities(&self.title).to_string()
    }

    pub fn display_description(&self) -> Option<String> {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| decode_html_entities(d).to_string())
    }

    /// Article body without the API's `[+1234 chars]` truncation marker.
    pub fn display_content(&self) -> Option<String> {
        let content = self.content.as_deref()?;
        let body = strip_truncation_marker(content).trim_end();
        if body.is_empty() {
            return None;
        }
        Some(decode_html_entities(body).to_string())
    }

    /// Best available text for reading: content, then description.
    pub fn body_text(&self) -> String {
        self.display_content()
            .or_else(|| self.display_description())
            .unwrap_or_default()
    }
}

fn strip_truncation_marker(content: &str) -> &str {
    let Some(start) = content.rfind("[+") else {
        return content;
    };
    let marker = &content[start + 2..];
    let is_marker = marker
        .strip_suffix(" chars]")
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
    if is_marker {
        content[..start].trim_end_matches(['…', ' '])
    } else {
        content
    }
}
