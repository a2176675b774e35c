//! Article create/update payloads.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{DomainError, DomainResult};
use crate::models::Article;

/// Body sent to `POST /articles/` and `PATCH /articles/{id}/`.
///
/// Tags travel as plain names under `tags_input`; the server creates missing
/// tags on the fly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    #[serde(rename = "tags_input")]
    pub tags: Vec<String>,
}

impl ArticleDraft {
    /// Build a draft from raw form input.
    ///
    /// Title and content are trimmed and must be non-empty.
    pub fn new<I, S>(title: &str, content: &str, tags: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let title = title.trim();
        let content = content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(DomainError::validation("Title and content are required."));
        }

        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
            tags: normalize_tags(tags),
        })
    }

    /// Build a draft from a comma separated tag field (`"rust, web"`).
    pub fn from_form(title: &str, content: &str, tags: &str) -> DomainResult<Self> {
        Self::new(title, content, tags.split(','))
    }

    /// Prefill a draft for editing an existing article.
    pub fn from_article(article: &Article) -> Self {
        Self {
            title: article.title.clone(),
            content: article.content.clone(),
            tags: normalize_tags(article.tags.iter().map(|t| t.name.as_str())),
        }
    }
}

/// Trim tag names, drop empty ones, and de-duplicate case-insensitively while
/// keeping the first spelling seen.
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for tag in raw {
        let name = tag.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_lowercase()) {
            out.push(name.to_string());
        }
    }

    out
}
