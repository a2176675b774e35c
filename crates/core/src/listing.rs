//! List response envelopes.
//!
//! List endpoints answer either with a page-number envelope
//! (`{ "count", "next", "previous", "results": [...] }`) or with a bare JSON
//! array, depending on whether pagination is enabled for the view.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paged {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
    },
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    /// Items on this page, regardless of envelope shape.
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Paged { results, .. } => results,
            Self::Plain(items) => items,
        }
    }

    /// Total number of items across all pages, when the server reports it.
    pub fn total(&self) -> Option<u64> {
        match self {
            Self::Paged { count, .. } => *count,
            Self::Plain(items) => Some(items.len() as u64),
        }
    }

    pub fn has_next(&self) -> bool {
        matches!(self, Self::Paged { next: Some(_), .. })
    }
}
