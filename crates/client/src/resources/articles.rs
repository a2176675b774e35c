use quire_core::{Article, ArticleDraft, ArticleId, Listing};

use crate::error::ClientError;
use crate::http::{ApiClient, ApiRequest};

/// Filters for `GET /articles/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuery {
    pub tag: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
}

impl ArticleQuery {
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Default::default()
        }
    }

    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(tag) = self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            params.push(("tags__name", tag.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        params
    }
}

fn detail_path(id: ArticleId) -> String {
    format!("/articles/{id}/")
}

pub async fn list(client: &ApiClient, query: &ArticleQuery) -> Result<Listing<Article>, ClientError> {
    let req = query
        .params()
        .into_iter()
        .fold(ApiRequest::get("/articles/"), |req, (k, v)| req.query(k, v));
    client.execute_json(req).await
}

/// The three most recently published articles.
pub async fn latest(client: &ApiClient) -> Result<Vec<Article>, ClientError> {
    let listing: Listing<Article> = client.get("/articles/latest/").await?;
    Ok(listing.into_items())
}

pub async fn get(client: &ApiClient, id: ArticleId) -> Result<Article, ClientError> {
    client.get(&detail_path(id)).await
}

pub async fn create(client: &ApiClient, draft: &ArticleDraft) -> Result<Article, ClientError> {
    client.post("/articles/", draft).await
}

pub async fn update(
    client: &ApiClient,
    id: ArticleId,
    draft: &ArticleDraft,
) -> Result<Article, ClientError> {
    client.patch(&detail_path(id), draft).await
}

pub async fn delete(client: &ApiClient, id: ArticleId) -> Result<(), ClientError> {
    client.delete(&detail_path(id)).await
}
