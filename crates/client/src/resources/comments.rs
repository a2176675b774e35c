use serde_json::json;

use quire_core::{ArticleId, Comment, CommentId, Listing};

use crate::error::ClientError;
use crate::http::ApiClient;

fn thread_path(article_id: ArticleId) -> String {
    format!("/articles/{article_id}/comments/")
}

fn comment_path(comment_id: CommentId) -> String {
    format!("/comments/{comment_id}/")
}

pub async fn list(client: &ApiClient, article_id: ArticleId) -> Result<Vec<Comment>, ClientError> {
    let listing: Listing<Comment> = client.get(&thread_path(article_id)).await?;
    Ok(listing.into_items())
}

pub async fn create(
    client: &ApiClient,
    article_id: ArticleId,
    content: &str,
) -> Result<Comment, ClientError> {
    client
        .post(&thread_path(article_id), &json!({ "content": content }))
        .await
}

pub async fn update(
    client: &ApiClient,
    comment_id: CommentId,
    content: &str,
) -> Result<Comment, ClientError> {
    client
        .patch(&comment_path(comment_id), &json!({ "content": content }))
        .await
}

pub async fn delete(client: &ApiClient, comment_id: CommentId) -> Result<(), ClientError> {
    client.delete(&comment_path(comment_id)).await
}
