//! Typed adapters over the API's REST endpoints.
//!
//! These map parameters to paths and decode responses; all credential
//! handling happens in [`ApiClient`](crate::ApiClient).

pub mod accounts;
pub mod articles;
pub mod comments;
pub mod profile;

pub use articles::ArticleQuery;
