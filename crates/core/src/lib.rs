//! `quire-core`: data shapes shared by the Quire blog client.
//!
//! This crate contains **pure data** (no IO, no HTTP). Resource entities are
//! passed through to and from the API; only the fields the client itself
//! inspects are strongly typed.

pub mod draft;
pub mod error;
pub mod id;
pub mod listing;
pub mod models;
pub mod registration;

pub use draft::{ArticleDraft, normalize_tags};
pub use error::{DomainError, DomainResult};
pub use id::{ArticleId, CommentId, UserId};
pub use listing::Listing;
pub use models::{Article, Comment, Me, ProfileDetails, ProfileDetailsPatch, ProfilePatch, Tag};
pub use registration::{Credentials, RegistrationForm};
