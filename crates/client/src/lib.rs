//! `quire-client`
//!
//! **Responsibility:** talk to the blog API on behalf of one user.
//!
//! This crate provides:
//! - Durable token storage (`TokenStore`)
//! - An HTTP client that attaches bearer tokens and silently refreshes an
//!   expired access token once per request (`ApiClient`)
//! - The session lifecycle: bootstrap, login, logout, readiness
//!   (`SessionManager`)
//! - Thin typed adapters for articles, comments and the profile
//!
//! The API remains the authority for every decision; this crate only keeps
//! credential state consistent with what the API last said.

pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod resources;
pub mod session;
pub mod token_store;

pub use config::{ClientConfig, IdentitySource};
pub use error::ClientError;
pub use http::{ApiClient, ApiRequest};
pub use identity::{ClaimsResolver, IdentityResolver, ProfileResolver};
pub use session::SessionManager;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenPair, TokenStore};
