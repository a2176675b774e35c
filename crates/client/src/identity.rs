//! Strategies for turning stored credentials into a session.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use quire_auth::{Session, TokenValidationError, decode_unverified, validate_claims};

use crate::config::IdentitySource;
use crate::error::ClientError;
use crate::http::ApiClient;
use crate::resources::profile;

/// Resolves "who am I" for the credentials currently in the token store.
///
/// Implementations may go through the client's silent-refresh path; any
/// error means the credentials could not be turned into a session.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, client: &ApiClient) -> Result<Session, ClientError>;
}

/// Ask the API: `GET /me/`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileResolver;

#[async_trait]
impl IdentityResolver for ProfileResolver {
    async fn resolve(&self, client: &ApiClient) -> Result<Session, ClientError> {
        let me = profile::fetch_me(client).await?;
        Ok(Session::from(me))
    }
}

/// Read identity straight out of the access token's claims.
///
/// A missing or expired access token is refreshed first; the rest of the
/// decision is local.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsResolver;

impl ClaimsResolver {
    fn decode(access: &str) -> Result<quire_auth::AccessClaims, ClientError> {
        decode_unverified(access).map_err(|e| ClientError::Unauthorized {
            message: Some(e.to_string()),
        })
    }
}

#[async_trait]
impl IdentityResolver for ClaimsResolver {
    async fn resolve(&self, client: &ApiClient) -> Result<Session, ClientError> {
        let store = client.token_store();

        let access = match store.access() {
            Some(access) => access,
            None => {
                client.refresh_access().await?;
                store.access().ok_or(ClientError::Unauthorized { message: None })?
            }
        };

        let mut claims = Self::decode(&access)?;
        match validate_claims(&claims, Utc::now()) {
            Ok(()) => {}
            Err(TokenValidationError::Expired) => {
                tracing::debug!("access token expired; refreshing before decoding claims");
                client.refresh_access().await?;
                let access = store.access().ok_or(ClientError::Unauthorized { message: None })?;
                claims = Self::decode(&access)?;
                validate_claims(&claims, Utc::now()).map_err(|e| ClientError::Unauthorized {
                    message: Some(e.to_string()),
                })?;
            }
            Err(e) => {
                return Err(ClientError::Unauthorized {
                    message: Some(e.to_string()),
                });
            }
        }

        Ok(Session::authenticated(claims.into_identity()))
    }
}

pub fn resolver_for(source: IdentitySource) -> Arc<dyn IdentityResolver> {
    match source {
        IdentitySource::Profile => Arc::new(ProfileResolver),
        IdentitySource::Claims => Arc::new(ClaimsResolver),
    }
}
