//! Outbound HTTP to the blog API.
//!
//! Every request goes through [`ApiClient::execute`], which:
//! - attaches `Authorization: Bearer <access>` when an access token is stored
//! - on the first 401 of a request, refreshes the access token once and
//!   re-issues the request with the new token
//!
//! Per-request flow:
//!
//! ```text
//! Issued ─┬─ 2xx ──────────────────────────────────────────> Success
//!         ├─ other failure ────────────────────────────────> Failure
//!         └─ 401, not yet retried ─> Refreshing ─┬─ ok ───> re-Issued (retried)
//!                                                └─ fail ─> tokens cleared, Failure
//! ```
//!
//! A 401 on the retried request also clears the tokens: the server has
//! rejected credentials it just issued.
//!
//! The retry guard lives on the [`ApiRequest`] itself, so no request can
//! enter the refresh step twice.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::token_store::TokenStore;

pub const REFRESH_PATH: &str = "/token/refresh/";

/// A single logical API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    id: Uuid,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    retried: bool,
    bare: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
            bare: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body).map_err(|e| ClientError::Encode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Send without credentials and without refresh-and-retry.
    ///
    /// Used for the credential endpoints themselves.
    pub fn bare(mut self) -> Self {
        self.bare = true;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub fn is_bare(&self) -> bool {
        self.bare
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
}

enum RefreshOutcome {
    Refreshed,
    NoRefreshToken,
    Failed(ClientError),
}

/// HTTP client bound to one API root and one token store.
///
/// Cheap to clone; clones share the connection pool and the token store.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    tokens: Arc<dyn TokenStore>,
}

impl core::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_http(http, &config.base_url, tokens))
    }

    pub fn with_http(http: reqwest::Client, base_url: &str, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// One raw round trip: no status handling, no retry.
    async fn send(&self, req: &ApiRequest) -> Result<reqwest::Response, ClientError> {
        let mut builder = self.http.request(req.method.clone(), self.url(&req.path));

        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }
        if !req.bare {
            if let Some(access) = self.tokens.access() {
                builder = builder.bearer_auth(access);
            }
        }

        builder.send().await.map_err(ClientError::from_reqwest)
    }

    /// Issue `req`, recovering once from an expired access token.
    ///
    /// Returns the successful response; any non-2xx status becomes an error.
    pub async fn execute(&self, req: ApiRequest) -> Result<reqwest::Response, ClientError> {
        let span = tracing::debug_span!(
            "api_request",
            request_id = %req.id,
            method = %req.method,
            path = %req.path,
        );
        self.execute_with_recovery(req).instrument(span).await
    }

    async fn execute_with_recovery(
        &self,
        mut req: ApiRequest,
    ) -> Result<reqwest::Response, ClientError> {
        loop {
            let resp = self.send(&req).await?;
            let status = resp.status();
            tracing::debug!(status = status.as_u16(), retried = req.retried, "response");

            if status.is_success() {
                return Ok(resp);
            }
            if status != StatusCode::UNAUTHORIZED || req.bare {
                return Err(ClientError::from_response(resp).await);
            }
            if req.retried {
                tracing::warn!("401 with a freshly refreshed token, clearing credentials");
                self.tokens.clear();
                return Err(ClientError::from_response(resp).await);
            }

            req.retried = true;
            let original = ClientError::from_response(resp).await;

            match self.try_refresh().await {
                RefreshOutcome::Refreshed => {
                    tracing::debug!("access token refreshed; retrying once");
                }
                RefreshOutcome::NoRefreshToken => {
                    tracing::debug!("401 without a refresh token; giving up");
                    return Err(original);
                }
                RefreshOutcome::Failed(err) => {
                    tracing::warn!("token refresh failed, clearing credentials: {err}");
                    self.tokens.clear();
                    return Err(original);
                }
            }
        }
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// On failure the stored credentials are cleared. Calling this without a
    /// refresh token is an authorization error and leaves the store untouched.
    pub async fn refresh_access(&self) -> Result<(), ClientError> {
        match self.try_refresh().await {
            RefreshOutcome::Refreshed => Ok(()),
            RefreshOutcome::NoRefreshToken => Err(ClientError::Unauthorized {
                message: Some("no refresh token".to_string()),
            }),
            RefreshOutcome::Failed(err) => {
                tracing::warn!("token refresh failed, clearing credentials: {err}");
                self.tokens.clear();
                Err(err)
            }
        }
    }

    async fn try_refresh(&self) -> RefreshOutcome {
        let Some(refresh) = self.tokens.refresh() else {
            return RefreshOutcome::NoRefreshToken;
        };

        let req = match ApiRequest::post(REFRESH_PATH)
            .json(&serde_json::json!({ "refresh": refresh }))
        {
            Ok(req) => req.bare(),
            Err(err) => return RefreshOutcome::Failed(err),
        };

        let resp = match self.send(&req).await {
            Ok(resp) => resp,
            Err(err) => return RefreshOutcome::Failed(err),
        };
        if !resp.status().is_success() {
            return RefreshOutcome::Failed(ClientError::from_response(resp).await);
        }

        match resp.json::<RefreshResponse>().await {
            Ok(body) => {
                self.tokens.set(body.access, refresh);
                tracing::info!("access token refreshed");
                RefreshOutcome::Refreshed
            }
            Err(err) => RefreshOutcome::Failed(ClientError::Decode(err.to_string())),
        }
    }

    /// Execute and decode a JSON body.
    pub async fn execute_json<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<T, ClientError> {
        let resp = self.execute(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute_json(ApiRequest::get(path)).await
    }

    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let req = query
            .iter()
            .fold(ApiRequest::get(path), |req, (k, v)| req.query(*k, v.clone()));
        self.execute_json(req).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute_json(ApiRequest::post(path).json(body)?).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute_json(ApiRequest::patch(path).json(body)?).await
    }

    /// DELETE, discarding any response body.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.execute(ApiRequest::delete(path)).await.map(|_| ())
    }
}
