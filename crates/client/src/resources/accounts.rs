//! Credential endpoints. Always sent bare: a rejected password must never
//! trigger a token refresh.

use serde_json::json;

use quire_core::Credentials;

use crate::error::ClientError;
use crate::http::{ApiClient, ApiRequest};
use crate::token_store::TokenPair;

pub const TOKEN_PATH: &str = "/token/";
pub const REGISTER_PATH: &str = "/register/";

/// `POST /token/`: exchange credentials for a token pair.
pub async fn obtain_token_pair(
    client: &ApiClient,
    credentials: &Credentials,
) -> Result<TokenPair, ClientError> {
    let req = ApiRequest::post(TOKEN_PATH).json(credentials)?.bare();
    client.execute_json(req).await
}

/// `POST /register/`: create an account. The response body is ignored.
pub async fn register(client: &ApiClient, credentials: &Credentials) -> Result<(), ClientError> {
    let req = ApiRequest::post(REGISTER_PATH)
        .json(&json!({
            "username": credentials.username,
            "password": credentials.password,
        }))?
        .bare();
    client.execute(req).await.map(|_| ())
}
