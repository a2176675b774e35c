use quire_core::{Me, ProfilePatch};

use crate::error::ClientError;
use crate::http::ApiClient;

pub const ME_PATH: &str = "/me/";

pub async fn fetch_me(client: &ApiClient) -> Result<Me, ClientError> {
    client.get(ME_PATH).await
}

pub async fn update_me(client: &ApiClient, patch: &ProfilePatch) -> Result<Me, ClientError> {
    client.patch(ME_PATH, patch).await
}
