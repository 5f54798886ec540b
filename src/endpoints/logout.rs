use super::EndpointError;
use crate::client::{Body, HttpClient};
use reqwest::Method;

/// Tell the server to invalidate the current session token.
pub async fn logout(client: &HttpClient) -> Result<(), EndpointError> {
    client
        .send_authenticated(Method::POST, "auth/logout/", Body::Empty)
        .await?;

    Ok(())
}
