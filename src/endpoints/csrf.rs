use super::EndpointError;
use crate::client::{Body, HttpClient};
use reqwest::Method;

/// Ask the server to set a CSRF cookie, returning the token it gave us.
pub async fn prime_csrf(
    client: &HttpClient,
) -> Result<Option<String>, EndpointError> {
    client.send(Method::GET, "csrf/", Body::Empty).await?;

    let token = client.csrf_token();
    if token.is_none() {
        log::debug!("The server didn't set a CSRF cookie");
    }

    Ok(token)
}
