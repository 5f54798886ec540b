use super::EndpointError;
use crate::{
    client::{Body, HttpClient},
    Credentials, Registration, User,
};
use reqwest::Method;
use serde_derive::{Deserialize, Serialize};

/// Authenticate with the server and get a new session token.
pub async fn login(
    client: &HttpClient,
    credentials: &Credentials,
) -> Result<AuthResponse, EndpointError> {
    log::trace!("Payload: {:#?}", credentials);

    let response: AuthResponse = client
        .send_json(Method::POST, "auth/login/", Body::json(credentials)?)
        .await?;

    log::info!("Logged in as {}", response.user.email);

    Ok(response)
}

/// Create a new account, which also logs the user in.
pub async fn register(
    client: &HttpClient,
    registration: &Registration,
) -> Result<AuthResponse, EndpointError> {
    log::trace!("Payload: {:#?}", registration);

    let response: AuthResponse = client
        .send_json(Method::POST, "auth/register/", Body::json(registration)?)
        .await?;

    log::info!("Registered {}", response.user.email);

    Ok(response)
}

/// What the server sends back after a successful login or registration.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("token", &"********")
            .field("user", &self.user)
            .finish()
    }
}
